// file: src/exporter/markdown.rs
// description: deterministic markdown rendering of a research report with citations
// reference: https://commonmark.org

use crate::models::{Confidence, ResearchReport};
use std::fmt::Write;

/// Render the report as Markdown.
///
/// Pure: the output depends only on the report, so repeated calls are
/// byte-identical. Citation numbers `[n]` follow the order of `report.sources`.
pub fn render(report: &ResearchReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Research Report\n");
    let _ = writeln!(out, "**Question:** {}\n", report.question);
    let _ = writeln!(
        out,
        "**Generated:** {}  ",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "**Report ID:** {}\n", report.id);

    out.push_str("## Sub-queries\n\n");
    for (idx, query) in report.sub_queries.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", idx + 1, query);
    }
    out.push('\n');

    out.push_str("## Answer\n\n");
    let _ = writeln!(out, "{}\n", report.synthesis.narrative.trim());

    render_findings(&mut out, report);

    out.push_str("## Areas of Agreement\n\n");
    render_list(&mut out, &report.synthesis.agreements, "No clear consensus identified.");

    out.push_str("## Contradictions\n\n");
    if report.synthesis.contradictions.is_empty() {
        out.push_str("_No contradictions found._\n\n");
    } else {
        for contradiction in &report.synthesis.contradictions {
            let _ = write!(out, "- **{}**", contradiction.claim);
            if !contradiction.explanation.is_empty() {
                let _ = write!(out, ": {}", contradiction.explanation);
            }
            if !contradiction.sources.is_empty() {
                let cited: Vec<String> = contradiction
                    .sources
                    .iter()
                    .map(|url| match report.citation_for(url) {
                        Some(n) => format!("[{}]", n),
                        None => url.clone(),
                    })
                    .collect();
                let _ = write!(out, " (sources: {})", cited.join(", "));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    out.push_str("## Knowledge Gaps\n\n");
    render_list(&mut out, &report.synthesis.gaps, "No significant gaps identified.");

    render_sources(&mut out, report);

    out
}

fn render_findings(out: &mut String, report: &ResearchReport) {
    out.push_str("## Key Findings\n\n");

    if report.facts.is_empty() {
        out.push_str("_No facts were extracted from the fetched sources._\n\n");
        return;
    }

    for confidence in Confidence::ALL {
        let facts = report.facts_with_confidence(confidence);
        if facts.is_empty() {
            continue;
        }

        let _ = writeln!(out, "### {}\n", confidence.heading());
        for fact in facts {
            match report.citation_for(&fact.source_url) {
                Some(n) => {
                    let _ = writeln!(out, "- {} [{}]", fact.text, n);
                }
                None => {
                    let _ = writeln!(out, "- {}", fact.text);
                }
            }
            if let Some(caveat) = &fact.caveat {
                let _ = writeln!(out, "  - _Caveat:_ {}", caveat);
            }
        }
        out.push('\n');
    }
}

fn render_sources(out: &mut String, report: &ResearchReport) {
    out.push_str("## Sources\n\n");

    if report.sources.is_empty() {
        out.push_str("_No sources._\n");
        return;
    }

    for query in report.queries_with_sources() {
        let _ = writeln!(out, "### {}\n", query);
        for (idx, source) in report.sources.iter().enumerate() {
            if source.source_query == query {
                let _ = writeln!(out, "- [{}] [{}]({})", idx + 1, source.title, source.url);
            }
        }
        out.push('\n');
    }
}

fn render_list(out: &mut String, items: &[String], empty: &str) {
    if items.is_empty() {
        let _ = writeln!(out, "_{}_\n", empty);
        return;
    }
    for item in items {
        let _ = writeln!(out, "- {}", item);
    }
    out.push('\n');
}
