// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use research_assistant::utils::logging::{
    format_error, format_info, format_success, format_warning, init_logger,
};
use research_assistant::{
    Config, HealthReport, HealthStatus, JsonExporter, QueryDecomposer, ResearchError,
    ResearchOrchestrator, SearchChain, llm, render,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "research_assistant")]
#[command(version)]
#[command(about = "Answers research questions from web sources with an LLM and writes a cited Markdown report", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Hide the progress display
    #[arg(short, long, action = ArgAction::SetTrue)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full research pipeline and write a Markdown report
    Research {
        question: String,

        #[arg(long, value_name = "NUM")]
        max_results: Option<usize>,

        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Print the report instead of saving it
        #[arg(long)]
        no_save: bool,

        /// Also export the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the sub-queries a question would be split into
    Decompose { question: String },

    /// Run the search provider chain for a single query
    Search {
        query: String,

        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    /// Re-render a report previously exported as JSON
    Render { report: PathBuf },

    /// Check configuration, credentials and the report directory
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if !cli.color {
        colored::control::set_override(false);
    }

    let config = load_config(&cli)?;
    let _log_guard = init_logger(cli.color, cli.verbose, &config.logging);

    info!("Research Assistant v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Research {
            question,
            max_results,
            output,
            no_save,
            json,
        } => {
            let mut config = config;
            if let Some(max_results) = max_results {
                config.search.max_results_per_query = max_results;
            }
            if let Some(output) = output {
                config.output.report_dir = output;
            }
            config.output.export_json |= json;
            config.validate().context("Invalid configuration")?;

            cmd_research(config, &question, no_save, !cli.quiet, cli.color).await?;
        }
        Commands::Decompose { question } => {
            cmd_decompose(&config, &question).await?;
        }
        Commands::Search { query, limit } => {
            cmd_search(&config, &query, limit).await?;
        }
        Commands::Render { report } => {
            cmd_render(&report)?;
        }
        Commands::Doctor => {
            cmd_doctor(&config)?;
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")
    } else {
        eprintln!(
            "{}",
            format_warning(&format!(
                "Config file {} not found, using defaults and environment",
                cli.config.display()
            ))
        );
        Config::load(None).context("Failed to load configuration")
    }
}

async fn cmd_research(
    config: Config,
    question: &str,
    no_save: bool,
    show_progress: bool,
    colored: bool,
) -> Result<()> {
    let orchestrator = ResearchOrchestrator::new(config)
        .context("Failed to initialise research pipeline")?
        .with_progress(show_progress, colored);

    let cancel = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling research run");
            cancel.cancel();
        }
    });

    let result = if no_save {
        orchestrator.research(question).await.map(|outcome| (outcome, None))
    } else {
        orchestrator
            .run(question)
            .await
            .map(|(outcome, saved)| (outcome, Some(saved)))
    };

    let (outcome, saved) = match result {
        Ok(done) => done,
        Err(e @ (ResearchError::NoSources | ResearchError::ModelUnavailable(_))) => {
            eprintln!("{}", format_error(&e.to_string()));
            return Err(e.into());
        }
        Err(e) => return Err(anyhow::Error::new(e).context("Research run failed")),
    };

    let stats = &outcome.stats;
    println!();
    println!("{}", format_success("Research complete"));
    println!(
        "{}",
        format_info(&format!(
            "{} sub-queries, {} sources fetched ({} failed), {} facts in {:.1}s",
            stats.sub_queries,
            stats.sources_fetched,
            stats.fetch_failures,
            stats.facts_extracted,
            stats.duration_secs
        ))
    );

    match saved {
        Some(saved) => {
            println!("{} {}", "Report:".bold(), saved.markdown.display());
            if let Some(json) = saved.json {
                println!("{} {}", "JSON:".bold(), json.display());
            }
            if let Some(sources) = saved.sources {
                println!("{} {}", "Sources:".bold(), sources.display());
            }
        }
        None => {
            println!("\n{}", outcome.markdown);
        }
    }

    Ok(())
}

async fn cmd_decompose(config: &Config, question: &str) -> Result<()> {
    let client = llm::build_client(config).context("Failed to create LLM client")?;
    let decomposer = QueryDecomposer::new(client, &config.agent);

    let sub_queries = decomposer.decompose(question).await;

    println!("\n{} {}\n", "Question:".bold(), question);
    for (idx, query) in sub_queries.iter().enumerate() {
        println!("  {}. {}", idx + 1, query);
    }
    println!();

    Ok(())
}

async fn cmd_search(config: &Config, query: &str, limit: usize) -> Result<()> {
    let chain = SearchChain::from_config(&config.search).context("Failed to build search chain")?;
    info!("Searching with providers {:?}", chain.provider_names());

    let results = chain.search(query, limit.max(1)).await;

    if results.is_empty() {
        println!("\nNo results found for query: \"{}\"\n", query);
        return Ok(());
    }

    println!("\nSearch Results for: \"{}\"\n", query);
    println!("{}", "=".repeat(80));
    for (idx, result) in results.iter().enumerate() {
        print!("\n{}. {}", idx + 1, result.format_summary(300));
    }
    println!("{}", "=".repeat(80));

    Ok(())
}

fn cmd_render(path: &Path) -> Result<()> {
    let report = JsonExporter::load(path)
        .with_context(|| format!("Failed to load report from {}", path.display()))?;
    print!("{}", render(&report));
    Ok(())
}

fn cmd_doctor(config: &Config) -> Result<()> {
    let report = HealthReport::for_config(config);
    println!("{}", report.format());

    match report.overall_status {
        HealthStatus::Healthy => println!("{}", format_success("Ready to research")),
        HealthStatus::Degraded => println!("{}", format_warning("Usable with reduced coverage")),
        HealthStatus::Unhealthy => {
            println!("{}", format_error("Not ready"));
            return Err(anyhow::anyhow!("Health check failed"));
        }
    }

    Ok(())
}
