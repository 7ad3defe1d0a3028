// file: src/llm/prompts.rs
// description: prompt templates for decomposition, fact extraction and synthesis
// reference: each template asks for a json-only reply parsed by llm::json

const DECOMPOSE_TEMPLATE: &str = r#"You are a research assistant helping decompose complex questions into searchable sub-queries.

Original question: {question}

Your task is to break this into {min}-{max} specific, searchable sub-queries that:
1. Cover distinct aspects of the main question
2. Can be answered by web search
3. Are specific enough for good search results

Consider what information is needed to fully answer this question:
- Core concepts that need definition
- Related technologies or methods to explore
- Different perspectives or use cases
- Recent developments or current state
- Practical implications or applications

Return ONLY a JSON array of query strings, nothing else:
["query 1", "query 2", "query 3"]
"#;

const EXTRACT_TEMPLATE: &str = r#"You are extracting key facts from a source for research purposes.

Research question: {question}

Source URL: {url}
Source content:
{content}

Your task is to extract up to {max_facts} key facts or claims that are relevant to answering the research question.

For each fact:
1. State it clearly and concisely
2. Note any caveats or conditions
3. Rate confidence (high/medium/low) based on:
   - Whether the source provides evidence
   - Whether it's a primary or secondary source
   - Whether it's opinion vs fact

Focus on factual claims, not opinions. Prioritize information that directly answers the research question.

Return ONLY valid JSON in this format:
{
  "facts": [
    {
      "claim": "Clear, factual statement",
      "caveat": "Any limitations or conditions (or null)",
      "confidence": "high"
    }
  ]
}

If no relevant facts found, return: {"facts": []}
"#;

const SYNTHESIZE_TEMPLATE: &str = r#"You are synthesizing research findings from multiple sources.

Original question: {question}

Facts gathered from {num_sources} sources:
{facts_json}

Your task is to analyze these facts and provide:

1. AREAS OF AGREEMENT: What do multiple sources agree on? List the key consensus points.

2. CONTRADICTIONS: Where do sources conflict? For each contradiction give the conflicting claim, the sources on each side, and why the conflict might exist.

3. KNOWLEDGE GAPS: What important aspects are missing or unclear? What questions remain unanswered?

4. OVERALL ANSWER: A concise answer (1-2 paragraphs max). Higher confidence facts should carry more weight.

Return ONLY valid JSON in this format:
{
  "agreements": ["Point of agreement 1"],
  "contradictions": [
    {
      "claim": "Description of the contradiction",
      "sources": ["url1", "url2"],
      "explanation": "Why this might exist"
    }
  ],
  "gaps": ["Missing information 1"],
  "answer": "Concise answer to the original question."
}

If there are no contradictions or gaps, use empty arrays: "contradictions": [], "gaps": []
"#;

pub fn decompose_prompt(question: &str, min: usize, max: usize) -> String {
    DECOMPOSE_TEMPLATE
        .replace("{min}", &min.to_string())
        .replace("{max}", &max.to_string())
        .replace("{question}", question)
}

pub fn extract_prompt(question: &str, url: &str, content: &str, max_facts: usize) -> String {
    EXTRACT_TEMPLATE
        .replace("{question}", question)
        .replace("{url}", url)
        .replace("{max_facts}", &max_facts.to_string())
        .replace("{content}", content)
}

pub fn synthesize_prompt(question: &str, num_sources: usize, facts_json: &str) -> String {
    SYNTHESIZE_TEMPLATE
        .replace("{question}", question)
        .replace("{num_sources}", &num_sources.to_string())
        .replace("{facts_json}", facts_json)
}
