// file: src/fetcher/extract.rs
// description: main-content text extraction from raw html
// reference: https://docs.rs/scraper

use crate::error::{ResearchError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

const BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "pre", "blockquote", "td", "th",
];

const BOILERPLATE_TAGS: &[&str] = &[
    "nav", "header", "footer", "aside", "script", "style", "form", "noscript",
];

/// Tried in order; the first match with enough text wins, `body` otherwise.
const CONTAINER_SELECTORS: &[&str] = &["main", "article", "[role=main]", "#content", ".content"];

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("static regex");
    static ref BLOCKS: Selector =
        Selector::parse(&BLOCK_TAGS.join(", ")).expect("static selector");
    static ref CONTAINERS: Vec<Selector> = CONTAINER_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("static selector"))
        .collect();
    static ref BODY: Selector = Selector::parse("body").expect("static selector");
    static ref TITLE: Selector = Selector::parse("title").expect("static selector");
    static ref H1: Selector = Selector::parse("h1").expect("static selector");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    min_content_chars: usize,
}

impl HtmlExtractor {
    pub fn new(min_content_chars: usize) -> Self {
        Self { min_content_chars }
    }

    /// Readable text of the page's main content, one block per paragraph.
    pub fn extract(&self, html: &str, url: &str) -> Result<ExtractedPage> {
        let document = Html::parse_document(html);

        let title = document
            .select(&TITLE)
            .next()
            .or_else(|| document.select(&H1).next())
            .map(|el| collapse(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty());

        let text = self
            .container(&document)
            .map(block_text)
            .unwrap_or_default();

        if text.chars().count() < self.min_content_chars {
            return Err(ResearchError::EmptyContent(url.to_string()));
        }

        Ok(ExtractedPage { title, text })
    }

    fn container<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        CONTAINERS
            .iter()
            .filter_map(|selector| document.select(selector).next())
            .find(|candidate| block_text(*candidate).chars().count() >= self.min_content_chars)
            .or_else(|| document.select(&BODY).next())
    }
}

fn block_text(container: ElementRef<'_>) -> String {
    container
        .select(&BLOCKS)
        .filter(|block| !is_nested_or_boilerplate(*block, container))
        .map(|block| collapse(&block.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Blocks inside boilerplate are dropped; blocks inside another block are
/// already covered by the outer block's text.
fn is_nested_or_boilerplate(block: ElementRef<'_>, container: ElementRef<'_>) -> bool {
    for ancestor in block.ancestors() {
        if ancestor.id() == container.id() {
            break;
        }
        if let Some(element) = ElementRef::wrap(ancestor) {
            let name = element.value().name();
            if BOILERPLATE_TAGS.contains(&name) || BLOCK_TAGS.contains(&name) {
                return true;
            }
        }
    }
    false
}

fn collapse(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = r#"<!DOCTYPE html>
    <html>
      <head><title> Photosynthesis
        Explained </title><style>p { color: red; }</style></head>
      <body>
        <header><nav><ul><li>Home</li><li>About</li></ul></nav></header>
        <main>
          <h1>Photosynthesis</h1>
          <p>Plants convert   light energy
             into chemical energy.</p>
          <ul><li><p>Chlorophyll absorbs light.</p></li></ul>
          <aside><p>Advertisement</p></aside>
          <script>var tracking = true;</script>
        </main>
        <footer><p>Copyright</p></footer>
      </body>
    </html>"#;

    #[test]
    fn test_extracts_main_content_without_boilerplate() {
        let page = HtmlExtractor::new(10).extract(ARTICLE, "https://a.test").unwrap();

        assert_eq!(page.title.as_deref(), Some("Photosynthesis Explained"));
        assert_eq!(
            page.text,
            "Photosynthesis\n\nPlants convert light energy into chemical energy.\n\nChlorophyll absorbs light."
        );
        assert!(!page.text.contains("Advertisement"));
        assert!(!page.text.contains("Home"));
        assert!(!page.text.contains("tracking"));
    }

    #[test]
    fn test_falls_back_to_body_and_h1_title() {
        let html = "<html><body><h1>Heading</h1><div><p>Some body paragraph text here.</p></div></body></html>";
        let page = HtmlExtractor::new(10).extract(html, "https://b.test").unwrap();

        assert_eq!(page.title.as_deref(), Some("Heading"));
        assert!(page.text.contains("Some body paragraph text here."));
    }

    #[test]
    fn test_short_content_is_empty_error() {
        let html = "<html><body><p>Too short</p></body></html>";
        let err = HtmlExtractor::new(200).extract(html, "https://c.test").unwrap_err();
        assert!(matches!(err, ResearchError::EmptyContent(url) if url == "https://c.test"));
    }
}
