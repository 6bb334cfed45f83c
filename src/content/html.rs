//! HTML entries with embedded JSON metadata
//!
//! A project entry is a complete HTML document. Its metadata lives in a
//! `<script>` element with a well-known id, its article markup in the
//! first `<article>` (or a generic container, or the body).

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::frontmatter::Metadata;

/// Default id of the script element holding JSON metadata
pub const DEFAULT_METADATA_SCRIPT_ID: &str = "post-metadata";

/// Default pattern for external highlighter stylesheets
pub const DEFAULT_HIGHLIGHTER_PATTERN: &str = r"(?i)(highlight(\.js)?|hljs|prism)";

lazy_static! {
    static ref SCRIPT: Selector = Selector::parse("script").expect("valid selector");
    static ref STYLE: Selector = Selector::parse("style").expect("valid selector");
    static ref STYLESHEET: Selector =
        Selector::parse(r#"link[rel~="stylesheet"][href]"#).expect("valid selector");
    static ref ARTICLE: Selector = Selector::parse("article").expect("valid selector");
    static ref CONTAINER: Selector =
        Selector::parse(".container, container").expect("valid selector");
    static ref HEADER: Selector = Selector::parse("header").expect("valid selector");
    static ref BODY: Selector = Selector::parse("body").expect("valid selector");
    static ref DEFAULT_PATTERN: Regex =
        Regex::new(DEFAULT_HIGHLIGHTER_PATTERN).expect("valid highlighter pattern");
}

/// Options for reading HTML entries
#[derive(Debug, Clone)]
pub struct HtmlOptions {
    /// Id of the metadata script element
    pub script_id: String,
    /// Matched against stylesheet hrefs to detect a syntax highlighter
    pub highlighter_pattern: Regex,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            script_id: DEFAULT_METADATA_SCRIPT_ID.to_string(),
            highlighter_pattern: DEFAULT_PATTERN.clone(),
        }
    }
}

impl HtmlOptions {
    /// Build options from configured values, falling back to the default
    /// pattern when the configured one does not compile
    pub fn new(script_id: &str, pattern: &str) -> Self {
        let highlighter_pattern = Regex::new(pattern).unwrap_or_else(|e| {
            tracing::warn!("Invalid highlighter pattern {:?}, using default: {}", pattern, e);
            DEFAULT_PATTERN.clone()
        });

        Self {
            script_id: script_id.to_string(),
            highlighter_pattern,
        }
    }
}

/// Stylesheet of an external syntax highlighter referenced by an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlighterLink {
    pub stylesheet_href: String,
}

/// Everything extracted from an HTML entry
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlDocument {
    pub metadata: Metadata,
    pub highlighter: Option<HighlighterLink>,
    /// Inner markup of the content container
    pub body: String,
}

/// Extract metadata, styles, highlighter link and body from a document.
///
/// Never fails: missing pieces are simply absent, undecodable metadata is
/// logged and treated as empty.
pub fn parse_document(text: &str, options: &HtmlOptions) -> HtmlDocument {
    let doc = Html::parse_document(text);

    let metadata = extract_metadata(&doc, options);
    let highlighter = extract_highlighter(&doc, &options.highlighter_pattern);
    let body = extract_body(&doc);

    HtmlDocument {
        metadata,
        highlighter,
        body,
    }
}

/// Extract only the metadata (script JSON plus inline styles)
pub fn parse_metadata(text: &str, options: &HtmlOptions) -> Metadata {
    let doc = Html::parse_document(text);
    extract_metadata(&doc, options)
}

fn extract_metadata(doc: &Html, options: &HtmlOptions) -> Metadata {
    let script = doc
        .select(&SCRIPT)
        .find(|el| el.value().id() == Some(options.script_id.as_str()));

    let mut metadata = match script {
        Some(el) => {
            let json = el.text().collect::<String>();
            Metadata::from_json(json.trim()).unwrap_or_else(|e| {
                tracing::warn!("Failed to decode embedded metadata: {}", e);
                Metadata::default()
            })
        }
        None => Metadata::default(),
    };

    let styles = doc
        .select(&STYLE)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|css| !css.is_empty())
        .collect::<Vec<_>>();
    if !styles.is_empty() {
        metadata.styles = Some(styles.join("\n"));
    }

    metadata
}

fn extract_highlighter(doc: &Html, pattern: &Regex) -> Option<HighlighterLink> {
    doc.select(&STYLESHEET)
        .filter_map(|el| el.value().attr("href"))
        .find(|href| pattern.is_match(href))
        .map(|href| HighlighterLink {
            stylesheet_href: href.to_string(),
        })
}

/// Article, else container without its headers, else body, else everything
fn extract_body(doc: &Html) -> String {
    if let Some(article) = doc.select(&ARTICLE).next() {
        return article.inner_html().trim().to_string();
    }

    if let Some(container) = doc.select(&CONTAINER).next() {
        return without_headers(container);
    }

    if let Some(body) = doc.select(&BODY).next() {
        return body.inner_html().trim().to_string();
    }

    doc.root_element().html()
}

fn without_headers(container: ElementRef<'_>) -> String {
    let mut html = container.inner_html();
    for header in container.select(&HEADER) {
        html = html.replacen(&header.html(), "", 1);
    }
    html.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> HtmlDocument {
        parse_document(text, &HtmlOptions::default())
    }

    #[test]
    fn test_script_metadata_and_article() {
        let doc = parse(r#"<script id="post-metadata">{"title":"X"}</script><article>Hi</article>"#);
        assert_eq!(doc.metadata.title.as_deref(), Some("X"));
        assert_eq!(doc.body, "Hi");
        assert_eq!(doc.highlighter, None);
    }

    #[test]
    fn test_invalid_json_degrades_to_empty_metadata() {
        let doc = parse(r#"<script id="post-metadata">{"title": </script><article>Body</article>"#);
        assert_eq!(doc.metadata, Metadata::default());
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn test_other_scripts_are_ignored() {
        let doc = parse(
            r#"<script>var x = 1;</script><script id="post-metadata">{"date":"2024-02-01"}</script><article>A</article>"#,
        );
        assert_eq!(doc.metadata.date.as_deref(), Some("2024-02-01"));
    }

    #[test]
    fn test_styles_and_highlighter_link() {
        let doc = parse(
            r#"<html><head>
<link rel="stylesheet" href="/css/site.css">
<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.9.0/styles/github.min.css">
<style>.demo { color: red; }</style>
</head><body><article><p>Text</p></article></body></html>"#,
        );
        assert_eq!(doc.metadata.styles.as_deref(), Some(".demo { color: red; }"));
        assert_eq!(
            doc.highlighter.map(|h| h.stylesheet_href),
            Some(
                "https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.9.0/styles/github.min.css"
                    .to_string()
            )
        );
        assert_eq!(doc.body, "<p>Text</p>");
    }

    #[test]
    fn test_container_fallback_drops_header() {
        let doc = parse(
            r#"<body><div class="container"><header><h1>Site</h1></header><p>Entry</p></div></body>"#,
        );
        assert_eq!(doc.body, "<p>Entry</p>");
    }

    #[test]
    fn test_body_fallback() {
        let doc = parse("<html><body><p>Only body</p></body></html>");
        assert_eq!(doc.body, "<p>Only body</p>");
    }

    #[test]
    fn test_custom_script_id() {
        let options = HtmlOptions::new("project-meta", DEFAULT_HIGHLIGHTER_PATTERN);
        let doc = parse_document(
            r#"<script id="project-meta">{"title":"Custom"}</script><article>x</article>"#,
            &options,
        );
        assert_eq!(doc.metadata.title.as_deref(), Some("Custom"));
    }

    #[test]
    fn test_invalid_pattern_falls_back_to_default() {
        let options = HtmlOptions::new("post-metadata", "(unclosed");
        assert!(options.highlighter_pattern.is_match("prism.css"));
    }
}
