//! Body rendering for detail pages
//!
//! Markdown bodies go through the class-mapping renderer. HTML bodies are
//! injected according to a [`FragmentPolicy`] and, when the entry asked for
//! a syntax highlighter, highlighted in place.
//!
//! Entries are first-party files, so [`TrustedFragment`] is the default.
//! [`SanitizedFragment`] is an allow-list sanitizer for content from
//! untrusted authors.

use std::fmt::Write;
use std::sync::Arc;

use ego_tree::NodeRef;
use scraper::{Html, Node};

use super::highlight::HighlighterCell;
use super::markdown::MarkdownRenderer;
use super::resolver::{Body, ParsedDocument};
use crate::config::{HighlightConfig, SiteConfig};
use crate::helpers::html_escape;

/// How an extracted HTML fragment is admitted into a page
pub trait FragmentPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn admit(&self, fragment: &str) -> String;
}

/// Inject the fragment unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedFragment;

impl FragmentPolicy for TrustedFragment {
    fn name(&self) -> &'static str {
        "trusted"
    }

    fn admit(&self, fragment: &str) -> String {
        fragment.to_string()
    }
}

/// Tags kept by the sanitizer
const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "code", "del", "div", "em", "figcaption", "figure",
    "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "kbd", "li", "ol", "p", "pre", "s",
    "section", "span", "strong", "sub", "sup", "table", "tbody", "td", "th", "thead", "tr", "u",
    "ul",
];

/// Tags dropped together with their content
const DROPPED_TAGS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "noscript", "template", "form",
];

/// Attributes kept by the sanitizer, in output order
const ALLOWED_ATTRS: &[&str] = &["id", "class", "href", "src", "alt", "title", "lang"];

/// URL schemes allowed in `href` and `src`; scheme-less URLs are relative
const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];

const VOID_TAGS: &[&str] = &["br", "hr", "img"];

/// Keep allow-listed tags and attributes, unwrap everything else
#[derive(Debug, Clone, Copy, Default)]
pub struct SanitizedFragment;

impl FragmentPolicy for SanitizedFragment {
    fn name(&self) -> &'static str {
        "sanitized"
    }

    fn admit(&self, fragment: &str) -> String {
        let doc = Html::parse_fragment(fragment);
        let mut out = String::with_capacity(fragment.len());
        for child in doc.root_element().children() {
            write_sanitized(child, &mut out);
        }
        out
    }
}

fn write_sanitized(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(&html_escape(text)),
        Node::Element(element) => {
            let name = element.name();
            if DROPPED_TAGS.contains(&name) {
                return;
            }

            let keep = ALLOWED_TAGS.contains(&name);
            if keep {
                out.push('<');
                out.push_str(name);
                for attr in ALLOWED_ATTRS {
                    if let Some(value) = element.attr(attr).filter(|v| allowed_value(attr, v)) {
                        let _ = write!(out, r#" {}="{}""#, attr, html_escape(value));
                    }
                }
                out.push('>');
            }

            for child in node.children() {
                write_sanitized(child, out);
            }

            if keep && !VOID_TAGS.contains(&name) {
                let _ = write!(out, "</{}>", name);
            }
        }
        _ => {}
    }
}

fn allowed_value(attr: &str, value: &str) -> bool {
    if attr != "href" && attr != "src" {
        return true;
    }

    // Browsers ignore whitespace and control characters inside a scheme
    let url = value
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    match url.split_once(':') {
        Some((scheme, _)) if !scheme.contains(['/', '?', '#']) => {
            ALLOWED_SCHEMES.contains(&scheme)
        }
        _ => true,
    }
}

/// Rendered body plus the page-level assets it needs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedBody {
    pub html: String,
    /// Inline CSS to place in a `<style>` element
    pub styles: Option<String>,
    /// Highlighter stylesheet to link from the page head
    pub stylesheet: Option<String>,
    /// Number of code blocks highlighted
    pub highlighted: usize,
}

/// Renders parsed documents for display
pub struct BodyRenderer {
    markdown: MarkdownRenderer,
    policy: Box<dyn FragmentPolicy>,
    highlight: HighlightConfig,
    highlighter: Arc<HighlighterCell>,
}

impl BodyRenderer {
    /// Renderer for the site configuration, sharing the process-wide
    /// highlighter
    pub fn new(config: &SiteConfig) -> Self {
        let policy: Box<dyn FragmentPolicy> = if config.render.sanitize {
            Box::new(SanitizedFragment)
        } else {
            Box::new(TrustedFragment)
        };

        Self {
            markdown: MarkdownRenderer::new(),
            policy,
            highlight: config.highlight.clone(),
            highlighter: super::highlight::global_highlighter(),
        }
    }

    pub fn with_policy(mut self, policy: Box<dyn FragmentPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_highlighter(mut self, highlighter: Arc<HighlighterCell>) -> Self {
        self.highlighter = highlighter;
        self
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Render a document body.
    ///
    /// Never fails; a highlighter that cannot be loaded leaves code blocks
    /// unhighlighted.
    pub async fn render(&self, doc: &ParsedDocument) -> RenderedBody {
        match &doc.body {
            Body::Markdown(markdown) => RenderedBody {
                html: self.markdown.render(markdown),
                styles: doc.metadata.styles.clone(),
                ..Default::default()
            },
            Body::Html(body) => {
                let mut html = self.policy.admit(&body.fragment);
                let mut highlighted = 0;

                if let Some(link) = &body.highlighter {
                    if self.highlight.enable {
                        match self.highlighter.ensure_loaded(&self.highlight).await {
                            Ok(highlighter) => {
                                let (out, count) = highlighter.highlight_fragment(&html);
                                html = out;
                                highlighted = count;
                            }
                            Err(e) => {
                                tracing::debug!(
                                    "Rendering {} without highlighting: {}",
                                    link.stylesheet_href,
                                    e
                                );
                            }
                        }
                    }
                }

                RenderedBody {
                    html,
                    styles: doc.metadata.styles.clone(),
                    stylesheet: body.highlighter.as_ref().map(|l| l.stylesheet_href.clone()),
                    highlighted,
                }
            }
        }
    }
}
