//! Syntax highlighting for code blocks inside rendered HTML entries
//!
//! The highlighter runtime (syntax definitions and a theme) is expensive to
//! load, so it is loaded at most once per process. Concurrent renders share
//! a single in-flight load through [`HighlighterCell`]. Loading is chained:
//! the theme is only loaded once the syntax definitions loaded.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Node, Selector};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::config::HighlightConfig;
use crate::helpers::html_escape;

lazy_static! {
    static ref CODE_IN_PRE: Selector = Selector::parse("pre > code").expect("valid selector");
    static ref GLOBAL: Arc<HighlighterCell> = Arc::new(HighlighterCell::new());
}

/// Errors from loading the highlighter runtime
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HighlightError {
    #[error("failed to load syntax definitions: {0}")]
    Syntaxes(String),

    #[error("failed to load highlight theme: {0}")]
    Theme(String),

    #[error("highlighter load was interrupted: {0}")]
    Interrupted(String),
}

/// Loaded syntax definitions and theme
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
    line_numbers: bool,
}

impl Highlighter {
    /// Load syntaxes, then the theme
    pub fn load(config: &HighlightConfig) -> Result<Self, HighlightError> {
        let syntax_set = load_syntaxes(config.syntax_dir.as_deref())?;
        let theme = load_theme(&config.theme, config.theme_file.as_deref())?;

        Ok(Self {
            syntax_set,
            theme,
            line_numbers: config.line_number,
        })
    }

    /// Highlight one code block
    pub fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");
        let syntax = self.find_syntax(lang);

        match self.highlight_lines(code, syntax) {
            Ok(lines) => {
                if self.line_numbers {
                    add_line_numbers(&lines, lang)
                } else {
                    format!(
                        r#"<figure class="highlight {}"><pre>{}</pre></figure>"#,
                        lang,
                        lines.concat()
                    )
                }
            }
            Err(e) => {
                tracing::debug!("Highlighting failed for {}: {}", lang, e);
                format!(
                    r#"<figure class="highlight {}"><pre>{}</pre></figure>"#,
                    lang,
                    html_escape(code)
                )
            }
        }
    }

    /// Highlight every `pre > code` block of one fragment.
    ///
    /// Only the given fragment is touched. Highlighted output contains no
    /// `pre > code`, so running this again is a no-op.
    pub fn highlight_fragment(&self, fragment: &str) -> (String, usize) {
        let doc = Html::parse_fragment(fragment);
        let mut html = doc.root_element().inner_html();
        let mut count = 0;

        for code in doc.select(&CODE_IN_PRE) {
            let Some(pre) = code.parent().and_then(ElementRef::wrap) else {
                continue;
            };
            // The whole `pre` is replaced, so it may hold nothing but the code
            let sole_child = pre.children().all(|child| {
                child.id() == code.id()
                    || matches!(child.value(), Node::Text(text) if text.trim().is_empty())
            });
            if !sole_child {
                continue;
            }

            let source = code.text().collect::<String>();
            let lang = code_language(code, &self.syntax_set);
            let original = pre.html();

            if html.contains(&original) {
                let highlighted = self.highlight(&source, lang.as_deref());
                html = html.replacen(&original, &highlighted, 1);
                count += 1;
            }
        }

        if count == 0 {
            return (fragment.to_string(), 0);
        }
        (html, count)
    }

    fn find_syntax(&self, lang: &str) -> &SyntaxReference {
        self.syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    fn highlight_lines(
        &self,
        code: &str,
        syntax: &SyntaxReference,
    ) -> Result<Vec<String>, syntect::Error> {
        let mut highlighter = HighlightLines::new(syntax, &self.theme);
        let mut lines = Vec::new();

        for line in LinesWithEndings::from(code) {
            let regions = highlighter.highlight_line(line, &self.syntax_set)?;
            lines.push(styled_line_to_highlighted_html(
                &regions[..],
                IncludeBackground::No,
            )?);
        }

        Ok(lines)
    }
}

fn load_syntaxes(syntax_dir: Option<&str>) -> Result<SyntaxSet, HighlightError> {
    let defaults = SyntaxSet::load_defaults_newlines();

    let Some(dir) = syntax_dir else {
        return Ok(defaults);
    };

    let mut builder = defaults.into_builder();
    builder
        .add_from_folder(Path::new(dir), true)
        .map_err(|e| HighlightError::Syntaxes(format!("{}: {}", dir, e)))?;
    Ok(builder.build())
}

fn load_theme(name: &str, theme_file: Option<&str>) -> Result<Theme, HighlightError> {
    if let Some(file) = theme_file {
        return ThemeSet::get_theme(file).map_err(|e| HighlightError::Theme(format!("{}: {}", file, e)));
    }

    ThemeSet::load_defaults()
        .themes
        .remove(name)
        .ok_or_else(|| HighlightError::Theme(format!("unknown theme {:?}", name)))
}

/// Language of a code element from `language-x` / `lang-x` classes, or a
/// bare class naming a known syntax
fn code_language(code: ElementRef<'_>, syntax_set: &SyntaxSet) -> Option<String> {
    let classes = code.value().classes().collect::<Vec<_>>();

    let prefixed = classes.iter().find_map(|class| {
        class
            .strip_prefix("language-")
            .or_else(|| class.strip_prefix("lang-"))
    });
    if let Some(lang) = prefixed {
        return Some(lang.to_string());
    }

    classes
        .iter()
        .find(|class| syntax_set.find_syntax_by_token(class).is_some())
        .map(|class| class.to_string())
}

/// Add line numbers to highlighted lines
fn add_line_numbers(lines: &[String], lang: &str) -> String {
    let mut gutter = String::new();
    let mut code_lines = String::new();

    for (i, line) in lines.iter().enumerate() {
        gutter.push_str(&format!(r#"<span class="line-number">{}</span>"#, i + 1));
        code_lines.push_str(line.trim_end_matches('\n'));
        if i + 1 < lines.len() {
            gutter.push('\n');
            code_lines.push('\n');
        }
    }

    format!(
        r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code"><pre>{}</pre></td></tr></table></figure>"#,
        lang, gutter, code_lines
    )
}

/// Single-flight holder of the highlighter runtime
pub struct HighlighterCell {
    cell: OnceCell<Result<Arc<Highlighter>, HighlightError>>,
    loads: AtomicUsize,
}

impl HighlighterCell {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
            loads: AtomicUsize::new(0),
        }
    }

    /// Load the runtime on first use; later and concurrent callers share
    /// the first result, including a failure
    pub async fn ensure_loaded(
        &self,
        config: &HighlightConfig,
    ) -> Result<Arc<Highlighter>, HighlightError> {
        self.cell
            .get_or_init(|| async {
                self.loads.fetch_add(1, Ordering::SeqCst);
                let config = config.clone();
                let result = tokio::task::spawn_blocking(move || Highlighter::load(&config))
                    .await
                    .map_err(|e| HighlightError::Interrupted(e.to_string()))
                    .and_then(|loaded| loaded.map(Arc::new));

                match &result {
                    Ok(_) => tracing::debug!("Highlighter runtime loaded"),
                    Err(e) => tracing::warn!("Code blocks will not be highlighted: {}", e),
                }
                result
            })
            .await
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Number of load attempts started
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl Default for HighlighterCell {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide highlighter cell
pub fn global_highlighter() -> Arc<HighlighterCell> {
    GLOBAL.clone()
}

/// Ensure the process-wide highlighter runtime is loaded
pub async fn ensure_highlighter_loaded(
    config: &HighlightConfig,
) -> Result<Arc<Highlighter>, HighlightError> {
    GLOBAL.ensure_loaded(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> HighlightConfig {
        HighlightConfig {
            line_number: false,
            ..HighlightConfig::default()
        }
    }

    #[test]
    fn test_highlight_code() {
        let highlighter = Highlighter::load(&config()).unwrap();
        let html = highlighter.highlight("fn main() {}\n", Some("rust"));
        assert!(html.starts_with(r#"<figure class="highlight rust"><pre>"#));
        assert!(html.contains("<span style="));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_line_numbers() {
        let highlighter = Highlighter::load(&HighlightConfig {
            line_number: true,
            ..config()
        })
        .unwrap();
        let html = highlighter.highlight("a\nb\n", Some("text"));
        assert!(html.contains(r#"<span class="line-number">1</span>"#));
        assert!(html.contains(r#"<span class="line-number">2</span>"#));
        assert!(!html.contains(r#"<span class="line-number">3</span>"#));
    }

    #[test]
    fn test_highlight_fragment_is_scoped_and_idempotent() {
        let highlighter = Highlighter::load(&config()).unwrap();
        let fragment = r#"<p>Intro</p><pre><code class="language-rust">let x = 1 &lt; 2;</code></pre><code>inline</code>"#;

        let (once, count) = highlighter.highlight_fragment(fragment);
        assert_eq!(count, 1);
        assert!(once.contains("<p>Intro</p>"));
        assert!(once.contains(r#"<figure class="highlight rust">"#));
        assert!(once.contains("<code>inline</code>"));
        assert!(!once.contains("&lt; 2;</code></pre>"));

        let (twice, count) = highlighter.highlight_fragment(&once);
        assert_eq!(count, 0);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_pre_with_other_content_is_left_alone() {
        let highlighter = Highlighter::load(&config()).unwrap();
        let fragment = r#"<pre><span class="caption">main.rs</span><code class="language-rust">fn main() {}</code></pre>"#;

        let (html, count) = highlighter.highlight_fragment(fragment);
        assert_eq!(count, 0);
        assert_eq!(html, fragment);
    }

    #[test]
    fn test_code_language_from_bare_class() {
        let highlighter = Highlighter::load(&config()).unwrap();
        let (html, count) =
            highlighter.highlight_fragment(r#"<pre><code class="hljs python">print(1)</code></pre>"#);
        assert_eq!(count, 1);
        assert!(html.contains(r#"<figure class="highlight python">"#));
    }

    #[test]
    fn test_unknown_theme_fails() {
        let result = Highlighter::load(&HighlightConfig {
            theme: "no-such-theme".to_string(),
            ..config()
        });
        assert!(matches!(result, Err(HighlightError::Theme(_))));
    }

    #[test]
    fn test_missing_syntax_dir_fails_before_theme() {
        let result = Highlighter::load(&HighlightConfig {
            syntax_dir: Some("/nonexistent/syntaxes".to_string()),
            theme: "no-such-theme".to_string(),
            ..config()
        });
        assert!(matches!(result, Err(HighlightError::Syntaxes(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_load() {
        let cell = Arc::new(HighlighterCell::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cell = cell.clone();
            handles.push(tokio::spawn(async move {
                cell.ensure_loaded(&config()).await.is_ok()
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(cell.load_count(), 1);
        assert!(cell.is_loaded());
    }

    #[tokio::test]
    async fn test_failed_load_is_remembered() {
        let cell = HighlighterCell::new();
        let bad = HighlightConfig {
            theme: "no-such-theme".to_string(),
            ..config()
        };
        assert!(cell.ensure_loaded(&bad).await.is_err());
        assert!(cell.ensure_loaded(&config()).await.is_err());
        assert_eq!(cell.load_count(), 1);
    }

    #[tokio::test]
    async fn test_global_highlighter_loads_once() {
        let first = ensure_highlighter_loaded(&config()).await.unwrap();
        let second = ensure_highlighter_loaded(&config()).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(global_highlighter().is_loaded());
    }
}
