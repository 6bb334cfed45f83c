//! Slug resolution - the single authority from a route slug to an entry

use super::frontmatter::{self, Metadata};
use super::html::{self, HighlighterLink, HtmlOptions};
use super::{slug_for_path, Format, RawFiles};

/// Body markup of an HTML entry
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlBody {
    pub fragment: String,
    pub highlighter: Option<HighlighterLink>,
}

/// Entry body awaiting rendering
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Markdown(String),
    Html(HtmlBody),
}

/// A fully parsed entry
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub metadata: Metadata,
    pub body: Body,
}

/// Outcome of a slug lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Found(ParsedDocument),
    NotFound,
}

impl Resolved {
    pub fn found(self) -> Option<ParsedDocument> {
        match self {
            Resolved::Found(doc) => Some(doc),
            Resolved::NotFound => None,
        }
    }
}

/// Resolve with default HTML options
pub fn resolve(slug: &str, raw: &RawFiles, format: Format) -> Resolved {
    resolve_with(slug, raw, format, &HtmlOptions::default())
}

/// Find the entry named `{slug}.{ext}` and parse it fully.
///
/// A path matches when it carries the format's extension (in any case) and
/// its file stem equals the slug, the same rule the catalog derives slugs
/// with. When several paths match, the first in lexicographic order wins.
pub fn resolve_with(slug: &str, raw: &RawFiles, format: Format, options: &HtmlOptions) -> Resolved {
    if slug.is_empty() || slug.contains('/') {
        return Resolved::NotFound;
    }

    let mut matches = raw
        .iter()
        .filter(|(path, _)| format.matches(path) && slug_for_path(path) == slug);

    let Some((path, text)) = matches.next() else {
        return Resolved::NotFound;
    };

    let shadowed = matches.map(|(p, _)| p.as_str()).collect::<Vec<_>>();
    if !shadowed.is_empty() {
        tracing::debug!("Slug {:?} resolved to {:?}, shadowing {:?}", slug, path, shadowed);
    }

    Resolved::Found(parse_entry(path, text, format, options))
}

fn parse_entry(path: &str, text: &str, format: Format, options: &HtmlOptions) -> ParsedDocument {
    match format {
        Format::Markdown => {
            let (metadata, body) = frontmatter::parse(text).unwrap_or_else(|e| {
                tracing::warn!("Invalid front-matter in {:?}, rendering as body: {}", path, e);
                (Metadata::default(), text)
            });
            ParsedDocument {
                metadata,
                body: Body::Markdown(body.to_string()),
            }
        }
        Format::Html => {
            let doc = html::parse_document(text, options);
            ParsedDocument {
                metadata: doc.metadata,
                body: Body::Html(HtmlBody {
                    fragment: doc.body,
                    highlighter: doc.highlighter,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(entries: &[(&str, &str)]) -> RawFiles {
        entries
            .iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_markdown() {
        let files = raw(&[("hello.md", "---\ntitle: Hello\n---\n# Body")]);
        let doc = resolve("hello", &files, Format::Markdown).found().unwrap();
        assert_eq!(doc.metadata.title.as_deref(), Some("Hello"));
        assert_eq!(doc.body, Body::Markdown("# Body".to_string()));
    }

    #[test]
    fn test_resolve_html() {
        let files = raw(&[(
            "x.html",
            r#"<script id="post-metadata">{"title":"X"}</script><article>Hi</article>"#,
        )]);
        let doc = resolve("x", &files, Format::Html).found().unwrap();
        assert_eq!(doc.metadata.title.as_deref(), Some("X"));
        assert_eq!(
            doc.body,
            Body::Html(HtmlBody {
                fragment: "Hi".to_string(),
                highlighter: None,
            })
        );
    }

    #[test]
    fn test_unknown_slug_is_not_found() {
        let files = raw(&[("a.md", "A")]);
        for slug in ["b", "", "a.md", "../a", "posts/a", "A"] {
            assert_eq!(resolve(slug, &files, Format::Markdown), Resolved::NotFound, "{slug}");
        }
        assert_eq!(resolve("a", &RawFiles::new(), Format::Markdown), Resolved::NotFound);
    }

    #[test]
    fn test_slug_must_match_whole_file_name() {
        let files = raw(&[("mya.md", "wrong"), ("a.markdown", "wrong")]);
        assert_eq!(resolve("a", &files, Format::Markdown), Resolved::NotFound);
    }

    #[test]
    fn test_ambiguous_slug_prefers_first_path() {
        let files = raw(&[("2024/c.md", "newer dir"), ("2023/c.md", "older dir"), ("z/c.md", "z")]);
        let doc = resolve("c", &files, Format::Markdown).found().unwrap();
        assert_eq!(doc.body, Body::Markdown("older dir".to_string()));
    }

    #[test]
    fn test_uppercase_extension_resolves() {
        let files = raw(&[("Notes.MD", "---\ntitle: Notes\n---\nBody")]);
        let doc = resolve("Notes", &files, Format::Markdown).found().unwrap();
        assert_eq!(doc.metadata.title.as_deref(), Some("Notes"));
        assert_eq!(resolve("notes", &files, Format::Markdown), Resolved::NotFound);
    }

    #[test]
    fn test_every_catalog_slug_resolves() {
        let files = raw(&[
            ("Notes.MD", "Body"),
            ("2024/deep/post.md", "---\ntitle: Deep\n---\n"),
            ("v1.2.md", "Version"),
            ("broken.md", "---\nunterminated"),
        ]);
        for item in crate::content::build_catalog(&files, Format::Markdown) {
            assert!(
                resolve(&item.slug, &files, Format::Markdown).found().is_some(),
                "{}",
                item.slug
            );
        }
    }

    #[test]
    fn test_malformed_frontmatter_degrades_to_body() {
        let text = "---\ntitle: never closed\nBody";
        let files = raw(&[("m.md", text)]);
        let doc = resolve("m", &files, Format::Markdown).found().unwrap();
        assert_eq!(doc.metadata, Metadata::default());
        assert_eq!(doc.body, Body::Markdown(text.to_string()));
    }
}
