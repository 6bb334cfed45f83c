//! Catalog building - the ordered list of entries shown on listing pages

use chrono::NaiveDateTime;
use serde::Serialize;

use super::frontmatter::{self, Metadata};
use super::html::{self, HtmlOptions};
use super::{slug_for_path, Format, RawFiles};

/// Lightweight summary of one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentItem {
    pub slug: String,
    pub title: String,
    pub date: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// Logical path the entry was read from
    pub path: String,
}

impl ContentItem {
    /// Build an item from a path and whatever metadata could be read
    pub fn from_metadata(path: &str, metadata: Metadata) -> Self {
        let slug = slug_for_path(path);
        let title = metadata
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| title_from_slug(&slug));

        Self {
            slug,
            title,
            date: metadata.date,
            description: metadata.description,
            tags: metadata.tags,
            path: path.to_string(),
        }
    }

    pub fn parsed_date(&self) -> Option<NaiveDateTime> {
        self.date.as_deref().and_then(frontmatter::parse_date_string)
    }
}

pub type Catalog = Vec<ContentItem>;

/// Build the catalog with default HTML options
pub fn build_catalog(raw: &RawFiles, format: Format) -> Catalog {
    build_catalog_with(raw, format, &HtmlOptions::default())
}

/// Build the ordered catalog of a class.
///
/// Every raw entry yields exactly one item: an entry whose metadata cannot
/// be read falls back to a slug-derived title.
pub fn build_catalog_with(raw: &RawFiles, format: Format, options: &HtmlOptions) -> Catalog {
    let items = raw
        .iter()
        .map(|(path, text)| {
            let metadata = match format {
                Format::Markdown => frontmatter::parse(text)
                    .map(|(meta, _)| meta)
                    .unwrap_or_else(|e| {
                        tracing::warn!("Invalid front-matter in {:?}, using defaults: {}", path, e);
                        Metadata::default()
                    }),
                Format::Html => html::parse_metadata(text, options),
            };
            ContentItem::from_metadata(path, metadata)
        })
        .collect();

    order_by_date(items)
}

/// Order items newest first without moving undated items.
///
/// Undated items keep their input position. Dated items are sorted by date
/// descending (stable for equal dates) and fill the remaining positions.
pub fn order_by_date(items: Vec<ContentItem>) -> Catalog {
    let mut slots: Vec<Option<ContentItem>> = Vec::with_capacity(items.len());
    let mut dated_slots = Vec::new();
    let mut dated = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        match item.parsed_date() {
            Some(date) => {
                dated_slots.push(index);
                dated.push((date, item));
                slots.push(None);
            }
            None => slots.push(Some(item)),
        }
    }

    dated.sort_by(|a, b| b.0.cmp(&a.0));

    for (slot, (_, item)) in dated_slots.into_iter().zip(dated) {
        slots[slot] = Some(item);
    }

    slots.into_iter().flatten().collect()
}

/// Turn a slug into a display title: `my-first_post` -> `My First Post`
pub fn title_from_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
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
    fn test_frontmatter_item() {
        let catalog = build_catalog(
            &raw(&[("a.md", "---\ntitle: Hi\ndate: 2024-01-01\n---\nBody")]),
            Format::Markdown,
        );
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].slug, "a");
        assert_eq!(catalog[0].title, "Hi");
        assert_eq!(catalog[0].date.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_title_derived_from_slug() {
        let catalog = build_catalog(&raw(&[("b.md", "No frontmatter here")]), Format::Markdown);
        assert_eq!(catalog[0].slug, "b");
        assert_eq!(catalog[0].title, "B");
        assert_eq!(catalog[0].date, None);
    }

    #[test]
    fn test_malformed_entry_is_kept() {
        let catalog = build_catalog(
            &raw(&[
                ("broken-entry.md", "---\ntitle: Never closed\nBody"),
                ("ok.md", "---\ntitle: Fine\n---\n"),
            ]),
            Format::Markdown,
        );
        assert_eq!(catalog.len(), 2);
        let broken = catalog.iter().find(|i| i.slug == "broken-entry").unwrap();
        assert_eq!(broken.title, "Broken Entry");
        let ok = catalog.iter().find(|i| i.slug == "ok").unwrap();
        assert_eq!(ok.title, "Fine");
    }

    #[test]
    fn test_dates_descending_and_length_preserved() {
        let files = raw(&[
            ("a.md", "---\ndate: 2022-05-01\n---\n"),
            ("b.md", "---\ndate: 2024-01-01\n---\n"),
            ("c.md", "undated"),
            ("d.md", "---\ndate: 2023-03-03\n---\n"),
            ("e.md", "---\ndate: not a date\n---\n"),
        ]);
        let catalog = build_catalog(&files, Format::Markdown);
        assert_eq!(catalog.len(), files.len());

        let slugs: Vec<_> = catalog.iter().map(|i| i.slug.as_str()).collect();
        assert_eq!(slugs, vec!["b", "d", "c", "a", "e"]);

        let dates: Vec<_> = catalog.iter().filter_map(|i| i.parsed_date()).collect();
        assert!(dates.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_equal_dates_keep_path_order() {
        let catalog = build_catalog(
            &raw(&[
                ("x.md", "---\ndate: 2024-01-01\n---\n"),
                ("y.md", "---\ndate: 2024-01-01\n---\n"),
            ]),
            Format::Markdown,
        );
        let slugs: Vec<_> = catalog.iter().map(|i| i.slug.as_str()).collect();
        assert_eq!(slugs, vec!["x", "y"]);
    }

    #[test]
    fn test_idempotent() {
        let files = raw(&[
            ("a.md", "---\ndate: 2022-05-01\n---\n"),
            ("b.md", "plain"),
            ("c.md", "---\ntitle: C\ndate: 2023-01-01\n---\n"),
        ]);
        assert_eq!(
            build_catalog(&files, Format::Markdown),
            build_catalog(&files, Format::Markdown)
        );
    }

    #[test]
    fn test_html_catalog() {
        let catalog = build_catalog(
            &raw(&[
                (
                    "tool.html",
                    r#"<script id="post-metadata">{"title":"Tool","date":"2024-06-01","description":"A tool"}</script><article>x</article>"#,
                ),
                ("broken.html", r#"<script id="post-metadata">{oops</script>"#),
            ]),
            Format::Html,
        );
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].title, "Broken");
        assert_eq!(catalog[1].title, "Tool");
        assert_eq!(catalog[1].description.as_deref(), Some("A tool"));
    }

    #[test]
    fn test_title_from_slug() {
        assert_eq!(title_from_slug("b"), "B");
        assert_eq!(title_from_slug("my-first_post"), "My First Post");
        assert_eq!(title_from_slug("--odd--"), "Odd");
    }
}
