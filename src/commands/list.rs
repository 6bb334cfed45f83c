//! List site content

use anyhow::Result;

use crate::content::{ContentClass, ContentSet};
use crate::Site;

/// List one class, or every class when none is given
pub async fn run(site: &Site, class: Option<ContentClass>) -> Result<()> {
    let content = site.load().await?;
    let classes = match class {
        Some(class) => vec![class],
        None => ContentClass::ALL.to_vec(),
    };

    for class in classes {
        print!("{}", format_listing(&content, class));
    }

    Ok(())
}

/// One line per catalog item: date, title, then the source path
pub fn format_listing(content: &ContentSet, class: ContentClass) -> String {
    let catalog = content.catalog(class);
    let heading = format!("{}s", class.noun());

    let mut out = format!("{} ({}):\n", heading, catalog.len());
    for item in &catalog {
        let date = item
            .parsed_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "----------".to_string());
        out.push_str(&format!("  {} - {} [{}]\n", date, item.title, item.path));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentSource, Format, HtmlOptions, MemorySource};
    use std::sync::Arc;

    #[test]
    fn test_format_listing() {
        let source = MemorySource::new("mem")
            .with_file(ContentClass::Posts, "undated.md", "No front-matter")
            .with_file(
                ContentClass::Posts,
                "first.md",
                "---\ntitle: First\ndate: 2024-02-03 10:00:00\n---\n",
            );
        let sources: Vec<Arc<dyn ContentSource>> = vec![Arc::new(source)];
        let content = ContentSet::load(
            &sources,
            &[(ContentClass::Posts, Format::Markdown)],
            HtmlOptions::default(),
        )
        .unwrap();

        assert_eq!(
            format_listing(&content, ContentClass::Posts),
            "Posts (2):\n  2024-02-03 - First [first.md]\n  ---------- - Undated [undated.md]\n"
        );
        assert_eq!(
            format_listing(&content, ContentClass::Projects),
            "Projects (0):\n"
        );
    }
}
