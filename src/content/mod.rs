//! Content module - discovery, parsing, listing and rendering of entries

pub mod catalog;
pub mod frontmatter;
pub mod highlight;
pub mod html;
mod markdown;
pub mod render;
pub mod resolver;
pub mod source;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use catalog::{build_catalog, build_catalog_with, Catalog, ContentItem};
pub use frontmatter::{Metadata, MetadataParseError};
pub use html::{HighlighterLink, HtmlOptions};
pub use markdown::MarkdownRenderer;
pub use render::{BodyRenderer, RenderedBody};
pub use resolver::{resolve, resolve_with, Body, HtmlBody, ParsedDocument, Resolved};
pub use source::{ContentSource, DirectorySource, LoadState, MemorySource};

/// Raw entry text keyed by logical path; iteration is lexicographic
pub type RawFiles = BTreeMap<String, String>;

/// A category of content with its own locations and format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ContentClass {
    Posts,
    Projects,
}

impl ContentClass {
    pub const ALL: [ContentClass; 2] = [ContentClass::Posts, ContentClass::Projects];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentClass::Posts => "posts",
            ContentClass::Projects => "projects",
        }
    }

    /// Singular display name of one entry
    pub fn noun(&self) -> &'static str {
        match self {
            ContentClass::Posts => "Post",
            ContentClass::Projects => "Project",
        }
    }
}

impl fmt::Display for ContentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source format of a content class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Markdown,
    Html,
}

impl Format {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Markdown => "md",
            Format::Html => "html",
        }
    }

    /// Whether a logical path carries this format's extension
    pub fn matches(&self, path: &str) -> bool {
        Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(self.extension()))
            .unwrap_or(false)
    }
}

/// Errors from loading content
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("failed to load content from {source_name}: {message}")]
    ResourceLoad {
        source_name: String,
        message: String,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ContentError {
    pub fn resource(source_name: &str, message: impl fmt::Display) -> Self {
        ContentError::ResourceLoad {
            source_name: source_name.to_string(),
            message: message.to_string(),
        }
    }
}

/// Raw files of one class together with their format
#[derive(Debug, Clone)]
pub struct ClassContent {
    pub format: Format,
    pub files: RawFiles,
}

/// The immutable content set loaded once at startup
#[derive(Debug, Clone)]
pub struct ContentSet {
    classes: HashMap<ContentClass, ClassContent>,
    options: HtmlOptions,
}

impl ContentSet {
    /// Load every configured class from the sources
    pub fn load(
        sources: &[Arc<dyn ContentSource>],
        classes: &[(ContentClass, Format)],
        options: HtmlOptions,
    ) -> Result<Self, ContentError> {
        let mut loaded = HashMap::new();
        for &(class, format) in classes {
            let files = source::load_raw_files(sources, class, format)?;
            loaded.insert(class, ClassContent { format, files });
        }

        Ok(Self {
            classes: loaded,
            options,
        })
    }

    /// Raw files of a class, if the class was loaded
    pub fn class(&self, class: ContentClass) -> Option<&ClassContent> {
        self.classes.get(&class)
    }

    /// Ordered catalog of a class; empty when the class was not loaded
    pub fn catalog(&self, class: ContentClass) -> Catalog {
        self.class(class)
            .map(|c| build_catalog_with(&c.files, c.format, &self.options))
            .unwrap_or_default()
    }

    /// Resolve a slug within a class
    pub fn resolve(&self, class: ContentClass, slug: &str) -> Resolved {
        match self.class(class) {
            Some(c) => resolve_with(slug, &c.files, c.format, &self.options),
            None => Resolved::NotFound,
        }
    }
}

/// Derive the slug of a logical path: its base name without extension
pub fn slug_for_path(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_for_path() {
        assert_eq!(slug_for_path("a.md"), "a");
        assert_eq!(slug_for_path("2023/my-post.md"), "my-post");
        assert_eq!(slug_for_path("dir/v1.2.html"), "v1.2");
    }

    #[test]
    fn test_format_matches() {
        assert!(Format::Markdown.matches("posts/a.md"));
        assert!(Format::Html.matches("p.HTML"));
        assert!(!Format::Markdown.matches("a.markdown.txt"));
        assert!(!Format::Html.matches("README"));
    }

    #[test]
    fn test_content_set_unknown_class_is_empty() {
        let source: Arc<dyn ContentSource> =
            Arc::new(MemorySource::new("mem").with_file(ContentClass::Posts, "a.md", "A"));
        let set = ContentSet::load(
            &[source],
            &[(ContentClass::Posts, Format::Markdown)],
            HtmlOptions::default(),
        )
        .unwrap();

        assert_eq!(set.catalog(ContentClass::Posts).len(), 1);
        assert!(set.catalog(ContentClass::Projects).is_empty());
        assert_eq!(set.resolve(ContentClass::Projects, "a"), Resolved::NotFound);
    }
}
