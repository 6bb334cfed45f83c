//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

use crate::content::html::{DEFAULT_HIGHLIGHTER_PATTERN, DEFAULT_METADATA_SCRIPT_ID};
use crate::content::{ContentClass, Format};

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub author: String,
    pub description: String,

    // URL
    pub root: String,

    // Directory
    pub public_dir: String,

    // Content
    #[serde(deserialize_with = "posts_section")]
    pub posts: ClassConfig,
    #[serde(deserialize_with = "projects_section")]
    pub projects: ClassConfig,
    pub metadata_script_id: String,

    // Rendering
    pub highlight: HighlightConfig,
    pub render: RenderConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Folio".to_string(),
            author: String::new(),
            description: String::new(),

            root: "/".to_string(),

            public_dir: "public".to_string(),

            posts: ClassConfig::posts(),
            projects: ClassConfig::projects(),
            metadata_script_id: DEFAULT_METADATA_SCRIPT_ID.to_string(),

            highlight: HighlightConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Configuration of one content class
    pub fn class(&self, class: ContentClass) -> &ClassConfig {
        match class {
            ContentClass::Posts => &self.posts,
            ContentClass::Projects => &self.projects,
        }
    }

    /// Class served under a route segment
    pub fn class_for_route(&self, route: &str) -> Option<ContentClass> {
        ContentClass::ALL
            .into_iter()
            .find(|class| self.class(*class).route == route)
    }
}

/// Where a content class lives and how it is written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassConfig {
    /// Directories relative to the site root; later ones override earlier
    /// ones on path collision
    pub dirs: Vec<String>,
    pub format: Format,
    /// Route segment of listing and detail pages
    pub route: String,
    /// Heading of the listing page
    pub heading: String,
}

impl ClassConfig {
    pub fn posts() -> Self {
        Self {
            dirs: vec!["content/posts".to_string()],
            format: Format::Markdown,
            route: "blog".to_string(),
            heading: "Blog".to_string(),
        }
    }

    pub fn projects() -> Self {
        Self {
            dirs: vec!["content/projects".to_string()],
            format: Format::Html,
            route: "projects".to_string(),
            heading: "Projects".to_string(),
        }
    }
}

/// A class section as written in `_config.yml`; omitted fields keep the
/// class defaults
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClassSection {
    dirs: Option<Vec<String>>,
    format: Option<Format>,
    route: Option<String>,
    heading: Option<String>,
}

impl ClassSection {
    fn over(self, base: ClassConfig) -> ClassConfig {
        ClassConfig {
            dirs: self.dirs.unwrap_or(base.dirs),
            format: self.format.unwrap_or(base.format),
            route: self.route.unwrap_or(base.route),
            heading: self.heading.unwrap_or(base.heading),
        }
    }
}

fn posts_section<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ClassConfig, D::Error> {
    Ok(ClassSection::deserialize(deserializer)?.over(ClassConfig::posts()))
}

fn projects_section<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ClassConfig, D::Error> {
    Ok(ClassSection::deserialize(deserializer)?.over(ClassConfig::projects()))
}

/// Syntax highlighting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enable: bool,
    /// Name of a bundled syntect theme
    pub theme: String,
    /// `.tmTheme` file used instead of the bundled theme
    pub theme_file: Option<String>,
    /// Folder of extra `.sublime-syntax` definitions
    pub syntax_dir: Option<String>,
    /// Stylesheet hrefs matching this pattern flag an entry for highlighting
    pub stylesheet_pattern: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: true,
            theme: "InspiredGitHub".to_string(),
            theme_file: None,
            syntax_dir: None,
            stylesheet_pattern: DEFAULT_HIGHLIGHTER_PATTERN.to_string(),
            line_number: false,
        }
    }
}

/// Body rendering configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Run HTML entries through the allow-list sanitizer
    pub sanitize: bool,
}
