//! folio: content pipeline for a personal site
//!
//! Posts written in Markdown and projects written as standalone HTML pages
//! are loaded once, listed newest first, resolved by slug and rendered into
//! a small page shell, either as static files or from a development server.

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod server;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;

use content::{ContentClass, ContentSet, ContentSource, DirectorySource, Format, HtmlOptions, LoadState};

/// A site rooted at a directory holding `_config.yml`
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Site {
    /// Open the site in a directory; a missing `_config.yml` means defaults
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No _config.yml in {:?}, using defaults", base_dir);
            config::SiteConfig::default()
        };

        // Highlighter assets are given relative to the site
        let highlight = &mut config.highlight;
        for path in [&mut highlight.theme_file, &mut highlight.syntax_dir]
            .into_iter()
            .flatten()
        {
            if Path::new(path.as_str()).is_relative() {
                *path = base_dir.join(path.as_str()).to_string_lossy().into_owned();
            }
        }

        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            base_dir,
            public_dir,
        })
    }

    /// Directory sources of every class, in configured order
    pub fn sources(&self) -> Vec<Arc<dyn ContentSource>> {
        ContentClass::ALL
            .into_iter()
            .flat_map(|class| {
                self.config.class(class).dirs.iter().map(move |dir| {
                    Arc::new(DirectorySource::new(class, self.base_dir.join(dir)))
                        as Arc<dyn ContentSource>
                })
            })
            .collect()
    }

    /// Every class with its configured format
    pub fn classes(&self) -> Vec<(ContentClass, Format)> {
        ContentClass::ALL
            .into_iter()
            .map(|class| (class, self.config.class(class).format))
            .collect()
    }

    pub fn html_options(&self) -> HtmlOptions {
        HtmlOptions::new(
            &self.config.metadata_script_id,
            &self.config.highlight.stylesheet_pattern,
        )
    }

    /// Load the whole content set and wait for it
    pub async fn load(&self) -> Result<ContentSet> {
        let set =
            content::source::load_all(self.sources(), self.classes(), self.html_options()).await?;
        Ok(set)
    }

    /// Start loading the content set in the background
    pub fn spawn_load(&self) -> watch::Receiver<LoadState> {
        content::source::spawn_load(self.sources(), self.classes(), self.html_options())
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
