//! Generator module - writes the site as static HTML files

pub mod page;

use anyhow::Result;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::content::{BodyRenderer, Catalog, ContentClass, ContentSet, Resolved};
use crate::Site;

/// Static site generator
pub struct Generator {
    site: Site,
    renderer: BodyRenderer,
}

/// Counts of what one generation wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub listings: usize,
    pub entries: usize,
    pub highlighted: usize,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site) -> Self {
        Self {
            site: site.clone(),
            renderer: BodyRenderer::new(&site.config),
        }
    }

    pub fn with_renderer(mut self, renderer: BodyRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Generate the entire site
    pub async fn generate(&self, content: &ContentSet) -> Result<GenerateStats> {
        fs::create_dir_all(&self.site.public_dir)?;

        let mut stats = GenerateStats::default();
        let mut sections = Vec::new();

        for class in ContentClass::ALL {
            let catalog = content.catalog(class);
            self.generate_listing(class, &catalog)?;
            stats.listings += 1;

            let (entries, highlighted) = self.generate_entries(class, &catalog, content).await?;
            stats.entries += entries;
            stats.highlighted += highlighted;

            sections.push((class, catalog));
        }

        let html = page::index_page(&self.site.config, &sections);
        write_page(&self.site.public_dir.join("index.html"), &html)?;

        Ok(stats)
    }

    /// Generate the listing page of a class
    fn generate_listing(&self, class: ContentClass, catalog: &Catalog) -> Result<()> {
        let route = &self.site.config.class(class).route;
        let html = page::listing_page(&self.site.config, class, catalog);
        let output_path = self.site.public_dir.join(route).join("index.html");
        write_page(&output_path, &html)?;
        tracing::debug!("Generated listing: {:?}", output_path);
        Ok(())
    }

    /// Generate one detail page per catalog item
    async fn generate_entries(
        &self,
        class: ContentClass,
        catalog: &Catalog,
        content: &ContentSet,
    ) -> Result<(usize, usize)> {
        let route = &self.site.config.class(class).route;
        let mut seen = HashSet::new();
        let mut written = 0;
        let mut highlighted = 0;

        for item in catalog {
            if item.slug.is_empty() || !seen.insert(item.slug.as_str()) {
                tracing::warn!(
                    "Skipping {:?}: slug {:?} is empty or already taken",
                    item.path,
                    item.slug
                );
                continue;
            }

            let doc = match content.resolve(class, &item.slug) {
                Resolved::Found(doc) => doc,
                Resolved::NotFound => {
                    tracing::warn!("Catalog entry {:?} did not resolve", item.path);
                    continue;
                }
            };

            let rendered = self.renderer.render(&doc).await;
            highlighted += rendered.highlighted;

            let html =
                page::detail_page(&self.site.config, class, &item.slug, &doc.metadata, &rendered);
            let output_path = self
                .site
                .public_dir
                .join(route)
                .join(&item.slug)
                .join("index.html");
            write_page(&output_path, &html)
                .map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", output_path, e))?;
            tracing::debug!("Generated {}: {:?}", class.noun().to_lowercase(), output_path);
            written += 1;
        }

        tracing::info!("Generated {} {} pages", written, class);
        Ok((written, highlighted))
    }
}

fn write_page(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, html)?;
    Ok(())
}
