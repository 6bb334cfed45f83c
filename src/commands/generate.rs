//! Generate static files

use anyhow::Result;

use crate::generator::Generator;
use crate::Site;

/// Load all content and write the static site
pub async fn run(site: &Site) -> Result<()> {
    let start = std::time::Instant::now();

    let content = site.load().await?;
    let stats = Generator::new(site).generate(&content).await?;

    tracing::info!(
        "Generated {} listings and {} entries ({} code blocks highlighted) in {:.2}s",
        stats.listings,
        stats.entries,
        stats.highlighted,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
