//! Render a single entry

use anyhow::Result;

use crate::content::{BodyRenderer, ContentClass, ContentSet, Resolved};
use crate::generator::page;
use crate::Site;

/// Print the rendered page of one entry
pub async fn run(site: &Site, class: ContentClass, slug: &str, body_only: bool) -> Result<()> {
    let content = site.load().await?;
    let renderer = BodyRenderer::new(&site.config);

    match render(site, &content, &renderer, class, slug, body_only).await {
        Some(html) => {
            println!("{}", html);
            Ok(())
        }
        None => anyhow::bail!("{} not found: {}", class.noun(), slug),
    }
}

/// Resolve and render an entry; `None` when the slug matches nothing
pub async fn render(
    site: &Site,
    content: &ContentSet,
    renderer: &BodyRenderer,
    class: ContentClass,
    slug: &str,
    body_only: bool,
) -> Option<String> {
    let doc = match content.resolve(class, slug) {
        Resolved::Found(doc) => doc,
        Resolved::NotFound => return None,
    };

    let rendered = renderer.render(&doc).await;
    tracing::debug!(
        "Rendered {} {:?} with the {} policy",
        class.noun().to_lowercase(),
        slug,
        renderer.policy_name()
    );

    if body_only {
        Some(rendered.html)
    } else {
        Some(page::detail_page(
            &site.config,
            class,
            slug,
            &doc.metadata,
            &rendered,
        ))
    }
}
