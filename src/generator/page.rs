//! Minimal page shell around listings and rendered entries

use crate::config::SiteConfig;
use crate::content::catalog::title_from_slug;
use crate::content::{Catalog, ContentClass, ContentItem, Metadata, RenderedBody};
use crate::helpers::{
    css, html_escape, item_url, link_to, listing_url, meta_generator, style_tag, time_tag, url_for,
};

/// Wrap page content in the document shell
pub fn layout(config: &SiteConfig, title: &str, head: &str, main: &str) -> String {
    let page_title = if title.is_empty() || title == config.title {
        html_escape(&config.title)
    } else {
        format!("{} | {}", html_escape(title), html_escape(&config.title))
    };

    let nav = [&config.posts, &config.projects]
        .iter()
        .map(|class| {
            link_to(
                &listing_url(config, &class.route),
                &class.heading,
                Some("nav-link"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
{generator}
<title>{page_title}</title>
{head}
</head>
<body>
<nav class="navigation">
{home}
{nav}
</nav>
<main>
{main}
</main>
</body>
</html>
"#,
        generator = meta_generator(),
        home = link_to(&url_for(config, "/"), &config.title, Some("nav-home")),
    )
}

/// Home page linking both listings
pub fn index_page(config: &SiteConfig, sections: &[(ContentClass, Catalog)]) -> String {
    let mut main = format!(
        "<h1 class=\"home-title\">{}</h1>\n",
        html_escape(&config.title)
    );
    if !config.description.is_empty() {
        main.push_str(&format!(
            "<p class=\"home-description\">{}</p>\n",
            html_escape(&config.description)
        ));
    }

    for (class, catalog) in sections {
        let class_config = config.class(*class);
        main.push_str(&format!(
            "<section class=\"home-section\">\n<h2>{}</h2>\n{}</section>\n",
            link_to(
                &listing_url(config, &class_config.route),
                &class_config.heading,
                None
            ),
            item_list(config, *class, &catalog[..catalog.len().min(5)]),
        ));
    }

    layout(config, &config.title, "", &main)
}

/// Listing page of one class
pub fn listing_page(config: &SiteConfig, class: ContentClass, catalog: &Catalog) -> String {
    let class_config = config.class(class);
    let main = format!(
        "<h1 class=\"listing-title\">{}</h1>\n{}",
        html_escape(&class_config.heading),
        item_list(config, class, catalog)
    );
    layout(config, &class_config.heading, "", &main)
}

fn item_list(config: &SiteConfig, class: ContentClass, items: &[ContentItem]) -> String {
    if items.is_empty() {
        return format!(
            "<p class=\"listing-empty\">No {} yet.</p>\n",
            class.as_str()
        );
    }

    let route = &config.class(class).route;
    let mut html = String::from("<ul class=\"listing\">\n");
    for item in items {
        html.push_str("<li class=\"listing-item\">");
        html.push_str(&link_to(
            &item_url(config, route, &item.slug),
            &item.title,
            Some("listing-link"),
        ));
        if let Some(date) = &item.date {
            html.push(' ');
            html.push_str(&time_tag(date, "listing-date"));
        }
        if let Some(description) = &item.description {
            html.push_str(&format!(
                "<p class=\"listing-description\">{}</p>",
                html_escape(description)
            ));
        }
        html.push_str("</li>\n");
    }
    html.push_str("</ul>\n");
    html
}

/// Detail page of one rendered entry
pub fn detail_page(
    config: &SiteConfig,
    class: ContentClass,
    slug: &str,
    metadata: &Metadata,
    rendered: &RenderedBody,
) -> String {
    let class_config = config.class(class);
    let title = metadata
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| title_from_slug(slug));

    let mut head = String::new();
    if let Some(description) = &metadata.description {
        head.push_str(&format!(
            "<meta name=\"description\" content=\"{}\">\n",
            html_escape(description)
        ));
    }
    if let Some(stylesheet) = &rendered.stylesheet {
        head.push_str(&css(stylesheet));
        head.push('\n');
    }
    if let Some(styles) = &rendered.styles {
        head.push_str(&style_tag(styles));
        head.push('\n');
    }

    let date = metadata
        .date
        .as_deref()
        .map(|d| time_tag(d, "blog-post-date"))
        .unwrap_or_default();

    let main = format!(
        r#"<article class="blog-post-container">
<div class="blog-post-content">
{back}
<header class="mb-12">
<h1 class="blog-post-title">{title}</h1>
{date}
</header>
<div class="blog-post-body">
{body}
</div>
</div>
</article>"#,
        back = link_to(
            &listing_url(config, &class_config.route),
            &format!("\u{2190} Back to {}", class_config.heading),
            Some("blog-post-back-link"),
        ),
        title = html_escape(&title),
        body = rendered.html,
    );

    layout(config, &title, &head, &main)
}

/// Shown when a slug matches no entry
pub fn not_found_page(config: &SiteConfig, class: ContentClass) -> String {
    let message = format!("{} not found", class.noun());
    let main = format!(
        "<div class=\"state-message\">{}</div>\n{}",
        html_escape(&message),
        link_to(
            &listing_url(config, &config.class(class).route),
            &format!("\u{2190} Back to {}", config.class(class).heading),
            Some("blog-post-back-link"),
        )
    );
    layout(config, &message, "", &main)
}

/// Shown while the content set is still loading
pub fn loading_page(config: &SiteConfig) -> String {
    layout(
        config,
        "Loading",
        r#"<meta http-equiv="refresh" content="1">"#,
        "<div class=\"state-message\">Loading...</div>",
    )
}

/// Shown when the content set failed to load
pub fn load_failed_page(config: &SiteConfig) -> String {
    layout(
        config,
        "Unavailable",
        "",
        "<div class=\"state-message\">Content could not be loaded.</div>",
    )
}
