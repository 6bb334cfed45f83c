//! HTML helper functions

/// Generate a CSS link tag
///
/// # Examples
/// ```ignore
/// css("https://cdn.example.com/hljs.css") // -> <link rel="stylesheet" href="https://cdn.example.com/hljs.css">
/// ```
pub fn css(href: &str) -> String {
    format!(r#"<link rel="stylesheet" href="{}">"#, html_escape(href))
}

/// Generate an inline style element
pub fn style_tag(css: &str) -> String {
    // A literal `</style` would end the element early
    format!("<style>{}</style>", css.replace("</style", "<\\/style"))
}

/// Generate an anchor tag
///
/// # Examples
/// ```ignore
/// link_to("/blog/", "Blog", Some("nav-link")) // -> <a class="nav-link" href="/blog/">Blog</a>
/// ```
pub fn link_to(href: &str, text: &str, class: Option<&str>) -> String {
    match class {
        Some(class) => format!(
            r#"<a class="{}" href="{}">{}</a>"#,
            class,
            html_escape(href),
            html_escape(text)
        ),
        None => format!(r#"<a href="{}">{}</a>"#, html_escape(href), html_escape(text)),
    }
}

/// Generate meta generator tag
pub fn meta_generator() -> String {
    format!(
        r#"<meta name="generator" content="folio {}">"#,
        env!("CARGO_PKG_VERSION")
    )
}

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css() {
        assert_eq!(
            css("/a.css?v=1&x=2"),
            r#"<link rel="stylesheet" href="/a.css?v=1&amp;x=2">"#
        );
    }

    #[test]
    fn test_style_tag_cannot_close_early() {
        assert_eq!(style_tag("a{}</style><b>"), "<style>a{}<\\/style><b></style>");
    }

    #[test]
    fn test_link_to() {
        assert_eq!(link_to("/blog/", "A & B", None), r#"<a href="/blog/">A &amp; B</a>"#);
        assert!(link_to("/", "Home", Some("nav")).starts_with(r#"<a class="nav""#));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }
}
