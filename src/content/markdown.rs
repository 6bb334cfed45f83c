//! Markdown rendering with a fixed class per construct

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag};

use crate::helpers::html_escape;

/// Markdown renderer mapping each supported construct to one class
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer;

/// Image collected while its alt text is being read
struct PendingImage {
    src: String,
    title: String,
    alt: String,
    depth: usize,
}

impl PendingImage {
    fn into_html(self) -> String {
        let title = if self.title.is_empty() {
            String::new()
        } else {
            format!(r#" title="{}""#, html_escape(&self.title))
        };
        format!(
            r#"<img class="blog-post-img" src="{}" alt="{}"{} />"#,
            html_escape(&self.src),
            html_escape(&self.alt),
            title
        )
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> String {
        // Front-matter is split off before rendering, so no metadata blocks
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        // Closing markup for every open tag; None when the tag was passed through
        let mut closers: Vec<Option<&'static str>> = Vec::new();
        let mut image: Option<PendingImage> = None;

        for event in parser {
            if let Some(pending) = image.as_mut() {
                match event {
                    Event::End(_) if pending.depth == 0 => {
                        if let Some(done) = image.take() {
                            events.push(Event::Html(CowStr::from(done.into_html())));
                        }
                    }
                    Event::Start(_) => pending.depth += 1,
                    Event::End(_) => pending.depth -= 1,
                    Event::Text(text) | Event::Code(text) => pending.alt.push_str(&text),
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::Image {
                    dest_url, title, ..
                }) => {
                    image = Some(PendingImage {
                        src: dest_url.to_string(),
                        title: title.to_string(),
                        alt: String::new(),
                        depth: 0,
                    });
                }
                Event::Start(tag) => match open_tag(&tag) {
                    Some((open, close)) => {
                        closers.push(Some(close));
                        events.push(Event::Html(CowStr::from(open)));
                    }
                    None => {
                        closers.push(None);
                        events.push(Event::Start(tag));
                    }
                },
                Event::End(end) => match closers.pop() {
                    Some(Some(close)) => events.push(Event::Html(CowStr::Borrowed(close))),
                    _ => events.push(Event::End(end)),
                },
                Event::Code(code) => {
                    events.push(Event::Html(CowStr::from(format!(
                        r#"<code class="blog-post-inline-code">{}</code>"#,
                        html_escape(&code)
                    ))));
                }
                Event::Rule => {
                    events.push(Event::Html(CowStr::Borrowed(
                        "<hr class=\"blog-post-hr\" />\n",
                    )));
                }
                other => events.push(other),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        html_output
    }
}

/// Opening markup and closing markup for a styled tag
fn open_tag(tag: &Tag<'_>) -> Option<(String, &'static str)> {
    let styled = match tag {
        Tag::Heading {
            level, id, classes, ..
        } => {
            let (name, close) = match level {
                HeadingLevel::H1 => ("h1", "</h1>\n"),
                HeadingLevel::H2 => ("h2", "</h2>\n"),
                HeadingLevel::H3 => ("h3", "</h3>\n"),
                HeadingLevel::H4 => ("h4", "</h4>\n"),
                _ => return None,
            };
            let mut open = format!(r#"<{} class="blog-post-{}"#, name, name);
            for class in classes {
                open.push(' ');
                open.push_str(&html_escape(class));
            }
            open.push('"');
            if let Some(id) = id {
                open.push_str(&format!(r#" id="{}""#, html_escape(id)));
            }
            open.push('>');
            (open, close)
        }
        Tag::Paragraph => (r#"<p class="blog-post-p">"#.to_string(), "</p>\n"),
        Tag::List(None) => ("<ul class=\"blog-post-ul\">\n".to_string(), "</ul>\n"),
        Tag::List(Some(1)) => ("<ol class=\"blog-post-ol\">\n".to_string(), "</ol>\n"),
        Tag::List(Some(start)) => (
            format!("<ol class=\"blog-post-ol\" start=\"{}\">\n", start),
            "</ol>\n",
        ),
        Tag::Item => (r#"<li class="blog-post-li">"#.to_string(), "</li>\n"),
        Tag::BlockQuote(_) => (
            "<blockquote class=\"blog-post-blockquote\">\n".to_string(),
            "</blockquote>\n",
        ),
        Tag::CodeBlock(kind) => {
            let lang = match kind {
                CodeBlockKind::Fenced(info) => info.split_whitespace().next().unwrap_or(""),
                CodeBlockKind::Indented => "",
            };
            let class = if lang.is_empty() {
                "blog-post-code".to_string()
            } else {
                format!("blog-post-code language-{}", html_escape(lang))
            };
            (
                format!(r#"<pre class="blog-post-pre"><code class="{}">"#, class),
                "</code></pre>\n",
            )
        }
        Tag::Link {
            dest_url, title, ..
        } => {
            let title = if title.is_empty() {
                String::new()
            } else {
                format!(r#" title="{}""#, html_escape(title))
            };
            (
                format!(
                    r#"<a class="blog-post-link" href="{}"{}>"#,
                    html_escape(dest_url),
                    title
                ),
                "</a>",
            )
        }
        _ => return None,
    };

    Some(styled)
}
