//! Date helper functions

use chrono::NaiveDateTime;

use crate::content::frontmatter::parse_date_string;

/// Format date in full format (like "January 1, 2024")
pub fn full_date(date: &NaiveDateTime) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Human-readable form of an authored date; unparseable dates are shown
/// as written
pub fn display_date(raw: &str) -> String {
    parse_date_string(raw)
        .map(|d| full_date(&d))
        .unwrap_or_else(|| raw.trim().to_string())
}

/// Generate a <time> HTML element
pub fn time_tag(raw: &str, class: &str) -> String {
    format!(
        r#"<time class="{}" datetime="{}">{}</time>"#,
        class,
        super::html_escape(raw.trim()),
        super::html_escape(&display_date(raw))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_date() {
        let date = parse_date_string("2024-01-05 10:30:00").unwrap();
        assert_eq!(full_date(&date), "January 5, 2024");
    }

    #[test]
    fn test_display_date_falls_back_to_raw() {
        assert_eq!(display_date("2024-01-01"), "January 1, 2024");
        assert_eq!(display_date(" Spring 2021 "), "Spring 2021");
    }

    #[test]
    fn test_time_tag() {
        assert_eq!(
            time_tag("2024-03-09", "blog-post-date"),
            r#"<time class="blog-post-date" datetime="2024-03-09">March 9, 2024</time>"#
        );
    }
}
