/// Cleans editor HTML before it is stored, keeping formatting tags and
/// dropping scripts, event handlers and other unsafe markup.
pub fn sanitize_html(html: &str) -> String {
    ammonia::clean(html)
}

/// Same as `sanitize_html`, for optional rich-text fields.
pub fn sanitize_optional_html(html: Option<&str>) -> Option<String> {
    html.filter(|h| !h.trim().is_empty()).map(sanitize_html)
}

/// Words in the rendered text of an HTML fragment.
pub fn word_count(html: &str) -> usize {
    match html2text::from_read(html.as_bytes(), 10_000) {
        Ok(text) => text.split_whitespace().count(),
        Err(e) => {
            tracing::warn!("Could not render html for word count: {}", e);
            html.split_whitespace().count()
        }
    }
}

/// Estimated reading time in minutes at 200 words per minute, never below one.
pub fn reading_time_minutes(html: &str) -> i64 {
    let minutes = (word_count(html) as f64 / 200.0).round() as i64;
    minutes.max(1)
}

/// Extracts the 11-character video id from the usual YouTube URL shapes
/// (`watch?v=`, `youtu.be/`, `embed/`, `v/`). Returns `None` for anything else.
pub fn youtube_id(url: &str) -> Option<String> {
    const MARKERS: [&str; 5] = ["watch?v=", "&v=", "youtu.be/", "embed/", "v/"];

    MARKERS.iter().find_map(|marker| {
        let start = url.find(marker)? + marker.len();
        let id: String = url[start..]
            .chars()
            .take_while(|c| !matches!(c, '#' | '&' | '?' | '/'))
            .collect();
        (id.chars().count() == 11).then_some(id)
    })
}

/// Empty strings from HTML forms mean "no value".
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_tags() {
        let cleaned = sanitize_html("<p>Xin chào</p><script>alert(1)</script>");
        assert!(cleaned.contains("<p>Xin chào</p>"));
        assert!(!cleaned.contains("script"));
    }

    #[test]
    fn blank_optional_html_is_none() {
        assert_eq!(sanitize_optional_html(Some("   ")), None);
        assert_eq!(sanitize_optional_html(None), None);
    }

    #[test]
    fn reading_time_has_one_minute_floor() {
        assert_eq!(reading_time_minutes("<p>ngắn</p>"), 1);
        assert_eq!(reading_time_minutes(""), 1);
    }

    #[test]
    fn reading_time_rounds_word_count() {
        let body = format!("<p>{}</p>", vec!["từ"; 500].join(" "));
        assert_eq!(reading_time_minutes(&body), 3);
    }

    #[test]
    fn youtube_ids_from_common_urls() {
        assert_eq!(
            youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            youtube_id("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            youtube_id("https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn non_youtube_urls_have_no_id() {
        assert_eq!(youtube_id("https://vimeo.com/123456"), None);
        assert_eq!(youtube_id("https://youtu.be/short"), None);
    }

    #[test]
    fn non_empty_drops_blank_strings() {
        assert_eq!(non_empty(Some("".to_string())), None);
        assert_eq!(non_empty(Some("/uploads/a.png".to_string())).as_deref(), Some("/uploads/a.png"));
    }
}
