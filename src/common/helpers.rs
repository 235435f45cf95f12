// Helper functions for safe logging and text handling

use regex::Regex;
use std::sync::OnceLock;

/// Masks email addresses for safe logging
///
/// # Example
/// ```ignore
/// let masked = safe_email_log("user@example.com");
/// // Returns: "u***@example.com"
/// ```
pub fn safe_email_log(email: &str) -> String {
    if email.len() > 3 {
        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() == 2 && !parts[0].is_empty() {
            let first: String = parts[0].chars().take(1).collect();
            format!("{}***@{}", first, parts[1])
        } else {
            "***@***.***".to_string()
        }
    } else {
        "***@***.***".to_string()
    }
}

/// Returns at most `max_chars` characters of `text`, never splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Parses a JSON column, yielding `{}` for NULL or malformed content
pub fn parse_json_column(raw: Option<&str>) -> serde_json::Value {
    raw.and_then(|s| serde_json::from_str::<serde_json::Value>(s).ok())
        .filter(|v| !v.is_null())
        .unwrap_or_else(|| serde_json::json!({}))
}

/// Escapes text for inclusion in HTML element content or attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Reduces an uploaded file name to ASCII letters, digits, `_`, `-` and
/// `.`, with no path components. Empty when nothing usable is left.
pub fn secure_filename(filename: &str) -> String {
    let flattened: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();

    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").unwrap_or_else(|_| unreachable!("static regex")))
}

/// Plain text from generated HTML: block ends become newlines, tags are
/// dropped and the entities produced by [`escape_html`] are decoded
pub fn html_to_text(html: &str) -> String {
    let mut text = html.to_string();
    for block_end in ["</h1>", "</h2>", "</h3>", "</p>", "</li>", "</div>", "<br>", "<br/>"] {
        text = text.replace(block_end, "\n");
    }
    let stripped = tag_regex().replace_all(&text, "");
    let decoded = stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&amp;", "&");

    decoded
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_email_log_masks_local_part() {
        assert_eq!(safe_email_log("user@example.com"), "u***@example.com");
        assert_eq!(safe_email_log("bad"), "***@***.***");
        assert_eq!(safe_email_log("no-at-sign"), "***@***.***");
    }

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("short", 200), "short");
    }

    #[test]
    fn test_parse_json_column_defaults_to_empty_object() {
        assert_eq!(parse_json_column(None), serde_json::json!({}));
        assert_eq!(parse_json_column(Some("not json")), serde_json::json!({}));
        assert_eq!(parse_json_column(Some("null")), serde_json::json!({}));
        assert_eq!(
            parse_json_column(Some(r#"{"skills":["rust"]}"#))["skills"][0],
            "rust"
        );
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & Jerry's</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; Jerry&#x27;s&lt;/b&gt;"
        );
    }

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("My Resume (final).pdf"), "My_Resume_final.pdf");
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("C:\\Users\\cv.docx"), "C_Users_cv.docx");
        assert_eq!(secure_filename("résumé.txt"), "rsum.txt");
        assert_eq!(secure_filename("..."), "");
    }

    #[test]
    fn test_html_to_text() {
        let html = "<h2>Skills</h2><ul><li>Rust &amp; Go</li><li>&lt;SQL&gt;</li></ul><p>Done</p>";
        assert_eq!(html_to_text(html), "Skills\nRust & Go\n<SQL>\nDone");
    }
}
