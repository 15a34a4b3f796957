//! Input sanitization for user-supplied text.
//!
//! Descriptions are stripped of null bytes, clamped to a length cap, and
//! scanned for a small fixed set of known script-injection patterns which are
//! elided (not rejected) with a warning log.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::RequestError;

/// Minimum description length (characters) after sanitization.
pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// Maximum description length (characters); the tail beyond this is dropped.
pub const MAX_DESCRIPTION_CHARS: usize = 10_000;

fn script_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b[^>]*>.*?</script>|<script\b[^>]*/?>")
            .expect("script tag regex must compile")
    })
}

fn event_handler_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\bon[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#)
            .expect("event handler regex must compile")
    })
}

fn js_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)javascript\s*:").expect("javascript url regex must compile"))
}

/// Sanitize a description: strip null bytes, elide script patterns, clamp length.
///
/// Elision is deliberate — a description mentioning `<script>` in prose should
/// not fail the whole request, but the raw pattern never reaches a prompt.
pub fn sanitize_description(input: &str) -> String {
    let without_nulls: String = input.chars().filter(|c| *c != '\0').collect();

    let mut cleaned = without_nulls;
    for (re, label) in [
        (script_tag_re(), "script tag"),
        (event_handler_re(), "event handler"),
        (js_url_re(), "javascript url"),
    ] {
        if re.is_match(&cleaned) {
            tracing::warn!(pattern = label, "elided suspicious pattern from description");
            cleaned = re.replace_all(&cleaned, "").into_owned();
        }
    }

    let trimmed = cleaned.trim();
    if trimmed.chars().count() > MAX_DESCRIPTION_CHARS {
        trimmed.chars().take(MAX_DESCRIPTION_CHARS).collect()
    } else {
        trimmed.to_string()
    }
}

/// Sanitize and enforce the minimum-length rule in one step.
pub fn clean_description(input: &str) -> Result<String, RequestError> {
    let cleaned = sanitize_description(input);
    let length = cleaned.chars().count();
    if length < MIN_DESCRIPTION_CHARS {
        return Err(RequestError::DescriptionTooShort {
            length,
            minimum: MIN_DESCRIPTION_CHARS,
        });
    }
    Ok(cleaned)
}

/// Derive a slug-safe project name from free text.
///
/// Lowercases, maps runs of non-alphanumerics to single hyphens, and caps the
/// result at 48 characters. Falls back to `generated-project` when nothing
/// usable remains.
pub fn slugify(input: &str) -> String {
    let mut slug = String::new();
    let mut last_was_hyphen = true; // suppress a leading hyphen

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
        if slug.len() >= 48 {
            break;
        }
    }

    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "generated-project".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_null_bytes() {
        assert_eq!(
            sanitize_description("task\0 manager\0 app xy"),
            "task manager app xy"
        );
    }

    #[test]
    fn elides_script_tags() {
        let out = sanitize_description("a dashboard <script>alert(1)</script> with charts");
        assert!(!out.contains("<script"));
        assert!(!out.contains("alert(1)"));
        assert!(out.contains("a dashboard"));
        assert!(out.contains("with charts"));
    }

    #[test]
    fn elides_unclosed_script_tag() {
        let out = sanitize_description("hello <script src='x.js'> world of dashboards");
        assert!(!out.contains("<script"));
    }

    #[test]
    fn elides_event_handlers() {
        let out = sanitize_description("an image gallery onerror=\"alert(1)\" with thumbnails");
        assert!(!out.contains("onerror"));
    }

    #[test]
    fn elides_javascript_urls() {
        let out = sanitize_description("a link list javascript:alert(1) with previews");
        assert!(!out.contains("javascript:"));
    }

    #[test]
    fn prose_is_untouched() {
        let input = "A kanban board with drag-and-drop columns and user avatars.";
        assert_eq!(sanitize_description(input), input);
    }

    #[test]
    fn clamps_to_max_length() {
        let input = "x".repeat(MAX_DESCRIPTION_CHARS + 500);
        assert_eq!(
            sanitize_description(&input).chars().count(),
            MAX_DESCRIPTION_CHARS
        );
    }

    #[test]
    fn clean_description_rejects_short_input() {
        let err = clean_description("tiny").unwrap_err();
        match err {
            RequestError::DescriptionTooShort { length, minimum } => {
                assert_eq!(length, 4);
                assert_eq!(minimum, MIN_DESCRIPTION_CHARS);
            }
            other => panic!("expected DescriptionTooShort, got: {other}"),
        }
    }

    #[test]
    fn clean_description_rejects_input_short_after_elision() {
        // Long enough raw, but mostly a script tag.
        let err = clean_description("ok <script>alert('xssxssxss')</script>").unwrap_err();
        assert!(matches!(err, RequestError::DescriptionTooShort { .. }));
    }

    #[test]
    fn slugify_basic() {
        assert_eq!(
            slugify("Task Manager with Auth!"),
            "task-manager-with-auth"
        );
    }

    #[test]
    fn slugify_collapses_punctuation_runs() {
        assert_eq!(slugify("a --- b___c"), "a-b-c");
    }

    #[test]
    fn slugify_empty_falls_back() {
        assert_eq!(slugify("!!!"), "generated-project");
    }

    #[test]
    fn slugify_caps_length() {
        let long = "word ".repeat(30);
        assert!(slugify(&long).len() <= 48);
    }
}
