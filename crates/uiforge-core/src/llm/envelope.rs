//! The JSON response envelope contract and its recovery chain.
//!
//! Model output is not trusted to be clean JSON. Extraction strips fenced
//! code delimiters, locates the first balanced top-level object when the body
//! carries a preamble, and applies conservative repairs (trailing commas,
//! typographic quotes) before giving up. Repair never invents content; on
//! ambiguity the caller falls back to empty-stage semantics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// One generated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    /// POSIX-style relative path, unique within a response.
    pub path: String,
    /// Full file contents.
    pub content: String,
    /// Short free-text annotation.
    #[serde(default)]
    pub description: String,
}

/// The envelope every successful LLM call must return.
///
/// `files` is the only semantically mandatory field; all others default to
/// empty. A well-formed object without `files` parses as an empty stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    /// Generated files, insertion order preserved.
    #[serde(default)]
    pub files: Vec<GeneratedFile>,
    /// Package specifiers keyed by subsystem (frontend/backend/database).
    #[serde(default)]
    pub dependencies: BTreeMap<String, Vec<String>>,
    /// Ordered setup steps.
    #[serde(default)]
    pub setup_instructions: Vec<String>,
    /// Informational directory → children mapping.
    #[serde(default)]
    pub project_structure: BTreeMap<String, Vec<String>>,
}

impl Envelope {
    /// Parse an envelope out of raw model text via the recovery chain.
    pub fn from_text(text: &str) -> Result<Self, LlmError> {
        let value = extract_json(text)?;
        serde_json::from_value(value).map_err(|e| LlmError::Envelope(e.to_string()))
    }
}

/// Extract the first JSON object from raw model text.
///
/// Recovery chain: strip whitespace and code fences → take the first balanced
/// top-level `{…}` → strict parse → conservative repair → one retry.
pub fn extract_json(text: &str) -> Result<serde_json::Value, LlmError> {
    let stripped = strip_fences(text.trim());

    let candidate = balanced_object(stripped)
        .ok_or_else(|| LlmError::Envelope("no JSON object found in response".to_string()))?;

    match serde_json::from_str(candidate) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            let repaired = repair(candidate);
            serde_json::from_str(&repaired)
                .map_err(|_| LlmError::Envelope(format!("unparseable after repair: {first_err}")))
        }
    }
}

/// Strip leading/trailing fenced-code delimiters (```json … ```).
fn strip_fences(text: &str) -> &str {
    let mut s = text;
    if s.starts_with("```") {
        // Drop the fence line (which may carry a language tag).
        s = match s.find('\n') {
            Some(idx) => &s[idx + 1..],
            None => "",
        };
    }
    let s = s.trim_end();
    s.strip_suffix("```").map_or(s, str::trim_end)
}

/// Locate the first balanced top-level `{…}` substring.
///
/// Tracks string and escape state so braces inside string literals do not
/// affect the depth count. Returns `None` when no opening brace exists or the
/// object never closes.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Conservative syntactic repairs: typographic quotes to ASCII, trailing
/// commas removed outside string literals. Content is never invented.
fn repair(text: &str) -> String {
    let requoted: String = text
        .chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect();

    strip_trailing_commas(&requoted)
}

/// Remove commas that directly precede a closing `}` or `]`, ignoring
/// commas inside string literals.
fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '}' | ']' => {
                // Drop a comma (plus trailing whitespace) left dangling
                // before this closer.
                let trimmed_len = out.trim_end().len();
                if out[..trimmed_len].ends_with(',') {
                    out.truncate(trimmed_len - 1);
                }
                out.push(c);
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_envelope_parses() {
        let text = r#"{"files":[{"path":"src/main.py","content":"print('hi')","description":"entry"}],"setup_instructions":["run it"]}"#;
        let env = Envelope::from_text(text).unwrap();
        assert_eq!(env.files.len(), 1);
        assert_eq!(env.files[0].path, "src/main.py");
        assert_eq!(env.setup_instructions, vec!["run it"]);
    }

    #[test]
    fn fenced_envelope_parses() {
        let text = "```json\n{\"files\":[]}\n```";
        let env = Envelope::from_text(text).unwrap();
        assert!(env.files.is_empty());
    }

    #[test]
    fn fence_without_language_tag() {
        let text = "```\n{\"files\":[]}\n```";
        assert!(Envelope::from_text(text).is_ok());
    }

    #[test]
    fn preamble_is_skipped() {
        let text = "Sure! Here is the generated project:\n\n{\"files\":[{\"path\":\"a.js\",\"content\":\"1\"}]}\n\nLet me know if you need more.";
        let env = Envelope::from_text(text).unwrap();
        assert_eq!(env.files[0].path, "a.js");
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_extraction() {
        let text = r#"{"files":[{"path":"a.css","content":"body { color: red; }"}]}"#;
        let env = Envelope::from_text(text).unwrap();
        assert_eq!(env.files[0].content, "body { color: red; }");
    }

    #[test]
    fn escaped_quotes_inside_strings() {
        let text = r#"{"files":[{"path":"a.js","content":"console.log(\"}\")"}]}"#;
        let env = Envelope::from_text(text).unwrap();
        assert_eq!(env.files[0].content, r#"console.log("}")"#);
    }

    #[test]
    fn trailing_comma_is_repaired() {
        let text = r#"{"files":[{"path":"a.js","content":"x",}],}"#;
        let env = Envelope::from_text(text).unwrap();
        assert_eq!(env.files.len(), 1);
    }

    #[test]
    fn typographic_quotes_are_repaired() {
        let text = "{\u{201C}files\u{201D}:[]}";
        let env = Envelope::from_text(text).unwrap();
        assert!(env.files.is_empty());
    }

    #[test]
    fn comma_inside_string_survives_repair() {
        let text = r#"{"files":[{"path":"a.txt","content":"a, ]",}]}"#;
        let env = Envelope::from_text(text).unwrap();
        assert_eq!(env.files[0].content, "a, ]");
    }

    #[test]
    fn missing_files_field_defaults_empty() {
        let env = Envelope::from_text(r#"{"setup_instructions":["x"]}"#).unwrap();
        assert!(env.files.is_empty());
    }

    #[test]
    fn non_json_fails_typed() {
        let err = Envelope::from_text("I could not generate anything, sorry.").unwrap_err();
        assert!(matches!(err, LlmError::Envelope(_)));
    }

    #[test]
    fn unclosed_object_fails() {
        let err = Envelope::from_text(r#"{"files":[{"path":"a""#).unwrap_err();
        assert!(matches!(err, LlmError::Envelope(_)));
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "noise {\"files\":[]} more noise";
        let a = extract_json(text).unwrap();
        let b = extract_json(text).unwrap();
        assert_eq!(a, b);
    }
}
