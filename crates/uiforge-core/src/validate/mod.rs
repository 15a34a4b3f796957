//! Advisory syntax validation of generated files.
//!
//! Each file is checked against a minimal well-formedness heuristic for its
//! declared language, dispatched on the path extension. The check is
//! non-blocking: the engine surfaces results as an advisory line in
//! `setup_instructions` but still returns every generated file — a
//! false-positive language check must never discard otherwise valuable
//! output.
//!
//! Python files get a real AST parse and JSON a strict decode; the JS/HTML/
//! CSS checks are deliberately weak heuristics (delimiter balance, not
//! parsing). See [`lang`] for the per-language scanners.

pub mod lang;

use serde::{Deserialize, Serialize};

use crate::llm::envelope::GeneratedFile;

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Path of the offending file.
    pub path: String,
    /// What the scanner objected to.
    pub message: String,
}

/// The result of validating a file list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True when no checked file produced an issue.
    pub valid: bool,
    /// Total files submitted.
    pub total_files: usize,
    /// Files whose extension had a registered checker.
    pub validated_files: usize,
    /// Issues found, in submission order.
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// The advisory line prepended to `setup_instructions` when issues exist.
    pub fn advisory(&self) -> Option<String> {
        if self.valid {
            None
        } else {
            let paths: Vec<&str> = self.errors.iter().map(|e| e.path.as_str()).collect();
            Some(format!(
                "Note: {} of {} checked files failed syntax validation ({}); review before running.",
                self.errors.len(),
                self.validated_files,
                paths.join(", "),
            ))
        }
    }
}

/// Validate every file, dispatching on extension.
///
/// Unknown extensions pass without check. Running this twice over the same
/// input yields an identical report.
pub fn validate_files(files: &[GeneratedFile]) -> ValidationReport {
    let mut validated_files = 0;
    let mut errors = Vec::new();

    for file in files {
        let Some(check) = checker_for(&file.path) else {
            continue;
        };
        validated_files += 1;
        if let Err(message) = check(&file.content) {
            errors.push(ValidationIssue {
                path: file.path.clone(),
                message,
            });
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        total_files: files.len(),
        validated_files,
        errors,
    }
}

type Checker = fn(&str) -> Result<(), String>;

/// Pick the scanner for a path, by extension.
fn checker_for(path: &str) -> Option<Checker> {
    let ext = path.rsplit('.').next()?.to_lowercase();
    match ext.as_str() {
        "py" => Some(lang::scan_python),
        "js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs" => Some(lang::scan_js),
        "json" => Some(lang::scan_json),
        "html" | "htm" => Some(lang::scan_html),
        "css" => Some(lang::scan_css),
        _ => None,
    }
}
