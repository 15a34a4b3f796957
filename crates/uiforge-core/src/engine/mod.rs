//! The generation engine.
//!
//! Two paths share the same value types, response parsing, validation, and
//! merging rules: [`chained`] decomposes a request into the fixed 11-stage
//! pipeline; [`single`] runs one composite call for prototypes.

pub mod chained;
pub mod plan;
pub mod single;
pub mod stages;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use crate::llm::envelope::GeneratedFile;

use crate::image::ImageAttachment;
use crate::llm::envelope::Envelope;
use crate::stack::TechStack;

/// A validated, sanitized generation request.
///
/// The HTTP surface performs validation and sanitization; by the time a
/// request reaches the engine its description is clean, its stack parsed,
/// and its image decoded.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The mockup image, when one was supplied.
    pub image: Option<ImageAttachment>,
    /// Sanitized natural-language description.
    pub description: String,
    /// The stack configuration.
    pub stack: TechStack,
    /// Slug-safe project name.
    pub project_name: String,
    /// Optional system-prompt override (single-stage path only).
    pub custom_prompt: Option<String>,
}

/// The envelope the engine returns to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Whether the generation produced usable output.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Informational directory → children mapping.
    pub project_structure: BTreeMap<String, Vec<String>>,
    /// Generated files, first-occurrence order, paths unique.
    pub files: Vec<GeneratedFile>,
    /// Package specifiers keyed by subsystem.
    pub dependencies: BTreeMap<String, Vec<String>>,
    /// Ordered setup steps; advisories are prepended here.
    pub setup_instructions: Vec<String>,
    /// Populated on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

/// Accumulates per-stage envelopes into one response, enforcing path
/// uniqueness with first-write-wins semantics.
#[derive(Debug, Default)]
pub(crate) struct ResponseAccumulator {
    files: Vec<GeneratedFile>,
    dependencies: BTreeMap<String, Vec<String>>,
    setup_instructions: Vec<String>,
    project_structure: BTreeMap<String, Vec<String>>,
    duplicate_paths: usize,
}

impl ResponseAccumulator {
    /// Fold one stage envelope in. Returns how many duplicate paths were
    /// dropped from this envelope.
    pub(crate) fn absorb(&mut self, envelope: Envelope) -> usize {
        let mut dropped = 0;
        for file in envelope.files {
            if self.files.iter().any(|f| f.path == file.path) {
                tracing::debug!(path = %file.path, "dropping duplicate path (first write wins)");
                dropped += 1;
                continue;
            }
            self.files.push(file);
        }
        self.duplicate_paths += dropped;

        for (subsystem, packages) in envelope.dependencies {
            let entry = self.dependencies.entry(subsystem).or_default();
            for package in packages {
                if !entry.contains(&package) {
                    entry.push(package);
                }
            }
        }

        self.setup_instructions.extend(envelope.setup_instructions);

        for (dir, children) in envelope.project_structure {
            let entry = self.project_structure.entry(dir).or_default();
            for child in children {
                if !entry.contains(&child) {
                    entry.push(child);
                }
            }
        }

        dropped
    }

    pub(crate) fn duplicate_paths(&self) -> usize {
        self.duplicate_paths
    }

    pub(crate) fn file_count(&self) -> usize {
        self.files.len()
    }

    pub(crate) fn files(&self) -> &[GeneratedFile] {
        &self.files
    }

    /// Finish into a response; `advisories` are prepended to the collected
    /// setup instructions in order.
    pub(crate) fn finish(
        self,
        success: bool,
        message: String,
        advisories: Vec<String>,
    ) -> GenerationResponse {
        let mut setup_instructions = advisories;
        setup_instructions.extend(self.setup_instructions);

        GenerationResponse {
            success,
            message,
            project_structure: self.project_structure,
            files: self.files,
            dependencies: self.dependencies,
            setup_instructions,
            error_details: None,
        }
    }
}
