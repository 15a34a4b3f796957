//! Core library for uiforge — a mockup-to-project generation service.
//!
//! Contains the generation engine (single and 11-stage chained pipelines),
//! prompt assembly, the tech-stack template registry, the multimodal LLM
//! client, syntax validation, and the cross-cutting request infrastructure
//! (cache, rate limiting, metrics, sanitization) the HTTP surface composes.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod image;
pub mod llm;
pub mod metrics;
pub mod prompt;
pub mod ratelimit;
pub mod sanitize;
pub mod stack;
pub mod validate;
pub mod vector;

pub use error::*;

/// Returns the version of the uiforge-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
