//! Route handlers for the uiforge API.

pub mod cache;
pub mod generate;
pub mod health;
pub mod metrics;
pub mod prompt;
pub mod validate;
pub mod vectors;
