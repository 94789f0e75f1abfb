//! Greenrank Core Library
//!
//! Feedback-driven evolution of ranking prompts for sustainable product
//! recommendation.

pub mod config;
pub mod dataset;
pub mod evaluation;
pub mod evolve;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types for convenience
pub use config::Config;
pub use dataset::{Dataset, Example};
pub use evaluation::{evaluate_prompt, EvaluationReport};
pub use evolve::{BanditSelector, EvolveConfig, Optimizer, SEED_PROMPT};
