//! Greenrank Tools - external capabilities the evolution cycle calls into
//!
//! Tools are organized by category:
//! - completion: text-completion capability and the OpenAI-compatible client
//! - extract: delimiter and rank extraction from free-text responses
//! - metrics: ranking-quality metrics (NDCG, hit rate)
//! - template: placeholder substitution for request templates

pub mod completion;
pub mod extract;
pub mod metrics;
pub mod template;

pub use completion::{ChatClient, CompletionError, CompletionModel, CompletionResult};
pub use extract::{extract_delimited, extract_rank, wrap_delimited, END_MARKER, START_MARKER};
pub use metrics::{hit_at, ndcg, ndcg_at};
pub use template::fill_template;
