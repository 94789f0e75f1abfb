//! Diagnoses why a prompt failed on a session

use greenrank_tools::{extract_delimited, fill_template, CompletionModel, CompletionResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Attempts before giving up on a diagnosis
pub const MAX_REASON_ATTEMPTS: usize = 3;

pub const REASON_PROMPT: &str = "I'm developing a zero-shot recommender prompt for an eco-friendly product recommendation system.\n\
My current prompt is \"{prompt}\"\n\
However, this prompt failed to properly recommend sustainable products for this user interaction: {error_case}\n\
Provide {num_feedbacks} reasons why the prompt may have failed to capture the user's environmental consciousness or sustainability preferences.\n\
Wrap each reason with <START> and <END>";

pub fn format_reason_prompt(prompt: &str, error_case: &str, num_feedbacks: usize) -> String {
    fill_template(
        REASON_PROMPT,
        &[
            ("prompt", prompt),
            ("error_case", error_case),
            ("num_feedbacks", &num_feedbacks.to_string()),
        ],
    )
}

/// Split a diagnosis into reasons. Falls back to the whole text as one
/// reason when no delimited segment is found.
pub fn parse_reasons(raw: &str) -> Vec<String> {
    let reasons: Vec<String> = extract_delimited(raw)
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect();

    if reasons.is_empty() {
        vec![raw.trim().to_string()]
    } else {
        reasons
    }
}

#[derive(Clone)]
pub struct ReasonInferencer {
    model: Arc<dyn CompletionModel>,
}

impl ReasonInferencer {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    /// Up to [`MAX_REASON_ATTEMPTS`] requests; the first one with text wins.
    /// `None` when every attempt came back empty.
    pub async fn request_with_retry(&self, request: &str) -> Option<String> {
        for attempt in 1..=MAX_REASON_ATTEMPTS {
            match self.model.complete(request).await {
                CompletionResult::Success(text) if !text.trim().is_empty() => return Some(text),
                _ => warn!(
                    "Attempt {}/{}: failed to get reasons, retrying...",
                    attempt, MAX_REASON_ATTEMPTS
                ),
            }
        }
        None
    }

    /// Reasons the prompt failed on `error_case`. Aims for `num_feedbacks`
    /// entries but returns whatever the model produced; empty only when
    /// every attempt failed.
    pub async fn infer(&self, error_case: &str, prompt: &str, num_feedbacks: usize) -> Vec<String> {
        let request = format_reason_prompt(prompt, error_case, num_feedbacks);

        let Some(raw) = self.request_with_retry(&request).await else {
            warn!(
                "No reasons after {} attempts, continuing without feedback",
                MAX_REASON_ATTEMPTS
            );
            return Vec::new();
        };

        let reasons = parse_reasons(&raw);
        debug!("Inferred {} reason(s) (asked for {})", reasons.len(), num_feedbacks);
        reasons
    }
}
