//! Runs a prompt against a session

use futures::stream::{self, StreamExt};
use greenrank_tools::CompletionModel;
use std::sync::Arc;

use crate::dataset::Example;

/// Longest slice of a failing response quoted back to the model
const MAX_QUOTED_RESPONSE: usize = 1500;

#[derive(Clone)]
pub struct Evaluator {
    model: Arc<dyn CompletionModel>,
}

impl Evaluator {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    /// Prompt first, then the session input on the next line.
    pub fn full_prompt(prompt: &str, example: &Example) -> String {
        format!("{}\n{}", prompt, example.input)
    }

    /// Single request, no retry. An empty completion comes back as `""`.
    pub async fn evaluate(&self, prompt: &str, example: &Example) -> String {
        self.model
            .complete(&Self::full_prompt(prompt, example))
            .await
            .into_string()
    }

    /// Evaluate many sessions with at most `concurrency` requests in flight.
    /// Responses line up with `examples`.
    pub async fn evaluate_batch(
        &self,
        prompt: &str,
        examples: &[&Example],
        concurrency: usize,
    ) -> Vec<String> {
        stream::iter(examples.iter().map(|example| self.evaluate(prompt, example)))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}

/// Describe a failing session for the diagnostic and rewrite prompts.
pub fn format_error_case(example: &Example, response: &str) -> String {
    let response = response.trim();
    let quoted = if response.is_empty() {
        "(no response)".to_string()
    } else if response.chars().count() > MAX_QUOTED_RESPONSE {
        let cut: String = response.chars().take(MAX_QUOTED_RESPONSE).collect();
        format!("{}...", cut)
    } else {
        response.to_string()
    };

    format!(
        "{}\nThe target item the user actually chose: {}\nThe ranking produced: {}",
        example.input.trim(),
        example.target,
        quoted
    )
}
