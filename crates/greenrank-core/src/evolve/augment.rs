//! Paraphrases a prompt into semantically equivalent variants

use futures::stream::{self, StreamExt};
use greenrank_tools::{fill_template, CompletionModel};
use std::sync::Arc;
use tracing::debug;

pub const AUGMENT_PROMPT: &str = "Generate a variation of the following instruction for sustainable product recommendations while keeping the semantic meaning.\n\
Input: {prompt}\n\
Output:";

pub fn format_augment_prompt(prompt: &str) -> String {
    fill_template(AUGMENT_PROMPT, &[("prompt", prompt)])
}

#[derive(Clone)]
pub struct PromptAugmenter {
    model: Arc<dyn CompletionModel>,
    concurrency: usize,
}

impl PromptAugmenter {
    pub fn new(model: Arc<dyn CompletionModel>, concurrency: usize) -> Self {
        Self {
            model,
            concurrency: concurrency.max(1),
        }
    }

    /// `count` independent paraphrase requests. The result has exactly
    /// `count` entries in request order; empty completions become `""`.
    pub async fn augment(&self, prompt: &str, count: usize) -> Vec<String> {
        let request = format_augment_prompt(prompt);

        let variants: Vec<String> = stream::iter((0..count).map(|_| self.model.complete(&request)))
            .buffered(self.concurrency)
            .map(|result| result.into_string().trim().to_string())
            .collect()
            .await;

        debug!("Generated {} variation(s)", variants.len());
        variants
    }
}
