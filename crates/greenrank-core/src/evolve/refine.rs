//! Rewrites a failing prompt from its diagnosed reasons

use greenrank_tools::{extract_delimited, fill_template, CompletionModel, CompletionResult};
use std::sync::Arc;
use tracing::{debug, warn};

pub const REFINE_PROMPT: &str = "I'm developing a zero-shot recommender prompt for an eco-friendly product recommendation system.\n\
My current prompt is \"{prompt}\"\n\
This prompt failed to properly recommend sustainable products for: {error_case}\n\
Analysis shows the issues are: {reasons}.\n\
Create an improved prompt that better understands user environmental consciousness, captures sustainability preferences more accurately, and prioritizes eco-friendly products effectively.\n\
Focus on enhancing the system's ability to identify environmental awareness signals and align recommendations with sustainability goals.\n\
Wrap the improved prompt with <START> and <END>.\n\
The enhanced prompt is:";

pub fn format_refine_prompt(prompt: &str, error_case: &str, reasons: &[String]) -> String {
    fill_template(
        REFINE_PROMPT,
        &[
            ("prompt", prompt),
            ("error_case", error_case),
            ("reasons", &reasons.join("\n")),
        ],
    )
}

/// First non-blank delimited segment, else the raw response verbatim.
pub fn parse_refined_prompt(raw: &str) -> String {
    extract_delimited(raw)
        .into_iter()
        .map(|p| p.trim().to_string())
        .find(|p| !p.is_empty())
        .unwrap_or_else(|| raw.to_string())
}

#[derive(Clone)]
pub struct PromptRefiner {
    model: Arc<dyn CompletionModel>,
}

impl PromptRefiner {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    /// Always yields a string; `""` when the model returned nothing.
    pub async fn refine(&self, prompt: &str, error_case: &str, reasons: &[String]) -> String {
        let request = format_refine_prompt(prompt, error_case, reasons);

        match self.model.complete(&request).await {
            CompletionResult::Success(raw) => {
                let refined = parse_refined_prompt(&raw);
                debug!("Refined prompt ({} chars)", refined.len());
                refined
            }
            CompletionResult::Empty => {
                warn!("Refinement returned no content");
                String::new()
            }
        }
    }
}
