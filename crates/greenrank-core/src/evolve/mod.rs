//! Feedback-driven prompt evolution
//!
//! One generation of the cycle:
//! 1. Run the current prompt over sampled sessions ([`Evaluator`])
//! 2. Flag responses that bury or lose the target item ([`ErrorDetector`])
//! 3. Ask the model why the prompt failed ([`ReasonInferencer`])
//! 4. Rewrite the prompt from those reasons ([`PromptRefiner`])
//! 5. Paraphrase the rewrite into extra candidates ([`PromptAugmenter`])
//! 6. Spend a fixed evaluation budget across the pool with UCB1 and keep the
//!    best few ([`BanditSelector`])
//!
//! [`Optimizer`] repeats this for a configured number of generations.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use greenrank_core::evolve::{EvolveConfig, Optimizer};
//!
//! let config = EvolveConfig::development();
//! let mut optimizer = Optimizer::new(model, config, 42);
//! let result = optimizer.run(&trainset.examples).await;
//!
//! println!("Best prompt:\n{}", result.best_prompt);
//! ```

pub mod augment;
pub mod detector;
pub mod evaluator;
pub mod optimizer;
pub mod reason;
pub mod refine;
pub mod selection;

pub use augment::PromptAugmenter;
pub use detector::{detect_error, ErrorDetector, DEFAULT_RANK_THRESHOLD};
pub use evaluator::{format_error_case, Evaluator};
pub use optimizer::{GenerationRecord, OptimizationResult, Optimizer};
pub use reason::{parse_reasons, ReasonInferencer, MAX_REASON_ATTEMPTS};
pub use refine::{parse_refined_prompt, PromptRefiner};
pub use selection::{argmax_first, BanditSelector, BanditState, SelectionConfig, SelectionOutcome};

/// Starting prompt when no optimized prompt has been saved yet
pub const SEED_PROMPT: &str = "Based on the user's current session interactions, \
rerank the 20 items in the candidate set so that the products the user is most likely \
to engage with, with a preference for environmentally sustainable and eco-friendly \
products, come first. Output the full ordered list, one item per line, numbered from 1. \
Every item must come from the candidate set.";

/// Configuration for prompt evolution
#[derive(Clone, Debug)]
pub struct EvolveConfig {
    /// Generations of refine -> augment -> select
    pub num_generations: usize,
    /// Sessions sampled per beam prompt when looking for failures
    pub batch_size: usize,
    /// Failing sessions turned into rewrites, per beam prompt
    pub max_errors_per_prompt: usize,
    /// Reasons requested per failure
    pub num_feedbacks: usize,
    /// Paraphrases generated per rewrite
    pub num_augments: usize,
    /// Bandit rounds per selection
    pub time_steps: usize,
    /// UCB1 exploration coefficient
    pub explore_param: f64,
    /// Sessions per bandit pull
    pub sample_num: usize,
    /// Prompts kept after selection
    pub beam_width: usize,
    /// Upper bound on in-flight completion requests
    pub concurrency: usize,
    /// Ranks at or beyond this count as failures
    pub rank_threshold: usize,
    /// Prompt the first generation starts from
    pub seed_prompt: String,
}

impl Default for EvolveConfig {
    fn default() -> Self {
        Self {
            num_generations: 4,
            batch_size: 16,
            max_errors_per_prompt: 1,
            num_feedbacks: 2,
            num_augments: 2,
            time_steps: 16,
            explore_param: 2.0,
            sample_num: 32,
            beam_width: 5,
            concurrency: 100,
            rank_threshold: DEFAULT_RANK_THRESHOLD,
            seed_prompt: SEED_PROMPT.to_string(),
        }
    }
}

impl EvolveConfig {
    /// Quick development configuration (fast, cheap)
    pub fn development() -> Self {
        Self {
            num_generations: 2,
            batch_size: 8,
            time_steps: 6,
            sample_num: 8,
            beam_width: 3,
            concurrency: 16,
            ..Default::default()
        }
    }

    /// Production configuration (thorough, expensive)
    pub fn production() -> Self {
        Self {
            num_generations: 8,
            batch_size: 32,
            max_errors_per_prompt: 2,
            num_feedbacks: 3,
            num_augments: 3,
            time_steps: 32,
            sample_num: 64,
            ..Default::default()
        }
    }

    pub fn with_seed_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.seed_prompt = prompt.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_generations(mut self, num_generations: usize) -> Self {
        self.num_generations = num_generations;
        self
    }

    /// Bandit parameters for [`BanditSelector`]
    pub fn selection_config(&self) -> SelectionConfig {
        SelectionConfig {
            time_steps: self.time_steps,
            explore_param: self.explore_param,
            sample_num: self.sample_num,
            beam_width: self.beam_width,
            concurrency: self.concurrency,
        }
    }
}
