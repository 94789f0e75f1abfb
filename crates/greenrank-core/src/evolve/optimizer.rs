//! Generation loop: collect failures, rewrite, paraphrase, select

use chrono::{DateTime, Utc};
use greenrank_tools::CompletionModel;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    format_error_case, BanditSelector, ErrorDetector, EvolveConfig, Evaluator, PromptAugmenter,
    PromptRefiner, ReasonInferencer,
};
use crate::dataset::{sample_without_replacement, Example};

/// What happened in one generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: usize,
    /// Failing sessions found across the beam
    pub errors_found: usize,
    /// Candidates handed to the bandit (beam included)
    pub pool_size: usize,
    /// Survivors with their cumulative bandit reward, best first
    pub beam: Vec<(String, f64)>,
}

/// Result of a full optimization run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub best_prompt: String,
    pub beam: Vec<String>,
    pub history: Vec<GenerationRecord>,
    pub total_lm_calls: usize,
    pub created_at: DateTime<Utc>,
}

impl OptimizationResult {
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

pub struct Optimizer {
    config: EvolveConfig,
    evaluator: Evaluator,
    detector: ErrorDetector,
    inferencer: ReasonInferencer,
    refiner: PromptRefiner,
    augmenter: PromptAugmenter,
    selector: BanditSelector,
    rng: StdRng,
    lm_calls: usize,
}

impl Optimizer {
    pub fn new(model: Arc<dyn CompletionModel>, config: EvolveConfig, seed: u64) -> Self {
        Self {
            evaluator: Evaluator::new(model.clone()),
            detector: ErrorDetector::new(config.rank_threshold),
            inferencer: ReasonInferencer::new(model.clone()),
            refiner: PromptRefiner::new(model.clone()),
            augmenter: PromptAugmenter::new(model.clone(), config.concurrency),
            selector: BanditSelector::new(model, config.selection_config()),
            rng: StdRng::seed_from_u64(seed),
            lm_calls: 0,
            config,
        }
    }

    /// Run `num_generations` generations starting from the seed prompt.
    pub async fn run(&mut self, train: &[Example]) -> OptimizationResult {
        info!("Starting prompt evolution");
        info!("  Generations: {}", self.config.num_generations);
        info!("  Beam width: {}", self.config.beam_width);
        info!("  Training sessions: {}", train.len());

        let mut beam = vec![self.config.seed_prompt.clone()];
        let mut history = Vec::with_capacity(self.config.num_generations);

        for generation in 1..=self.config.num_generations {
            info!("Generation {}/{}", generation, self.config.num_generations);

            let mut pool = beam.clone();
            let mut errors_found = 0;
            for prompt in &beam {
                let (candidates, errors) = self.expand(prompt, train).await;
                errors_found += errors;
                pool.extend(candidates);
            }
            let pool = dedup_candidates(pool);
            info!("  Failures: {}, pool size: {}", errors_found, pool.len());

            let outcome = self.selector.run(&pool, train, &mut self.rng).await;
            self.lm_calls += outcome.state.selections.iter().sum::<usize>();

            if !outcome.ranked.is_empty() {
                beam = outcome.prompts();
            }
            if let Some((_, reward)) = outcome.ranked.first() {
                info!("  Best cumulative reward: {:.3}", reward);
            }

            history.push(GenerationRecord {
                generation,
                errors_found,
                pool_size: pool.len(),
                beam: outcome.ranked,
            });
        }

        info!("Evolution complete ({} LM calls)", self.lm_calls);

        OptimizationResult {
            best_prompt: beam
                .first()
                .cloned()
                .unwrap_or_else(|| self.config.seed_prompt.clone()),
            beam,
            history,
            total_lm_calls: self.lm_calls,
            created_at: Utc::now(),
        }
    }

    /// New candidates grown from `prompt`'s failures, and how many failures
    /// were seen.
    async fn expand(&mut self, prompt: &str, train: &[Example]) -> (Vec<String>, usize) {
        let batch = sample_without_replacement(train, self.config.batch_size, &mut self.rng);
        let responses = self
            .evaluator
            .evaluate_batch(prompt, &batch, self.config.concurrency)
            .await;
        self.lm_calls += batch.len();

        let failures: Vec<(&Example, String)> = batch
            .into_iter()
            .zip(responses)
            .filter(|(example, response)| self.detector.detect_error(response, &example.target))
            .collect();
        let errors = failures.len();

        let mut candidates = Vec::new();
        for (example, response) in failures.into_iter().take(self.config.max_errors_per_prompt) {
            let error_case = format_error_case(example, &response);

            let reasons = self
                .inferencer
                .infer(&error_case, prompt, self.config.num_feedbacks)
                .await;
            let refined = self.refiner.refine(prompt, &error_case, &reasons).await;
            let variants = self
                .augmenter
                .augment(&refined, self.config.num_augments)
                .await;
            // Reasons take one to three calls; count the minimum.
            self.lm_calls += 2 + variants.len();

            debug!(
                "Failure on '{}': {} reason(s), {} variant(s)",
                example.target,
                reasons.len(),
                variants.len()
            );

            candidates.push(refined);
            candidates.extend(variants);
        }

        (candidates, errors)
    }
}

/// Drop blank candidates and repeats, keeping first-seen order.
pub fn dedup_candidates(pool: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    pool.into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .filter(|p| seen.insert(p.clone()))
        .collect()
}
