//! UCB1 selection over a pool of candidate prompts
//!
//! Each arm is a prompt; each pull evaluates that prompt on a freshly drawn
//! mini-batch of sessions and adds the summed NDCG of the parsed responses
//! to its reward. Bookkeeping is in example counts, not rounds: a pull adds
//! the whole batch size to `selections` even when some responses fail to
//! parse and contribute nothing.

use futures::stream::{self, StreamExt};
use greenrank_tools::{extract_rank, ndcg, CompletionModel};
use rand::Rng;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

use super::evaluator::Evaluator;
use crate::dataset::{sample_without_replacement, Example};

/// Bandit parameters
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionConfig {
    /// Number of pulls
    pub time_steps: usize,
    /// Exploration coefficient `c` in `mean + c * sqrt(ln t / n)`
    pub explore_param: f64,
    /// Sessions drawn per pull
    pub sample_num: usize,
    /// Candidates returned
    pub beam_width: usize,
    /// Upper bound on in-flight requests within a pull
    pub concurrency: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            time_steps: 16,
            explore_param: 2.0,
            sample_num: 32,
            beam_width: 5,
            concurrency: 100,
        }
    }
}

/// Per-arm statistics for one `select` call
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BanditState {
    /// Sessions evaluated against each arm
    pub selections: Vec<usize>,
    /// Cumulative reward of each arm
    pub rewards: Vec<f64>,
}

impl BanditState {
    pub fn new(arms: usize) -> Self {
        Self {
            selections: vec![0; arms],
            rewards: vec![0.0; arms],
        }
    }

    pub fn arms(&self) -> usize {
        self.selections.len()
    }

    /// UCB1 score of `arm` at round `t` (1-based). Untried arms are `+inf`.
    pub fn ucb_score(&self, arm: usize, t: usize, explore_param: f64) -> f64 {
        let n = self.selections[arm];
        if n == 0 {
            return f64::INFINITY;
        }
        let n = n as f64;
        let mean = self.rewards[arm] / n;
        mean + explore_param * ((t as f64).ln() / n).sqrt()
    }

    pub fn ucb_scores(&self, t: usize, explore_param: f64) -> Vec<f64> {
        (0..self.arms())
            .map(|arm| self.ucb_score(arm, t, explore_param))
            .collect()
    }

    pub fn mean_reward(&self, arm: usize) -> Option<f64> {
        match self.selections[arm] {
            0 => None,
            n => Some(self.rewards[arm] / n as f64),
        }
    }

    fn record(&mut self, arm: usize, pulled: usize, reward: f64) {
        self.selections[arm] += pulled;
        self.rewards[arm] += reward;
    }

    /// Arm indices by cumulative reward, highest first. Ties keep input order.
    pub fn ranking(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.arms()).collect();
        order.sort_by(|&a, &b| {
            self.rewards[b]
                .partial_cmp(&self.rewards[a])
                .unwrap_or(Ordering::Equal)
        });
        order
    }
}

/// Index of the largest score; the first one wins ties.
pub fn argmax_first(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

/// Everything a selection run produced
#[derive(Clone, Debug, Default)]
pub struct SelectionOutcome {
    /// Top candidates with their cumulative rewards, best first
    pub ranked: Vec<(String, f64)>,
    /// Final bandit statistics, indexed like the input pool
    pub state: BanditState,
    /// Arm pulled in each round
    pub pulls: Vec<usize>,
}

impl SelectionOutcome {
    pub fn prompts(&self) -> Vec<String> {
        self.ranked.iter().map(|(p, _)| p.clone()).collect()
    }
}

#[derive(Clone)]
pub struct BanditSelector {
    evaluator: Evaluator,
    config: SelectionConfig,
    metric: fn(usize) -> f64,
}

impl BanditSelector {
    pub fn new(model: Arc<dyn CompletionModel>, config: SelectionConfig) -> Self {
        Self {
            evaluator: Evaluator::new(model),
            config,
            metric: ndcg,
        }
    }

    /// Replace the per-session reward (default: [`ndcg`]).
    pub fn with_metric(mut self, metric: fn(usize) -> f64) -> Self {
        self.metric = metric;
        self
    }

    /// The top `beam_width` candidates by estimated reward, best first.
    pub async fn select<R: Rng + ?Sized>(
        &self,
        candidates: &[String],
        train: &[Example],
        rng: &mut R,
    ) -> Vec<String> {
        self.run(candidates, train, rng).await.prompts()
    }

    /// Full bandit run, returning the statistics alongside the winners.
    pub async fn run<R: Rng + ?Sized>(
        &self,
        candidates: &[String],
        train: &[Example],
        rng: &mut R,
    ) -> SelectionOutcome {
        if candidates.is_empty() || train.is_empty() {
            return SelectionOutcome::default();
        }

        let cfg = &self.config;
        let mut state = BanditState::new(candidates.len());
        let mut pulls = Vec::with_capacity(cfg.time_steps);

        for t in 1..=cfg.time_steps {
            let batch = sample_without_replacement(train, cfg.sample_num, rng);

            let scores = state.ucb_scores(t, cfg.explore_param);
            let Some(arm) = argmax_first(&scores) else {
                break;
            };

            let reward = self.pull(&candidates[arm], &batch).await;
            state.record(arm, batch.len(), reward);
            pulls.push(arm);

            info!(
                "Round {}/{}: arm {} (ucb {:.3}) reward {:.3} over {} sessions",
                t,
                cfg.time_steps,
                arm,
                scores[arm],
                reward,
                batch.len()
            );
        }

        let ranked: Vec<(String, f64)> = state
            .ranking()
            .into_iter()
            .take(cfg.beam_width)
            .map(|i| (candidates[i].clone(), state.rewards[i]))
            .collect();

        for arm in 0..state.arms() {
            debug!(
                "Arm {}: {} sessions, mean reward {:?}",
                arm,
                state.selections[arm],
                state.mean_reward(arm)
            );
        }

        SelectionOutcome {
            ranked,
            state,
            pulls,
        }
    }

    /// Summed reward of one prompt over a batch; unparsed responses add 0.
    async fn pull(&self, prompt: &str, batch: &[&Example]) -> f64 {
        let metric = self.metric;
        stream::iter(batch.iter().map(|example| async move {
            let response = self.evaluator.evaluate(prompt, example).await;
            match extract_rank(&response, &example.target).last() {
                Some(&rank) => metric(rank).max(0.0),
                None => 0.0,
            }
        }))
        .buffer_unordered(self.config.concurrency.max(1))
        .fold(0.0, |acc, reward| async move { acc + reward })
        .await
    }
}
