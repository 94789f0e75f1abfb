//! Held-out evaluation of a prompt: hit rate and NDCG at fixed cutoffs

use anyhow::Result;
use chrono::{DateTime, Utc};
use greenrank_tools::{extract_rank, hit_at, ndcg_at};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::dataset::Example;
use crate::evolve::Evaluator;

pub const CUTOFFS: [usize; 3] = [1, 5, 10];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricAtK {
    pub k: usize,
    pub hit_rate: f64,
    pub ndcg: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub prompt: String,
    pub num_examples: usize,
    /// Responses the target's rank could not be recovered from
    pub unparsed: usize,
    pub metrics: Vec<MetricAtK>,
    /// Target rank per example, `None` when unparsed
    pub ranks: Vec<Option<usize>>,
    pub created_at: DateTime<Utc>,
}

impl EvaluationReport {
    /// Average the per-example metrics. Unparsed examples score zero.
    pub fn from_ranks(prompt: &str, ranks: Vec<Option<usize>>) -> Self {
        let n = ranks.len();
        let metrics = CUTOFFS
            .iter()
            .map(|&k| {
                let (hits, gains) = ranks
                    .iter()
                    .flatten()
                    .fold((0.0, 0.0), |(h, g), &rank| {
                        (h + hit_at(rank, k), g + ndcg_at(rank, k))
                    });
                let denom = n.max(1) as f64;
                MetricAtK {
                    k,
                    hit_rate: hits / denom,
                    ndcg: gains / denom,
                }
            })
            .collect();

        Self {
            prompt: prompt.to_string(),
            num_examples: n,
            unparsed: ranks.iter().filter(|r| r.is_none()).count(),
            metrics,
            ranks,
            created_at: Utc::now(),
        }
    }

    pub fn metric(&self, k: usize) -> Option<&MetricAtK> {
        self.metrics.iter().find(|m| m.k == k)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Run `prompt` over every example and summarize.
pub async fn evaluate_prompt(
    evaluator: &Evaluator,
    prompt: &str,
    examples: &[Example],
    concurrency: usize,
) -> EvaluationReport {
    let refs: Vec<&Example> = examples.iter().collect();
    let responses = evaluator.evaluate_batch(prompt, &refs, concurrency).await;

    let ranks: Vec<Option<usize>> = examples
        .iter()
        .zip(&responses)
        .map(|(example, response)| extract_rank(response, &example.target).last().copied())
        .collect();

    let report = EvaluationReport::from_ranks(prompt, ranks);
    for m in &report.metrics {
        info!("HR@{}: {:.4}  NDCG@{}: {:.4}", m.k, m.hit_rate, m.k, m.ndcg);
    }
    info!("Unparsed responses: {}/{}", report.unparsed, report.num_examples);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ranking_with, ScriptedModel};
    use greenrank_tools::CompletionResult;
    use std::sync::Arc;

    #[test]
    fn test_from_ranks() {
        let report = EvaluationReport::from_ranks("p", vec![Some(1), Some(3), Some(12), None]);

        assert_eq!(report.num_examples, 4);
        assert_eq!(report.unparsed, 1);

        let at1 = report.metric(1).unwrap();
        assert!((at1.hit_rate - 0.25).abs() < 1e-12);
        assert!((at1.ndcg - 0.25).abs() < 1e-12);

        let at5 = report.metric(5).unwrap();
        assert!((at5.hit_rate - 0.5).abs() < 1e-12);
        assert!((at5.ndcg - (1.0 + 0.5) / 4.0).abs() < 1e-12);

        let at10 = report.metric(10).unwrap();
        assert!((at10.hit_rate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_from_ranks_empty() {
        let report = EvaluationReport::from_ranks("p", vec![]);
        assert_eq!(report.num_examples, 0);
        assert!(report.metrics.iter().all(|m| m.hit_rate == 0.0 && m.ndcg == 0.0));
    }

    #[tokio::test]
    async fn test_evaluate_prompt() {
        let model = Arc::new(ScriptedModel::new(|full| {
            let session = full.lines().last().unwrap_or_default();
            match session {
                "s1" => CompletionResult::Success(ranking_with("Solar Lamp", 1)),
                "s2" => CompletionResult::Success(ranking_with("Tote Bag", 7)),
                _ => CompletionResult::Empty,
            }
        }));
        let evaluator = Evaluator::new(model);
        let examples = vec![
            Example::new("s1", "Solar Lamp"),
            Example::new("s2", "Tote Bag"),
            Example::new("s3", "Glass Jar"),
        ];

        let report = evaluate_prompt(&evaluator, "Rank greenest first", &examples, 2).await;

        assert_eq!(report.ranks, vec![Some(1), Some(7), None]);
        assert_eq!(report.unparsed, 1);
        assert!((report.metric(10).unwrap().hit_rate - 2.0 / 3.0).abs() < 1e-12);
    }
}
