//! Session datasets for prompt evolution and evaluation

use anyhow::{Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One user session: interaction history plus candidate set, and the item
/// whose rank the model must recover.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Example {
    /// Optional identifier, only used for reporting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Interaction history and candidate items, appended to the prompt verbatim
    pub input: String,
    /// Name of the ground-truth item
    pub target: String,
}

impl Example {
    pub fn new(input: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            input: input.into(),
            target: target.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DatasetFile {
    Bare(Vec<Example>),
    Wrapped { examples: Vec<Example> },
}

/// In-memory collection of examples
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub examples: Vec<Example>,
}

impl Dataset {
    pub fn new(examples: Vec<Example>) -> Self {
        Self { examples }
    }

    /// Load from a JSON file holding either an array of examples or
    /// `{"examples": [...]}`.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse dataset: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let examples = match serde_json::from_str::<DatasetFile>(content)? {
            DatasetFile::Bare(examples) => examples,
            DatasetFile::Wrapped { examples } => examples,
        };
        Ok(Self { examples })
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<&Example> {
        sample_without_replacement(&self.examples, n, rng)
    }
}

/// Draw `min(n, len)` distinct examples uniformly at random.
pub fn sample_without_replacement<'a, R: Rng + ?Sized>(
    examples: &'a [Example],
    n: usize,
    rng: &mut R,
) -> Vec<&'a Example> {
    let amount = n.min(examples.len());
    rand::seq::index::sample(rng, examples.len(), amount)
        .into_iter()
        .map(|i| &examples[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn make_examples(n: usize) -> Vec<Example> {
        (0..n)
            .map(|i| Example::new(format!("session {}", i), format!("item {}", i)))
            .collect()
    }

    #[test]
    fn test_load_bare_array() {
        let json = r#"[
            {"input": "User viewed: LED bulb. Candidates: ...", "target": "Solar Lamp"},
            {"id": "s2", "input": "User viewed: tote bag", "target": "Bamboo Straw"}
        ]"#;
        let dataset = Dataset::from_json(json).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.examples[0].id, None);
        assert_eq!(dataset.examples[1].id.as_deref(), Some("s2"));
    }

    #[test]
    fn test_load_wrapped() {
        let json = r#"{"examples": [{"input": "x", "target": "y"}]}"#;
        let dataset = Dataset::from_json(json).unwrap();
        assert_eq!(dataset.examples, vec![Example::new("x", "y")]);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Dataset::load_from_file("/nonexistent/greenrank.json").is_err());
    }

    #[test]
    fn test_sample_is_distinct_and_clamped() {
        let examples = make_examples(10);
        let mut rng = StdRng::seed_from_u64(7);

        let batch = sample_without_replacement(&examples, 4, &mut rng);
        assert_eq!(batch.len(), 4);
        let distinct: HashSet<&str> = batch.iter().map(|e| e.target.as_str()).collect();
        assert_eq!(distinct.len(), 4);

        let all = sample_without_replacement(&examples, 50, &mut rng);
        assert_eq!(all.len(), 10);

        assert!(sample_without_replacement(&[], 3, &mut rng).is_empty());
    }

    #[test]
    fn test_sample_reproducible_with_seed() {
        let dataset = Dataset::new(make_examples(20));
        let a: Vec<Example> = dataset
            .sample(5, &mut StdRng::seed_from_u64(3))
            .into_iter()
            .cloned()
            .collect();
        let b: Vec<Example> = dataset
            .sample(5, &mut StdRng::seed_from_u64(3))
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(a, b);
    }
}
