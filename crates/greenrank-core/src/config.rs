use anyhow::{Context, Result};
use greenrank_tools::ChatClient;

#[derive(Debug, Clone)]
pub struct Config {
    pub llm_api_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_temperature: f32,

    /// JSON dataset used for error collection and bandit selection
    pub train_path: String,
    /// JSON dataset used by `--eval`
    pub test_path: String,
    /// Where optimized prompts and reports are written
    pub output_dir: String,

    /// Seed for mini-batch sampling
    pub seed: u64,
    /// Upper bound on in-flight completion requests
    pub concurrency: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            llm_api_url: std::env::var("LLM_API_URL")
                .unwrap_or_else(|_| "http://localhost:8080/v1".to_string()),
            llm_api_key: std::env::var("LLM_API_KEY").ok().filter(|k| !k.is_empty()),
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            llm_temperature: std::env::var("LLM_TEMPERATURE")
                .unwrap_or_else(|_| "0.7".to_string())
                .parse()
                .context("LLM_TEMPERATURE must be a number")?,

            train_path: std::env::var("GREENRANK_TRAIN_PATH")
                .unwrap_or_else(|_| "dataset/train.json".to_string()),
            test_path: std::env::var("GREENRANK_TEST_PATH")
                .unwrap_or_else(|_| "dataset/test.json".to_string()),
            output_dir: std::env::var("GREENRANK_OUTPUT_DIR")
                .unwrap_or_else(|_| "optimized_prompts".to_string()),

            seed: std::env::var("GREENRANK_SEED")
                .unwrap_or_else(|_| "42".to_string())
                .parse()
                .context("GREENRANK_SEED must be an unsigned integer")?,
            concurrency: std::env::var("GREENRANK_CONCURRENCY")
                .unwrap_or_else(|_| "100".to_string())
                .parse::<usize>()
                .context("GREENRANK_CONCURRENCY must be a positive integer")?
                .max(1),
        })
    }

    pub fn chat_client(&self) -> Result<ChatClient> {
        ChatClient::new(
            self.llm_api_url.clone(),
            self.llm_api_key.clone(),
            self.llm_model.clone(),
            self.llm_temperature,
        )
        .context("Failed to create completion client")
    }
}
