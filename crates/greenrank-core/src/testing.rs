//! Scripted completion model for deterministic tests

use async_trait::async_trait;
use greenrank_tools::{CompletionModel, CompletionResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type Responder = dyn Fn(&str) -> CompletionResult + Send + Sync;

/// Answers every prompt through a closure and records what it was asked.
pub struct ScriptedModel {
    responder: Box<Responder>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(responder: impl Fn(&str) -> CompletionResult + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always returns the same text.
    pub fn constant(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| CompletionResult::Success(text.clone()))
    }

    /// Never returns content.
    pub fn empty() -> Self {
        Self::new(|_| CompletionResult::Empty)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> CompletionResult {
        self.calls.lock().unwrap().push(prompt.to_string());
        (self.responder)(prompt)
    }
}

/// Holds every request open for `delay` and tracks the most requests that
/// were ever in flight at once.
pub struct PacedModel {
    delay: Duration,
    text: String,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl PacedModel {
    pub fn new(delay: Duration, text: &str) -> Self {
        Self {
            delay,
            text: text.to_string(),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionModel for PacedModel {
    async fn complete(&self, _prompt: &str) -> CompletionResult {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        CompletionResult::Success(self.text.clone())
    }
}

/// A numbered ranking that puts `target` at `rank`.
pub fn ranking_with(target: &str, rank: usize) -> String {
    let mut lines: Vec<String> = (1..rank)
        .map(|i| format!("{}. Filler Product {}", i, i))
        .collect();
    lines.push(format!("{}. {}", rank, target));
    lines.join("\n")
}
