mod openrouter;
mod reply;
mod retry;

pub use openrouter::{OpenRouterClassifier, OpenRouterConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL};
pub use reply::parse_classifier_reply;
pub use retry::RetryPolicy;

use std::collections::HashSet;

/// Secondary judge of name validity, typically backed by a language model.
pub trait NameClassifier: Send + Sync {
    /// Returns the subsequence of `batch` judged to be real first names.
    /// Implementations fail open: when the backend cannot be reached the
    /// whole batch comes back unchanged.
    fn filter(&self, batch: &[String]) -> Vec<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Transport(String),
    #[error("classifier returned HTTP {0}")]
    Status(u16),
    #[error("classifier reply could not be parsed: {0}")]
    Parse(String),
}

/// Keeps only the entries of `reply` that were part of `batch`, in batch
/// order and without repeats.
pub fn restrict_to_batch(batch: &[String], reply: Vec<String>) -> Vec<String> {
    let kept: HashSet<String> = reply.into_iter().map(|name| name.trim().to_string()).collect();
    let mut seen = HashSet::new();
    batch
        .iter()
        .filter(|name| kept.contains(name.trim()) && seen.insert(name.as_str()))
        .cloned()
        .collect()
}
