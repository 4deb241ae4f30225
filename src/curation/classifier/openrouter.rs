use super::reply::parse_classifier_reply;
use super::retry::RetryPolicy;
use super::{restrict_to_batch, ClassifierError, NameClassifier};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";
pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

const SYSTEM_PROMPT: &str = "You are a data-quality assistant for baby-name datasets. \
You answer with JSON only.";

const INSTRUCTION: &str = "The following strings were taken from a first-name frequency list. \
Return a JSON array containing only the strings that are genuine given names as people would \
write them on a birth certificate. Remove nicknames, diminutives, abbreviations, initials, \
misspellings, words that are not names and joke entries. Do not add, rename or correct \
entries.";

#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl OpenRouterConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}

/// Chat-completions classifier speaking the OpenRouter protocol.
pub struct OpenRouterClassifier {
    config: OpenRouterConfig,
    agent: ureq::Agent,
}

impl OpenRouterClassifier {
    pub fn new(config: OpenRouterConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { config, agent }
    }

    fn request_body(&self, batch: &[String]) -> Value {
        let names = serde_json::to_string(batch).unwrap_or_else(|_| "[]".to_string());
        json!({
            "model": self.config.model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": format!("{INSTRUCTION}\n\n{names}") },
            ],
        })
    }

    fn classify_once(&self, batch: &[String]) -> Result<Vec<String>, ClassifierError> {
        let response = self
            .agent
            .post(&self.config.endpoint)
            .set("Authorization", &format!("Bearer {}", self.config.api_key))
            .set("Content-Type", "application/json")
            .send_json(self.request_body(batch))
            .map_err(|err| match err {
                ureq::Error::Status(code, _) => ClassifierError::Status(code),
                other => ClassifierError::Transport(other.to_string()),
            })?;

        let payload: Value = response
            .into_json()
            .map_err(|err| ClassifierError::Parse(err.to_string()))?;

        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| ClassifierError::Parse("reply has no message content".to_string()))?;

        parse_classifier_reply(content)
    }
}

impl std::fmt::Debug for OpenRouterClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterClassifier")
            .field("model", &self.config.model)
            .field("endpoint", &self.config.endpoint)
            .finish_non_exhaustive()
    }
}

impl NameClassifier for OpenRouterClassifier {
    fn filter(&self, batch: &[String]) -> Vec<String> {
        if batch.is_empty() {
            return Vec::new();
        }

        match self.config.retry.run(|_| self.classify_once(batch)) {
            Ok(reply) => {
                let kept = restrict_to_batch(batch, reply);
                debug!(submitted = batch.len(), kept = kept.len(), "classifier batch done");
                kept
            }
            Err(err) => {
                warn!(error = %err, size = batch.len(), "classifier unavailable, keeping batch unfiltered");
                batch.to_vec()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_carries_model_and_batch() {
        let classifier = OpenRouterClassifier::new(OpenRouterConfig::new("key"));
        let body = classifier.request_body(&["Anna".to_string(), "Brrr".to_string()]);
        assert_eq!(body["model"], DEFAULT_MODEL);
        let user = body["messages"][1]["content"].as_str().expect("user content");
        assert!(user.ends_with(r#"["Anna","Brrr"]"#));
    }

    #[test]
    fn unreachable_endpoint_fails_open() {
        let mut config = OpenRouterConfig::new("key");
        config.endpoint = "http://127.0.0.1:9/unreachable".to_string();
        config.timeout = Duration::from_millis(200);
        config.retry = RetryPolicy::no_backoff(2);
        let classifier = OpenRouterClassifier::new(config);

        let batch = vec!["Anna".to_string(), "Carl".to_string()];
        assert_eq!(classifier.filter(&batch), batch);
    }
}
