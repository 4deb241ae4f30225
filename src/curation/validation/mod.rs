mod rules;

use super::domain::{Candidate, RejectionReason, ValidationOutcome};
use super::registry::PatternRegistry;
use super::source::{NameSource, SourceError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Tunables for the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub min_length: usize,
    pub max_length: usize,
    /// Largest accepted popularity rank (1 = most common).
    pub rank_ceiling: u32,
    /// Set when the caller already applied the same length window.
    pub skip_length_check: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_length: 3,
            max_length: 20,
            rank_ceiling: 5000,
            skip_length_check: false,
        }
    }
}

/// Fail-fast chain of name checks. Local checks run first; the authority
/// lookup is only reached by candidates that pass all of them.
#[derive(Debug, Clone)]
pub struct ValidationPipeline {
    registry: Arc<PatternRegistry>,
    config: ValidationConfig,
}

impl ValidationPipeline {
    pub fn new(registry: Arc<PatternRegistry>, config: ValidationConfig) -> Self {
        Self { registry, config }
    }

    pub fn validate(
        &self,
        candidate: &Candidate,
        source: &dyn NameSource,
    ) -> Result<ValidationOutcome, SourceError> {
        if let Some(reason) = self.check_local(candidate) {
            return Ok(ValidationOutcome::Rejected(reason));
        }

        let lookup = source.lookup(&candidate.name, &candidate.country)?;
        Ok(match rules::check_authority(candidate, lookup, &self.config) {
            Some(reason) => ValidationOutcome::Rejected(reason),
            None => ValidationOutcome::Accepted,
        })
    }

    /// Steps 1-6 (no I/O).
    pub fn check_local(&self, candidate: &Candidate) -> Option<RejectionReason> {
        let name = candidate.name.as_str();
        let lowered = name.to_lowercase();
        let registry = self.registry.as_ref();

        rules::check_blacklists(&lowered, &candidate.country, registry)
            .or_else(|| rules::check_shape(&lowered, registry))
            .or_else(|| {
                if self.config.skip_length_check {
                    None
                } else {
                    rules::check_length(name, &self.config)
                }
            })
            .or_else(|| rules::check_character_set(name, &candidate.country, registry))
            .or_else(|| rules::check_format(name, &candidate.country, registry))
            .or_else(|| rules::check_double_name(name))
    }
}
