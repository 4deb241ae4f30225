//! Feedback-controlled sampling of a frequency-ranked name list.
//!
//! Each round asks the source for a longer prefix of its ranking, filters the
//! new slice, and sizes the next request from an exponential moving average of
//! the observed acceptance rate.

use super::classifier::{restrict_to_batch, NameClassifier};
use super::domain::{CountryCode, Gender};
use super::local::NamePredicate;
use super::source::{NameSource, SourceError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    pub min_batch: usize,
    pub max_batch: usize,
    /// Upper batch bound while a classifier is attached.
    pub classifier_max_batch: usize,
    /// Names per classifier request.
    pub classifier_chunk: usize,
    pub max_iterations: usize,
    pub initial_yield: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            min_batch: 200,
            max_batch: 5000,
            classifier_max_batch: 1000,
            classifier_chunk: 100,
            max_iterations: 50,
            initial_yield: 0.5,
        }
    }
}

/// Why a sampling loop stopped. All three are normal terminations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    QuotaMet,
    SourceExhausted,
    IterationCap,
}

/// Mutable state of one country×gender loop.
#[derive(Debug, Clone)]
pub struct SamplingState {
    pub accepted: Vec<String>,
    seen: HashSet<String>,
    pub offset: usize,
    pub fetched: usize,
    pub locally_rejected: usize,
    pub externally_rejected: usize,
    pub yield_rate: f64,
    pub iterations: usize,
}

impl SamplingState {
    pub fn new(initial_yield: f64) -> Self {
        Self {
            accepted: Vec::new(),
            seen: HashSet::new(),
            offset: 0,
            fetched: 0,
            locally_rejected: 0,
            externally_rejected: 0,
            yield_rate: initial_yield.clamp(MIN_YIELD, 1.0),
            iterations: 0,
        }
    }

    /// `fetched == accepted + locally_rejected + externally_rejected`.
    pub fn is_balanced(&self) -> bool {
        self.fetched == self.accepted.len() + self.locally_rejected + self.externally_rejected
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingOutcome {
    pub names: Vec<String>,
    pub fetched: usize,
    pub locally_rejected: usize,
    pub externally_rejected: usize,
    pub iterations: usize,
    pub termination: Termination,
}

const MIN_YIELD: f64 = 0.01;
const SAFETY_MARGIN: f64 = 1.5;
const PREVIOUS_WEIGHT: f64 = 0.3;
const OBSERVED_WEIGHT: f64 = 0.7;

enum Verdict {
    Local,
    External,
    Passed,
}

pub struct AdaptiveSampler<'a> {
    source: &'a dyn NameSource,
    predicate: &'a dyn NamePredicate,
    classifier: Option<&'a dyn NameClassifier>,
    config: SamplerConfig,
}

impl<'a> AdaptiveSampler<'a> {
    pub fn new(
        source: &'a dyn NameSource,
        predicate: &'a dyn NamePredicate,
        config: SamplerConfig,
    ) -> Self {
        Self {
            source,
            predicate,
            classifier: None,
            config,
        }
    }

    pub fn with_classifier(mut self, classifier: &'a dyn NameClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Collects up to `target` distinct accepted names for `country`/`gender`.
    pub fn fetch_until_sufficient(
        &self,
        country: &CountryCode,
        gender: Gender,
        target: usize,
    ) -> Result<SamplingOutcome, SourceError> {
        let mut state = SamplingState::new(self.config.initial_yield);

        let termination = loop {
            let needed = target.saturating_sub(state.accepted.len());
            if needed == 0 {
                break Termination::QuotaMet;
            }
            if state.iterations >= self.config.max_iterations {
                break Termination::IterationCap;
            }
            state.iterations += 1;

            let batch = self.next_batch_size(needed, state.yield_rate);
            let ranking = self
                .source
                .top_names(country, gender, state.offset + batch)?;
            if ranking.len() <= state.offset {
                break Termination::SourceExhausted;
            }
            let fresh = &ranking[state.offset..];
            state.offset = ranking.len();

            let (fetched, accepted) = self.absorb(fresh, target, &mut state);
            debug_assert!(state.is_balanced(), "sampler accounting drifted");
            let observed = accepted as f64 / fetched.max(1) as f64;
            state.yield_rate = (PREVIOUS_WEIGHT * state.yield_rate + OBSERVED_WEIGHT * observed)
                .clamp(MIN_YIELD, 1.0);

            debug!(
                %country,
                %gender,
                iteration = state.iterations,
                batch,
                fetched,
                accepted,
                total = state.accepted.len(),
                yield_rate = state.yield_rate,
                "sampler round"
            );
        };

        Ok(SamplingOutcome {
            names: state.accepted,
            fetched: state.fetched,
            locally_rejected: state.locally_rejected,
            externally_rejected: state.externally_rejected,
            iterations: state.iterations,
            termination,
        })
    }

    fn next_batch_size(&self, needed: usize, yield_rate: f64) -> usize {
        let estimate = (needed as f64 / yield_rate * SAFETY_MARGIN).ceil() as usize;
        let upper = if self.classifier.is_some() {
            self.config.classifier_max_batch
        } else {
            self.config.max_batch
        };
        let lower = self.config.min_batch.min(upper);
        estimate.clamp(lower, upper).max(1)
    }

    /// Classifies `fresh` and appends qualifying names in ranking order until
    /// `target` is reached; unprocessed names past that point are dropped.
    /// Returns the number of names processed and accepted this round.
    fn absorb(&self, fresh: &[String], target: usize, state: &mut SamplingState) -> (usize, usize) {
        let verdicts = self.classify(fresh);
        let mut fetched = 0;
        let mut accepted = 0;

        for (name, verdict) in fresh.iter().zip(verdicts) {
            if state.accepted.len() >= target {
                break;
            }
            fetched += 1;
            state.fetched += 1;

            match verdict {
                Verdict::Local => state.locally_rejected += 1,
                Verdict::External => state.externally_rejected += 1,
                Verdict::Passed => {
                    let trimmed = name.trim();
                    if state.seen.insert(trimmed.to_string()) {
                        state.accepted.push(trimmed.to_string());
                        accepted += 1;
                    } else {
                        state.locally_rejected += 1;
                    }
                }
            }
        }

        (fetched, accepted)
    }

    fn classify(&self, fresh: &[String]) -> Vec<Verdict> {
        let locally_valid: Vec<bool> = fresh
            .iter()
            .map(|name| self.predicate.accepts(name))
            .collect();

        let Some(classifier) = self.classifier else {
            return locally_valid
                .into_iter()
                .map(|ok| if ok { Verdict::Passed } else { Verdict::Local })
                .collect();
        };

        let candidates: Vec<String> = fresh
            .iter()
            .zip(&locally_valid)
            .filter(|(_, ok)| **ok)
            .map(|(name, _)| name.clone())
            .collect();

        let mut kept = HashSet::new();
        for chunk in candidates.chunks(self.config.classifier_chunk.max(1)) {
            let reply = restrict_to_batch(chunk, classifier.filter(chunk));
            kept.extend(
                reply
                    .into_iter()
                    .filter(|name| self.predicate.accepts(name)),
            );
        }

        fresh
            .iter()
            .zip(locally_valid)
            .map(|(name, ok)| match (ok, kept.contains(name)) {
                (false, _) => Verdict::Local,
                (true, false) => Verdict::External,
                (true, true) => Verdict::Passed,
            })
            .collect()
    }
}
