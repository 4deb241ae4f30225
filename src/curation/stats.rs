use super::domain::{CountryCode, Gender, RejectionReason};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Per-country outcome counters.
///
/// `total == valid + filtered` and `filtered == sum(reasons)` hold after any
/// sequence of `record_*` calls and merges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CountryStats {
    pub total: u64,
    pub valid: u64,
    pub filtered: u64,
    pub reasons: BTreeMap<RejectionReason, u64>,
    pub valid_by_gender: BTreeMap<Gender, u64>,
}

impl CountryStats {
    pub fn record_valid(&mut self, gender: Option<Gender>) {
        self.record_valid_many(gender, 1);
    }

    pub fn record_valid_many(&mut self, gender: Option<Gender>, count: u64) {
        self.total += count;
        self.valid += count;
        if let Some(gender) = gender {
            *self.valid_by_gender.entry(gender).or_insert(0) += count;
        }
    }

    pub fn record_filtered(&mut self, reason: RejectionReason) {
        self.record_filtered_many(reason, 1);
    }

    pub fn record_filtered_many(&mut self, reason: RejectionReason, count: u64) {
        if count == 0 {
            return;
        }
        self.total += count;
        self.filtered += count;
        *self.reasons.entry(reason).or_insert(0) += count;
    }

    pub fn merge(&mut self, other: &CountryStats) {
        self.total += other.total;
        self.valid += other.valid;
        self.filtered += other.filtered;
        for (reason, count) in &other.reasons {
            *self.reasons.entry(*reason).or_insert(0) += count;
        }
        for (gender, count) in &other.valid_by_gender {
            *self.valid_by_gender.entry(*gender).or_insert(0) += count;
        }
    }

    pub fn keep_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.valid as f64 / self.total as f64 * 100.0
        }
    }

    pub fn valid_for(&self, gender: Gender) -> u64 {
        self.valid_by_gender.get(&gender).copied().unwrap_or(0)
    }

    pub fn count_for(&self, reason: RejectionReason) -> u64 {
        self.reasons.get(&reason).copied().unwrap_or(0)
    }

    /// Reasons sorted by count (descending), ties broken by reason order.
    pub fn top_reasons(&self, limit: usize) -> Vec<(RejectionReason, u64)> {
        let mut reasons: Vec<(RejectionReason, u64)> =
            self.reasons.iter().map(|(r, c)| (*r, *c)).collect();
        reasons.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        reasons.truncate(limit);
        reasons
    }
}

/// Shared per-country counters. The lock is held only for the counter
/// mutation itself.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    by_country: Mutex<HashMap<CountryCode, CountryStats>>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a finished job's stats into the shared view.
    pub fn merge(&self, country: &CountryCode, stats: &CountryStats) {
        let mut guard = self.by_country.lock().expect("stats mutex poisoned");
        guard.entry(country.clone()).or_default().merge(stats);
    }

    /// Applies an incremental update for `country`.
    pub fn update<F>(&self, country: &CountryCode, apply: F)
    where
        F: FnOnce(&mut CountryStats),
    {
        let mut guard = self.by_country.lock().expect("stats mutex poisoned");
        apply(guard.entry(country.clone()).or_default());
    }

    pub fn get(&self, country: &CountryCode) -> Option<CountryStats> {
        let guard = self.by_country.lock().expect("stats mutex poisoned");
        guard.get(country).cloned()
    }

    /// Stats in the order of `countries`, skipping countries never recorded.
    pub fn ordered(&self, countries: &[CountryCode]) -> Vec<(CountryCode, CountryStats)> {
        let guard = self.by_country.lock().expect("stats mutex poisoned");
        countries
            .iter()
            .filter_map(|country| {
                guard
                    .get(country)
                    .map(|stats| (country.clone(), stats.clone()))
            })
            .collect()
    }
}
