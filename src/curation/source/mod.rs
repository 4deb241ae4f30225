mod index;

pub use index::AuthorityIndex;

use super::domain::{CountryCode, Gender};
use std::collections::{BTreeMap, BTreeSet};

/// First-name entry of the name authority.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameRecord {
    pub gender_probabilities: BTreeMap<Gender, f32>,
    pub rank_by_country: BTreeMap<CountryCode, u32>,
    pub countries: BTreeSet<CountryCode>,
}

impl NameRecord {
    pub fn gender_probability(&self, gender: Gender) -> f32 {
        self.gender_probabilities
            .get(&gender)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn rank_in(&self, country: &CountryCode) -> Option<u32> {
        self.rank_by_country.get(country).copied()
    }
}

/// Answer to an authority lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupResult {
    /// `None` when the authority knows the string but not as a first name.
    pub first_name: Option<NameRecord>,
}

/// Name authority queried by the pipeline and the sampler.
///
/// `top_names` must be stable and prefix-consistent: the first `k` entries of
/// `top_names(c, g, n)` equal `top_names(c, g, k)` for every `k <= n`.
pub trait NameSource: Send + Sync {
    /// `country` is the country the caller is validating for; adapters may use
    /// it to scope the query, but the record always lists every country.
    fn lookup(
        &self,
        name: &str,
        country: &CountryCode,
    ) -> Result<Option<LookupResult>, SourceError>;
    fn top_names(
        &self,
        country: &CountryCode,
        gender: Gender,
        n: usize,
    ) -> Result<Vec<String>, SourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read name authority: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid name authority data: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid name authority row {line}: {detail}")]
    InvalidRow { line: u64, detail: String },
    #[error("name authority unavailable: {0}")]
    Unavailable(String),
}
