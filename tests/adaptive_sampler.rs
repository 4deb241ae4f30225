use name_curator::curation::classifier::NameClassifier;
use name_curator::curation::local::LocalNameFilter;
use name_curator::curation::sampler::{AdaptiveSampler, SamplerConfig, Termination};
use name_curator::curation::source::{LookupResult, NameSource, SourceError};
use name_curator::curation::{CountryCode, Gender};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Mutex;

/// Ranking of `size` synthetic names; `repeat` folds the ranking so the
/// same string shows up more than once.
struct SyntheticSource {
    size: usize,
    repeat: Option<usize>,
    requests: Mutex<Vec<usize>>,
}

impl SyntheticSource {
    fn unbounded() -> Self {
        Self::sized(usize::MAX)
    }

    fn sized(size: usize) -> Self {
        Self {
            size,
            repeat: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn name(&self, index: usize) -> String {
        let index = self.repeat.map_or(index, |period| index % period);
        format!("Name{index:06}")
    }
}

impl NameSource for SyntheticSource {
    fn lookup(
        &self,
        _name: &str,
        _country: &CountryCode,
    ) -> Result<Option<LookupResult>, SourceError> {
        Ok(None)
    }

    fn top_names(
        &self,
        _country: &CountryCode,
        _gender: Gender,
        n: usize,
    ) -> Result<Vec<String>, SourceError> {
        self.requests.lock().expect("request mutex").push(n);
        Ok((0..n.min(self.size)).map(|index| self.name(index)).collect())
    }
}

fn us() -> CountryCode {
    "US".parse().expect("valid code")
}

fn every_seventh_rejected(name: &str) -> bool {
    !name.ends_with('7')
}

#[test]
fn quota_is_met_exactly_against_an_inexhaustible_source() {
    let source = SyntheticSource::unbounded();
    let accept_all = |_: &str| true;
    let sampler = AdaptiveSampler::new(&source, &accept_all, SamplerConfig::default());

    let outcome = sampler
        .fetch_until_sufficient(&us(), Gender::Male, 3000)
        .expect("sampling succeeds");

    assert_eq!(outcome.names.len(), 3000);
    assert_eq!(outcome.termination, Termination::QuotaMet);
    let distinct: HashSet<&String> = outcome.names.iter().collect();
    assert_eq!(distinct.len(), 3000);
    assert_eq!(outcome.fetched, 3000);
}

#[test]
fn exhausted_source_returns_every_valid_name() {
    let source = SyntheticSource::sized(450);
    let sampler = AdaptiveSampler::new(&source, &every_seventh_rejected, SamplerConfig::default());

    let outcome = sampler
        .fetch_until_sufficient(&us(), Gender::Female, 10_000)
        .expect("sampling succeeds");

    let expected = (0..450).filter(|i| i % 10 != 7).count();
    assert_eq!(outcome.termination, Termination::SourceExhausted);
    assert_eq!(outcome.fetched, 450);
    assert_eq!(outcome.names.len(), expected);
    assert_eq!(
        outcome.fetched,
        outcome.names.len() + outcome.locally_rejected + outcome.externally_rejected
    );
}

#[test]
fn accepted_names_follow_ranking_order() {
    let source = SyntheticSource::sized(1000);
    let sampler = AdaptiveSampler::new(&source, &every_seventh_rejected, SamplerConfig::default());
    let outcome = sampler
        .fetch_until_sufficient(&us(), Gender::Male, 50)
        .expect("sampling succeeds");

    let mut sorted = outcome.names.clone();
    sorted.sort();
    assert_eq!(outcome.names, sorted);
    assert_eq!(outcome.names.first().map(String::as_str), Some("Name000000"));
}

#[test]
fn local_filter_runs_on_real_looking_rankings() {
    struct Ranking(Vec<&'static str>);
    impl NameSource for Ranking {
        fn lookup(
            &self,
            _name: &str,
            _country: &CountryCode,
        ) -> Result<Option<LookupResult>, SourceError> {
            Ok(None)
        }

        fn top_names(
            &self,
            _country: &CountryCode,
            _gender: Gender,
            n: usize,
        ) -> Result<Vec<String>, SourceError> {
            Ok(self.0.iter().take(n).map(|name| name.to_string()).collect())
        }
    }

    let source = Ranking(vec![
        "Marie", "A.J.", "Jean-Claude", "Lulu", "Jean--Claude", "Camille", "Al", "Zoé",
    ]);
    let filter = LocalNameFilter::default();
    let sampler = AdaptiveSampler::new(&source, &filter, SamplerConfig::default());
    let outcome = sampler
        .fetch_until_sufficient(&"FR".parse().expect("valid code"), Gender::Female, 100)
        .expect("sampling succeeds");

    assert_eq!(outcome.names, vec!["Marie", "Jean-Claude", "Camille", "Zoé"]);
    assert_eq!(outcome.locally_rejected, 4);
}

#[test]
fn classifier_output_is_restricted_and_revalidated() {
    struct Mischievous;
    impl NameClassifier for Mischievous {
        fn filter(&self, batch: &[String]) -> Vec<String> {
            let mut reply: Vec<String> = batch
                .iter()
                .filter(|name| !name.ends_with('3'))
                .cloned()
                .collect();
            reply.push("Invented".to_string());
            reply
        }
    }

    let source = SyntheticSource::sized(300);
    let sampler = AdaptiveSampler::new(&source, &every_seventh_rejected, SamplerConfig::default())
        .with_classifier(&Mischievous);
    let outcome = sampler
        .fetch_until_sufficient(&us(), Gender::Male, 10_000)
        .expect("sampling succeeds");

    assert!(!outcome.names.iter().any(|name| name == "Invented"));
    assert!(outcome.names.iter().all(|name| !name.ends_with('3') && !name.ends_with('7')));
    assert_eq!(outcome.locally_rejected, 30);
    assert_eq!(outcome.externally_rejected, 30);
    assert_eq!(outcome.names.len(), 240);
}

#[test]
fn classifier_mode_caps_each_request() {
    let source = SyntheticSource::unbounded();
    let accept_all = |_: &str| true;
    let keep_all = KeepAll;
    let sampler = AdaptiveSampler::new(&source, &accept_all, SamplerConfig::default())
        .with_classifier(&keep_all);
    sampler
        .fetch_until_sufficient(&us(), Gender::Male, 5000)
        .expect("sampling succeeds");

    let requests = source.requests.lock().expect("request mutex");
    assert!(requests
        .windows(2)
        .all(|pair| pair[1] - pair[0] <= SamplerConfig::default().classifier_max_batch));
}

struct KeepAll;

impl NameClassifier for KeepAll {
    fn filter(&self, batch: &[String]) -> Vec<String> {
        batch.to_vec()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn accounting_and_uniqueness_hold(
        size in 0usize..2500,
        period in proptest::option::of(1usize..400),
        target in 1usize..1500,
        modulus in 2usize..9,
    ) {
        let source = SyntheticSource { size, repeat: period, requests: Mutex::new(Vec::new()) };
        let predicate = move |name: &str| {
            let digits: usize = name.trim_start_matches("Name").parse().unwrap_or(0);
            digits % modulus != 0
        };
        let sampler = AdaptiveSampler::new(&source, &predicate, SamplerConfig::default());
        let outcome = sampler.fetch_until_sufficient(&us(), Gender::Male, target).expect("sampling succeeds");

        prop_assert!(outcome.names.len() <= target);
        prop_assert_eq!(
            outcome.fetched,
            outcome.names.len() + outcome.locally_rejected + outcome.externally_rejected
        );
        let distinct: HashSet<&String> = outcome.names.iter().collect();
        prop_assert_eq!(distinct.len(), outcome.names.len());
        prop_assert!(outcome.names.iter().all(|name| predicate(name)));
    }
}
