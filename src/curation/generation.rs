//! Generation direction: sample each gender's ranking until the quota of
//! valid names is met, then write `name,,G,CC` rows.

use super::classifier::NameClassifier;
use super::domain::{CountryCode, Gender, RejectionReason};
use super::local::LocalNameFilter;
use super::orchestrator::{JobError, JobProgress};
use super::rows::{NameRow, StagedRows};
use super::sampler::{AdaptiveSampler, SamplerConfig, SamplingOutcome, Termination};
use super::source::NameSource;
use super::stats::{CountryStats, StatsAggregator};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub struct GenerationJob {
    source: Arc<dyn NameSource>,
    filter: LocalNameFilter,
    classifier: Option<Arc<dyn NameClassifier>>,
    sampler: SamplerConfig,
    names_per_gender: usize,
    output_dir: PathBuf,
    stats: Arc<StatsAggregator>,
}

impl GenerationJob {
    pub fn new(
        source: Arc<dyn NameSource>,
        names_per_gender: usize,
        output_dir: impl Into<PathBuf>,
        stats: Arc<StatsAggregator>,
    ) -> Self {
        Self {
            source,
            filter: LocalNameFilter::default(),
            classifier: None,
            sampler: SamplerConfig::default(),
            names_per_gender,
            output_dir: output_dir.into(),
            stats,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn NameClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_filter(mut self, filter: LocalNameFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn output_path(&self, country: &CountryCode) -> PathBuf {
        self.output_dir.join(format!("{country}.csv"))
    }

    /// Samples both genders for `country` and writes its row file.
    ///
    /// The shared aggregator is updated after each gender; the returned
    /// stats cover this job only.
    pub fn run(&self, country: &CountryCode, progress: &JobProgress) -> Result<CountryStats, JobError> {
        progress.set_total((self.names_per_gender * Gender::ordered().len()) as u64);

        let mut sampler = AdaptiveSampler::new(
            self.source.as_ref(),
            &self.filter,
            self.sampler.clone(),
        );
        if let Some(classifier) = &self.classifier {
            sampler = sampler.with_classifier(classifier.as_ref());
        }

        let mut job_stats = CountryStats::default();
        let mut blocks = Vec::with_capacity(Gender::ordered().len());
        for gender in Gender::ordered() {
            progress.set_message(format!("sampling {}", gender.label()));
            let outcome = sampler.fetch_until_sufficient(country, gender, self.names_per_gender)?;
            if outcome.termination != Termination::QuotaMet {
                warn!(
                    %country,
                    %gender,
                    collected = outcome.names.len(),
                    target = self.names_per_gender,
                    termination = ?outcome.termination,
                    "quota not reached"
                );
            }

            let mut delta = CountryStats::default();
            record_outcome(&mut delta, gender, &outcome);
            self.stats.update(country, |stats| stats.merge(&delta));
            job_stats.merge(&delta);

            progress.inc(outcome.names.len() as u64);
            blocks.push((gender, outcome.names));
        }

        let mut staged = StagedRows::create(self.output_path(country))?;
        for (gender, names) in &blocks {
            for name in names {
                staged
                    .writer()
                    .write_row(&NameRow::first_name_only(name.as_str(), *gender, country.clone()))?;
            }
        }
        staged.commit()?;

        info!(
            %country,
            male = job_stats.valid_for(Gender::Male),
            female = job_stats.valid_for(Gender::Female),
            "country file written"
        );
        Ok(job_stats)
    }
}

fn record_outcome(stats: &mut CountryStats, gender: Gender, outcome: &SamplingOutcome) {
    stats.record_valid_many(Some(gender), outcome.names.len() as u64);
    stats.record_filtered_many(RejectionReason::LocalFilter, outcome.locally_rejected as u64);
    stats.record_filtered_many(
        RejectionReason::ClassifierFilter,
        outcome.externally_rejected as u64,
    );
}
