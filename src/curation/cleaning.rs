//! Cleaning direction: filter an existing `<CC>.csv` row file through the
//! validation pipeline and keep the rows that pass.

use super::domain::{Candidate, CountryCode, Gender, RejectionReason, ValidationOutcome};
use super::orchestrator::{JobError, JobProgress};
use super::registry::PatternRegistry;
use super::rows::{self, RawRow, RowWriter, StagedRows};
use super::source::NameSource;
use super::stats::CountryStats;
use super::validation::{ValidationConfig, ValidationPipeline};
use csv::ByteRecord;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const PROGRESS_EVERY: u64 = 10_000;

pub struct CleaningJob {
    pipeline: ValidationPipeline,
    source: Arc<dyn NameSource>,
    input_dir: PathBuf,
    output_dir: PathBuf,
    min_length: usize,
    max_length: usize,
}

impl CleaningJob {
    pub fn new(
        registry: Arc<PatternRegistry>,
        source: Arc<dyn NameSource>,
        config: ValidationConfig,
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        let min_length = config.min_length;
        let max_length = config.max_length;
        // The row loop applies the length window itself.
        let pipeline = ValidationPipeline::new(
            registry,
            ValidationConfig {
                skip_length_check: true,
                ..config
            },
        );
        Self {
            pipeline,
            source,
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            min_length,
            max_length,
        }
    }

    pub fn input_path(&self, country: &CountryCode) -> PathBuf {
        country_file(&self.input_dir, country)
    }

    pub fn output_path(&self, country: &CountryCode) -> PathBuf {
        country_file(&self.output_dir, country)
    }

    /// Cleans one country's file into the output directory. The output only
    /// appears once every row has been processed.
    pub fn run(&self, country: &CountryCode, progress: &JobProgress) -> Result<CountryStats, JobError> {
        let input = self.input_path(country);
        if !input.is_file() {
            return Err(JobError::MissingInput { path: input });
        }

        let total = rows::count_lines(&input)?;
        progress.set_total(total);
        info!(%country, rows = total, "cleaning country file");

        let reader = std::fs::File::open(&input).map_err(rows::RowError::from)?;
        let mut staged = StagedRows::create(self.output_path(country))?;
        let stats = self.clean(country, reader, staged.writer(), progress)?;
        staged.commit()?;
        Ok(stats)
    }

    /// Streams rows from `reader`, writing accepted rows unchanged.
    pub fn clean<R: Read, W: Write>(
        &self,
        country: &CountryCode,
        reader: R,
        writer: &mut RowWriter<W>,
        progress: &JobProgress,
    ) -> Result<CountryStats, JobError> {
        let mut stats = CountryStats::default();
        let mut csv_reader = rows::reader_from(reader);
        let mut record = ByteRecord::new();

        while csv_reader
            .read_byte_record(&mut record)
            .map_err(rows::RowError::from)?
        {
            match self.classify_row(country, &record)? {
                Ok(gender) => {
                    writer.write_record(&record)?;
                    stats.record_valid(Some(gender));
                }
                Err(reason) => stats.record_filtered(reason),
            }

            if stats.total % PROGRESS_EVERY == 0 {
                progress.set_position(stats.total);
            }
        }

        progress.set_position(stats.total);
        debug!(%country, total = stats.total, valid = stats.valid, "cleaning pass finished");
        Ok(stats)
    }

    fn classify_row(
        &self,
        country: &CountryCode,
        record: &ByteRecord,
    ) -> Result<Result<Gender, RejectionReason>, JobError> {
        let (first_name, gender) = match RawRow::from_record(record) {
            RawRow::Malformed => return Ok(Err(RejectionReason::InvalidCsvFormat)),
            RawRow::Fields { first_name, gender } => (first_name, gender),
        };

        let length = first_name.chars().count();
        if length < self.min_length {
            return Ok(Err(RejectionReason::TooShort));
        }
        if length > self.max_length {
            return Ok(Err(RejectionReason::TooLong));
        }

        let Some(gender) = Gender::from_code(gender) else {
            return Ok(Err(RejectionReason::InvalidGender));
        };

        let candidate = Candidate::new(first_name.trim(), gender, country.clone());
        Ok(match self.pipeline.validate(&candidate, self.source.as_ref())? {
            ValidationOutcome::Accepted => Ok(gender),
            ValidationOutcome::Rejected(reason) => Err(reason),
        })
    }
}

fn country_file(dir: &Path, country: &CountryCode) -> PathBuf {
    dir.join(format!("{country}.csv"))
}
