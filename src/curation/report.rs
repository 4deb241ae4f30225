//! Summary views emitted once every job has finished.

use super::domain::{CountryCode, Gender, RejectionReason};
use super::orchestrator::JobReport;
use super::stats::{CountryStats, StatsAggregator};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

const TOP_REASONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Cleaning,
    Generation,
}

impl Direction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cleaning => "Cleaning",
            Self::Generation => "Generation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasonCount {
    pub reason: RejectionReason,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountrySummary {
    pub country: CountryCode,
    pub total: u64,
    pub valid: u64,
    pub filtered: u64,
    pub keep_rate: f64,
    pub male: u64,
    pub female: u64,
    pub top_reasons: Vec<ReasonCount>,
    pub reasons: Vec<ReasonCount>,
}

impl CountrySummary {
    pub fn from_stats(country: CountryCode, stats: &CountryStats) -> Self {
        let reasons: Vec<ReasonCount> = stats
            .top_reasons(usize::MAX)
            .into_iter()
            .map(|(reason, count)| ReasonCount { reason, count })
            .collect();
        Self {
            country,
            total: stats.total,
            valid: stats.valid,
            filtered: stats.filtered,
            keep_rate: stats.keep_rate(),
            male: stats.valid_for(Gender::Male),
            female: stats.valid_for(Gender::Female),
            top_reasons: reasons.iter().take(TOP_REASONS).cloned().collect(),
            reasons,
        }
    }

    pub fn count_for(&self, reason: RejectionReason) -> u64 {
        self.reasons
            .iter()
            .find(|entry| entry.reason == reason)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedJob {
    pub country: CountryCode,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurationReport {
    pub direction: Direction,
    pub generated_at: DateTime<Utc>,
    pub countries: Vec<CountrySummary>,
    pub failures: Vec<FailedJob>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

impl CurationReport {
    /// Builds the report in the order of `reports`, which follows the
    /// caller's country list. Failed countries appear only as failures.
    pub fn build(direction: Direction, reports: &[JobReport], stats: &StatsAggregator) -> Self {
        let mut countries = Vec::new();
        let mut failures = Vec::new();

        for report in reports {
            match &report.result {
                Ok(_) => {
                    let country_stats = stats.get(&report.country).unwrap_or_default();
                    countries.push(CountrySummary::from_stats(
                        report.country.clone(),
                        &country_stats,
                    ));
                }
                Err(err) => failures.push(FailedJob {
                    country: report.country.clone(),
                    reason: err.to_string(),
                }),
            }
        }

        Self {
            direction,
            generated_at: Utc::now(),
            countries,
            failures,
        }
    }

    pub fn write_text<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self.direction {
            Direction::Cleaning => self.write_cleaning(out)?,
            Direction::Generation => self.write_generation(out)?,
        }

        if !self.failures.is_empty() {
            writeln!(out)?;
            for failure in &self.failures {
                writeln!(out, "✗ {} failed: {}", failure.country, failure.reason)?;
            }
        }
        Ok(())
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ReportError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    fn write_cleaning<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for summary in &self.countries {
            if summary.top_reasons.is_empty() {
                continue;
            }
            writeln!(out, "\n{} filter reasons", summary.country)?;
            for entry in &summary.top_reasons {
                writeln!(out, "  {}: {}", entry.reason, grouped(entry.count))?;
            }
        }

        writeln!(out, "\nCleaning summary")?;
        writeln!(
            out,
            "{:<8} {:>12} {:>12} {:>12} {:>10}  {}",
            "Country", "Total", "Valid", "Filtered", "Keep Rate", "Top Filter Reason"
        )?;
        for summary in &self.countries {
            let top = summary
                .top_reasons
                .first()
                .map(|entry| entry.reason.code())
                .unwrap_or("-");
            writeln!(
                out,
                "{:<8} {:>12} {:>12} {:>12} {:>9.1}%  {}",
                summary.country.as_str(),
                grouped(summary.total),
                grouped(summary.valid),
                grouped(summary.filtered),
                summary.keep_rate,
                top
            )?;
        }

        writeln!(out, "\nDetailed filter reasons")?;
        writeln!(out, "{:<8} {:<24} {:>12}", "Country", "Reason", "Count")?;
        for summary in &self.countries {
            for entry in &summary.reasons {
                writeln!(
                    out,
                    "{:<8} {:<24} {:>12}",
                    summary.country.as_str(),
                    entry.reason.code(),
                    grouped(entry.count)
                )?;
            }
        }
        Ok(())
    }

    fn write_generation<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "\nGeneration summary")?;
        writeln!(
            out,
            "{:<8} {:>8} {:>8} {:>8} {:>10} {:>15} {:>20}",
            "Country", "Male", "Female", "Total", "Fetched", "Local filtered", "Classifier filtered"
        )?;
        for summary in &self.countries {
            writeln!(
                out,
                "{:<8} {:>8} {:>8} {:>8} {:>10} {:>15} {:>20}",
                summary.country.as_str(),
                grouped(summary.male),
                grouped(summary.female),
                grouped(summary.valid),
                grouped(summary.total),
                grouped(summary.count_for(RejectionReason::LocalFilter)),
                grouped(summary.count_for(RejectionReason::ClassifierFilter)),
            )?;
        }
        Ok(())
    }
}

/// `1234567` -> `1,234,567`.
fn grouped(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curation::orchestrator::JobError;
    use std::path::PathBuf;

    fn code(raw: &str) -> CountryCode {
        raw.parse().expect("valid code")
    }

    fn sample() -> (Vec<JobReport>, StatsAggregator) {
        let aggregator = StatsAggregator::new();
        let mut us = CountryStats::default();
        for _ in 0..3 {
            us.record_valid(Some(Gender::Male));
        }
        us.record_filtered(RejectionReason::TooRare);
        aggregator.merge(&code("US"), &us);

        let reports = vec![
            JobReport {
                country: code("DE"),
                result: Err(JobError::MissingInput {
                    path: PathBuf::from("DE.csv"),
                }),
            },
            JobReport {
                country: code("US"),
                result: Ok(us),
            },
        ];
        (reports, aggregator)
    }

    #[test]
    fn grouped_inserts_thousands_separators() {
        assert_eq!(grouped(0), "0");
        assert_eq!(grouped(999), "999");
        assert_eq!(grouped(1_000), "1,000");
        assert_eq!(grouped(1_234_567), "1,234,567");
    }

    #[test]
    fn cleaning_report_lists_failures_and_keep_rate() {
        let (reports, aggregator) = sample();
        let report = CurationReport::build(Direction::Cleaning, &reports, &aggregator);
        assert_eq!(report.countries.len(), 1);
        assert_eq!(report.failures[0].country, code("DE"));

        let mut out = Vec::new();
        report.write_text(&mut out).expect("render");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("75.0%"));
        assert!(text.contains("too_rare"));
        assert!(text.contains("✗ DE failed: input file not found: DE.csv"));
    }

    #[test]
    fn json_report_carries_direction_and_timestamp() {
        let (reports, aggregator) = sample();
        let report = CurationReport::build(Direction::Generation, &reports, &aggregator);
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.json");
        report.write_json(&path).expect("json written");

        let value: serde_json::Value =
            serde_json::from_reader(std::fs::File::open(&path).expect("open")).expect("parse");
        assert_eq!(value["direction"], "generation");
        assert!(value["generated_at"].is_string());
        assert_eq!(value["countries"][0]["male"], 3);
    }
}
