//! Runs one job per country on a bounded pool of blocking workers.

use super::domain::{unique_countries, CountryCode};
use super::rows::RowError;
use super::source::SourceError;
use super::stats::CountryStats;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

const BAR_TEMPLATE: &str =
    "{spinner:.green} {prefix:>3} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("input file not found: {}", path.display())]
    MissingInput { path: PathBuf },
    #[error(transparent)]
    Rows(#[from] RowError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("worker pool closed before the job started")]
    PoolClosed,
    #[error("worker panicked: {0}")]
    Panicked(String),
}

/// Outcome of one country's job.
#[derive(Debug)]
pub struct JobReport {
    pub country: CountryCode,
    pub result: Result<CountryStats, JobError>,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// True when there was at least one job and none of them succeeded.
pub fn all_failed(reports: &[JobReport]) -> bool {
    !reports.is_empty() && reports.iter().all(|report| !report.is_success())
}

/// Shared progress surface; one bar per country.
#[derive(Debug, Clone)]
pub struct ProgressHub {
    multi: MultiProgress,
}

impl ProgressHub {
    pub fn new(visible: bool) -> Self {
        let multi = if visible {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };
        Self { multi }
    }

    pub fn hidden() -> Self {
        Self::new(false)
    }

    pub fn job(&self, country: &CountryCode) -> JobProgress {
        let style = ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        let bar = self.multi.add(ProgressBar::new(0));
        bar.set_style(style);
        bar.set_prefix(country.to_string());
        bar.set_message("queued");
        JobProgress { bar }
    }
}

/// A single job's bar. Cloning shares the bar.
#[derive(Debug, Clone)]
pub struct JobProgress {
    bar: ProgressBar,
}

impl JobProgress {
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn set_total(&self, total: u64) {
        self.bar.set_length(total);
    }

    pub fn set_position(&self, position: u64) {
        self.bar.set_position(position);
    }

    pub fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.bar.set_message(message.into());
    }

    pub fn finish(&self, message: impl Into<String>) {
        self.bar.finish_with_message(message.into());
    }

    pub fn abandon(&self, message: impl Into<String>) {
        self.bar.abandon_with_message(message.into());
    }
}

/// Effective worker count: never more than the number of jobs, never zero.
pub fn effective_workers(max_workers: usize, jobs: usize) -> usize {
    max_workers.min(jobs).max(1)
}

/// Runs `job` once per country with at most `max_workers` running at a time.
///
/// Reports come back in the order of `countries`, one per distinct code. A
/// failing or panicking job never affects its siblings.
pub async fn run_jobs<F>(
    countries: &[CountryCode],
    max_workers: usize,
    progress: &ProgressHub,
    job: F,
) -> Vec<JobReport>
where
    F: Fn(&CountryCode, &JobProgress) -> Result<CountryStats, JobError> + Send + Sync + 'static,
{
    let countries = unique_countries(countries.iter().cloned());
    let workers = effective_workers(max_workers, countries.len());
    let semaphore = Arc::new(Semaphore::new(workers));
    let job = Arc::new(job);
    info!(jobs = countries.len(), workers, "starting jobs");

    let bars: Vec<JobProgress> = countries.iter().map(|country| progress.job(country)).collect();

    let mut handles = Vec::with_capacity(countries.len());
    for (country, bar) in countries.iter().zip(bars) {
        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                handles.push((country.clone(), bar, None));
                continue;
            }
        };

        let job = Arc::clone(&job);
        let task_country = country.clone();
        let task_bar = bar.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            task_bar.set_message("running");
            job(&task_country, &task_bar)
        });
        handles.push((country.clone(), bar, Some(handle)));
    }

    let mut reports = Vec::with_capacity(handles.len());
    for (country, bar, handle) in handles {
        let result = match handle {
            Some(handle) => match handle.await {
                Ok(result) => result,
                Err(err) => Err(JobError::Panicked(err.to_string())),
            },
            None => Err(JobError::PoolClosed),
        };

        match &result {
            Ok(stats) => {
                bar.finish("done");
                info!(%country, total = stats.total, valid = stats.valid, "job finished");
            }
            Err(err) => {
                bar.abandon("failed");
                warn!(%country, error = %err, "job failed");
            }
        }
        reports.push(JobReport { country, result });
    }

    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn codes(raw: &[&str]) -> Vec<CountryCode> {
        raw.iter()
            .map(|code| code.parse().expect("valid code"))
            .collect()
    }

    #[test]
    fn worker_count_is_bounded_by_jobs() {
        assert_eq!(effective_workers(4, 2), 2);
        assert_eq!(effective_workers(4, 7), 4);
        assert_eq!(effective_workers(0, 3), 1);
    }

    #[tokio::test]
    async fn reports_keep_caller_order_and_isolate_failures() {
        let countries = codes(&["US", "GB", "DE"]);
        let reports = run_jobs(&countries, 2, &ProgressHub::hidden(), |country, _| {
            match country.as_str() {
                "GB" => panic!("boom"),
                "DE" => Err(JobError::MissingInput {
                    path: PathBuf::from("DE.csv"),
                }),
                _ => {
                    let mut stats = CountryStats::default();
                    stats.record_valid(None);
                    Ok(stats)
                }
            }
        })
        .await;

        let order: Vec<&str> = reports.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(order, vec!["US", "GB", "DE"]);
        assert!(reports[0].is_success());
        assert!(matches!(reports[1].result, Err(JobError::Panicked(_))));
        assert!(matches!(
            reports[2].result,
            Err(JobError::MissingInput { .. })
        ));
        assert!(!all_failed(&reports));
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_worker_cap() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let countries = codes(&["US", "GB", "DE", "FR", "IT", "ES", "IE"]);

        let job_running = Arc::clone(&running);
        let job_peak = Arc::clone(&peak);
        let reports = run_jobs(&countries, 2, &ProgressHub::hidden(), move |_, _| {
            let now = job_running.fetch_add(1, Ordering::SeqCst) + 1;
            job_peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            job_running.fetch_sub(1, Ordering::SeqCst);
            Ok(CountryStats::default())
        })
        .await;

        assert_eq!(reports.len(), 7);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn repeated_countries_run_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let job_calls = Arc::clone(&calls);
        let reports = run_jobs(&codes(&["US", "GB", "US"]), 4, &ProgressHub::hidden(), move |_, _| {
            job_calls.fetch_add(1, Ordering::SeqCst);
            Ok(CountryStats::default())
        })
        .await;

        let order: Vec<&str> = reports.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(order, vec!["US", "GB"]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn all_failed_requires_at_least_one_job() {
        assert!(!all_failed(&[]));
        let reports = vec![JobReport {
            country: "US".parse().expect("valid code"),
            result: Err(JobError::PoolClosed),
        }];
        assert!(all_failed(&reports));
    }
}
