use clap::{Args, Parser, Subcommand};
use name_curator::config::{AppConfig, NamesConfig};
use name_curator::curation::classifier::{NameClassifier, OpenRouterClassifier};
use name_curator::curation::cleaning::CleaningJob;
use name_curator::curation::generation::GenerationJob;
use name_curator::curation::local::LocalNameFilter;
use name_curator::curation::orchestrator::{all_failed, run_jobs, JobReport, ProgressHub};
use name_curator::curation::registry::PatternRegistry;
use name_curator::curation::report::{CurationReport, Direction};
use name_curator::curation::source::{AuthorityIndex, NameSource};
use name_curator::curation::stats::StatsAggregator;
use name_curator::curation::domain::unique_countries;
use name_curator::curation::{CountryCode, ValidationConfig};
use name_curator::error::AppError;
use name_curator::telemetry;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "name-curator",
    about = "Clean and generate per-country first-name datasets",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter existing `<CC>.csv` row files through the name validator
    Clean(CleanArgs),
    /// Build `<CC>.csv` row files from the most frequent valid names
    Generate(GenerateArgs),
}

#[derive(Args, Debug, Default)]
struct SharedArgs {
    /// Override the configured output directory
    #[arg(long)]
    output: Option<PathBuf>,
    /// Countries to process (e.g. `-c US GB` or `-c US,GB`)
    #[arg(short = 'c', long, num_args = 1.., value_delimiter = ',')]
    countries: Vec<CountryCode>,
    /// Maximum number of countries processed at once
    #[arg(long)]
    workers: Option<usize>,
    /// Override the configured name authority CSV
    #[arg(long)]
    authority: Option<PathBuf>,
    /// Also write the summary as JSON to this file
    #[arg(long)]
    report_json: Option<PathBuf>,
    /// Hide progress bars
    #[arg(long)]
    quiet: bool,
}

impl SharedArgs {
    fn apply(&mut self, names: &mut NamesConfig) {
        if let Some(output) = self.output.take() {
            names.output_dir = output;
        }
        if !self.countries.is_empty() {
            names.countries = unique_countries(std::mem::take(&mut self.countries));
        }
        if let Some(workers) = self.workers.take() {
            names.max_workers = workers.max(1);
        }
        if let Some(authority) = self.authority.take() {
            names.authority_path = authority;
        }
    }
}

#[derive(Args, Debug)]
struct CleanArgs {
    /// Override the configured input directory
    #[arg(long)]
    input: Option<PathBuf>,
    /// Shortest accepted name, in characters
    #[arg(long, default_value_t = 3)]
    min_length: usize,
    /// Longest accepted name, in characters
    #[arg(long, default_value_t = 20)]
    max_length: usize,
    /// Largest accepted popularity rank
    #[arg(long, default_value_t = 5000)]
    rank_ceiling: u32,
    #[command(flatten)]
    shared: SharedArgs,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Names to collect per gender and country
    #[arg(short = 'n', long = "names", default_value_t = 250)]
    names_per_gender: usize,
    /// Shortest accepted name, in characters
    #[arg(long, default_value_t = 3)]
    min_length: usize,
    /// Longest accepted name, in characters
    #[arg(long, default_value_t = 20)]
    max_length: usize,
    /// Run candidates through the AI classifier as well
    #[arg(long)]
    use_ai: bool,
    /// Override OPENROUTER_API_KEY
    #[arg(long)]
    ai_api_key: Option<String>,
    /// Override OPENROUTER_MODEL
    #[arg(long)]
    ai_model: Option<String>,
    #[command(flatten)]
    shared: SharedArgs,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Clean(args) => run_clean(args).await,
        Command::Generate(args) => run_generate(args).await,
    }
}

async fn run_clean(mut args: CleanArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    args.shared.apply(&mut config.names);
    if let Some(input) = args.input.take() {
        config.names.input_dir = input;
    }
    telemetry::init(&config.telemetry)?;

    let validation = ValidationConfig {
        min_length: args.min_length,
        max_length: args.max_length,
        rank_ceiling: args.rank_ceiling,
        skip_length_check: false,
    };
    info!(
        ?config.environment,
        input = %config.names.input_dir.display(),
        output = %config.names.output_dir.display(),
        ?validation,
        "cleaning datasets"
    );

    let source = load_authority(&config.names.authority_path)?;
    let job = CleaningJob::new(
        Arc::new(PatternRegistry::standard()),
        source,
        validation,
        config.names.input_dir.clone(),
        config.names.output_dir.clone(),
    );

    let stats = StatsAggregator::new();
    let progress = ProgressHub::new(!args.shared.quiet);
    let reports = run_jobs(
        &config.names.countries,
        config.names.max_workers,
        &progress,
        move |country, bar| job.run(country, bar),
    )
    .await;

    for report in &reports {
        if let Ok(country_stats) = &report.result {
            stats.merge(&report.country, country_stats);
        }
    }

    finish(
        Direction::Cleaning,
        &reports,
        &stats,
        args.shared.report_json.as_deref(),
    )
}

async fn run_generate(mut args: GenerateArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    args.shared.apply(&mut config.names);
    if let Some(key) = args.ai_api_key.take() {
        config.classifier.api_key = Some(key);
    }
    if let Some(model) = args.ai_model.take() {
        config.classifier.model = model;
    }
    telemetry::init(&config.telemetry)?;

    info!(
        ?config.environment,
        output = %config.names.output_dir.display(),
        names_per_gender = args.names_per_gender,
        min_length = args.min_length,
        max_length = args.max_length,
        use_ai = args.use_ai,
        "generating datasets"
    );

    let source = load_authority(&config.names.authority_path)?;
    let stats = Arc::new(StatsAggregator::new());
    let mut job = GenerationJob::new(
        source,
        args.names_per_gender,
        config.names.output_dir.clone(),
        Arc::clone(&stats),
    )
    .with_filter(LocalNameFilter::new(args.min_length, args.max_length));

    if args.use_ai {
        let classifier: Arc<dyn NameClassifier> =
            Arc::new(OpenRouterClassifier::new(config.classifier.openrouter()?));
        info!(model = %config.classifier.model, "AI classifier enabled");
        job = job.with_classifier(classifier);
    }

    let progress = ProgressHub::new(!args.shared.quiet);
    let reports = run_jobs(
        &config.names.countries,
        config.names.max_workers,
        &progress,
        move |country, bar| job.run(country, bar),
    )
    .await;

    finish(
        Direction::Generation,
        &reports,
        &stats,
        args.shared.report_json.as_deref(),
    )
}

fn load_authority(path: &Path) -> Result<Arc<dyn NameSource>, AppError> {
    let index = AuthorityIndex::from_path(path)?;
    info!(path = %path.display(), names = index.len(), "name authority loaded");
    Ok(Arc::new(index))
}

fn finish(
    direction: Direction,
    reports: &[JobReport],
    stats: &StatsAggregator,
    report_json: Option<&Path>,
) -> Result<(), AppError> {
    let report = CurationReport::build(direction, reports, stats);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    report.write_text(&mut out)?;
    out.flush()?;

    if let Some(path) = report_json {
        report.write_json(path)?;
        info!(path = %path.display(), "json report written");
    }

    if all_failed(reports) {
        return Err(AppError::AllJobsFailed {
            failed: reports.len(),
        });
    }

    info!(
        direction = direction.label(),
        succeeded = reports.len() - report.failures.len(),
        failed = report.failures.len(),
        "run complete"
    );
    Ok(())
}
