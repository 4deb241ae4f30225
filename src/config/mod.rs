use crate::curation::classifier::{OpenRouterConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::curation::domain::{default_countries, unique_countries, CountryCode, InvalidCountryCode};
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub names: NamesConfig,
    pub classifier: ClassifierConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let countries = match env::var("NAMES_COUNTRIES") {
            Ok(raw) => parse_countries(&raw)?,
            Err(_) => default_countries(),
        };

        let max_workers = env::var("NAMES_MAX_WORKERS")
            .unwrap_or_else(|_| "4".to_string())
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|workers| *workers > 0)
            .ok_or(ConfigError::InvalidWorkers)?;

        let names = NamesConfig {
            authority_path: path_var("NAMES_AUTHORITY_PATH", "data/authority.csv"),
            input_dir: path_var("NAMES_INPUT_DIR", "data/source"),
            output_dir: path_var("NAMES_OUTPUT_DIR", "data/extended-dataset"),
            countries,
            max_workers,
        };

        let classifier = ClassifierConfig {
            api_key: env::var("OPENROUTER_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            model: env::var("OPENROUTER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            endpoint: env::var("OPENROUTER_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            names,
            classifier,
        })
    }
}

fn path_var(key: &str, default: &str) -> PathBuf {
    PathBuf::from(env::var(key).unwrap_or_else(|_| default.to_string()))
}

/// Parses a comma-separated country list such as `US, gb,DE`. Repeated
/// codes are dropped.
pub fn parse_countries(raw: &str) -> Result<Vec<CountryCode>, ConfigError> {
    let countries = raw
        .split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| {
            code.parse::<CountryCode>()
                .map_err(|source| ConfigError::InvalidCountry { source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if countries.is_empty() {
        return Err(ConfigError::NoCountries);
    }
    Ok(unique_countries(countries))
}

/// Where the data lives and how much of it to process at once.
#[derive(Debug, Clone)]
pub struct NamesConfig {
    pub authority_path: PathBuf,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub countries: Vec<CountryCode>,
    pub max_workers: usize,
}

/// Credentials and model selection for the optional name classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
}

impl ClassifierConfig {
    pub fn openrouter(&self) -> Result<OpenRouterConfig, ConfigError> {
        let api_key = self.api_key.clone().ok_or(ConfigError::MissingApiKey)?;
        let mut config = OpenRouterConfig::new(api_key);
        config.model = self.model.clone();
        config.endpoint = self.endpoint.clone();
        Ok(config)
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidWorkers,
    InvalidCountry { source: InvalidCountryCode },
    NoCountries,
    MissingApiKey,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidWorkers => {
                write!(f, "NAMES_MAX_WORKERS must be a positive integer")
            }
            ConfigError::InvalidCountry { source } => {
                write!(f, "NAMES_COUNTRIES contains an invalid entry: {source}")
            }
            ConfigError::NoCountries => write!(f, "at least one country code is required"),
            ConfigError::MissingApiKey => write!(
                f,
                "the AI classifier needs OPENROUTER_API_KEY or --ai-api-key"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidCountry { source } => Some(source),
            ConfigError::InvalidWorkers | ConfigError::NoCountries | ConfigError::MissingApiKey => {
                None
            }
        }
    }
}
