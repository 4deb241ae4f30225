use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Gender column of the row schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    /// Processing order inside a generation job.
    pub const fn ordered() -> [Self; 2] {
        [Self::Male, Self::Female]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }

    /// Accepts `M`/`F` in either case; anything else is not a gender code.
    pub fn from_code(raw: &str) -> Option<Self> {
        match raw {
            "M" | "m" => Some(Self::Male),
            "F" | "f" => Some(Self::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Upper-case ISO 3166-1 alpha-2 code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a two-letter country code")]
pub struct InvalidCountryCode(pub String);

impl FromStr for CountryCode {
    type Err = InvalidCountryCode;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(InvalidCountryCode(raw.to_string()))
        }
    }
}

impl TryFrom<String> for CountryCode {
    type Error = InvalidCountryCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CountryCode> for String {
    fn from(value: CountryCode) -> Self {
        value.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Countries the shipped datasets cover.
pub const DEFAULT_COUNTRIES: [&str; 7] = ["US", "GB", "DE", "FR", "IT", "ES", "IE"];

pub fn default_countries() -> Vec<CountryCode> {
    DEFAULT_COUNTRIES
        .iter()
        .map(|code| CountryCode(code.to_string()))
        .collect()
}

/// Drops repeated codes, keeping the first occurrence of each.
pub fn unique_countries<I: IntoIterator<Item = CountryCode>>(countries: I) -> Vec<CountryCode> {
    let mut seen = std::collections::HashSet::new();
    countries
        .into_iter()
        .filter(|country| seen.insert(country.clone()))
        .collect()
}

/// A name evaluated for one country/gender file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub gender: Gender,
    pub country: CountryCode,
}

impl Candidate {
    pub fn new(name: impl Into<String>, gender: Gender, country: CountryCode) -> Self {
        Self {
            name: name.into(),
            gender,
            country,
        }
    }
}

/// Closed set of reasons a candidate or row can be filtered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    JokeName,
    NotFirstName,
    CountryBlacklisted,
    SuspiciousPattern,
    TooShort,
    TooLong,
    NonLatinScript,
    InvalidCharacters,
    InvalidFormat,
    TooManyParts,
    InvalidCapitalization,
    NotFound,
    CountryMismatch,
    GenderMismatch,
    TooRare,
    InvalidCsvFormat,
    InvalidGender,
    LocalFilter,
    ClassifierFilter,
}

impl RejectionReason {
    pub const fn code(self) -> &'static str {
        match self {
            Self::JokeName => "joke_name",
            Self::NotFirstName => "not_first_name",
            Self::CountryBlacklisted => "country_blacklisted",
            Self::SuspiciousPattern => "suspicious_pattern",
            Self::TooShort => "too_short",
            Self::TooLong => "too_long",
            Self::NonLatinScript => "non_latin_script",
            Self::InvalidCharacters => "invalid_characters",
            Self::InvalidFormat => "invalid_format",
            Self::TooManyParts => "too_many_parts",
            Self::InvalidCapitalization => "invalid_capitalization",
            Self::NotFound => "not_found",
            Self::CountryMismatch => "country_mismatch",
            Self::GenderMismatch => "gender_mismatch",
            Self::TooRare => "too_rare",
            Self::InvalidCsvFormat => "invalid_csv_format",
            Self::InvalidGender => "invalid_gender",
            Self::LocalFilter => "local_filter",
            Self::ClassifierFilter => "classifier_filter",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of running one candidate through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationOutcome {
    Accepted,
    Rejected(RejectionReason),
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}
