//! Immutable blacklist and pattern tables consumed by the validation pipeline.
//!
//! A registry is built once and shared read-only (usually behind an `Arc`),
//! so pipelines with different locale tables can coexist in one process.

use super::domain::{CountryCode, DEFAULT_COUNTRIES};
use regex::Regex;
use std::collections::{HashMap, HashSet};

const JOKE_NAMES: &[&str] = &["bredlbroad", "gsichtsbäichl"];

const NOT_FIRST_NAMES: &[&str] = &[
    "unknown",
    "none",
    "anonymous",
    "test",
    "dummy",
    "null",
    "undefined",
    "noname",
];

const LATIN_LETTERS: &str = r"^[\p{L}'\-\. ]+$";

const NAME_FORMATS: &[(&str, &str, &str)] = &[
    ("US", "A-ZÀ-ÖØ-öø-ÿ", "a-zà-öø-ÿ"),
    ("GB", "A-ZÀ-ÖØ-öø-ÿ", "a-zà-öø-ÿ"),
    ("DE", "A-ZÄÖÜ", "a-zäöüß"),
    ("FR", "A-ZÀÂÆÇÉÈÊËÏÎÔÙÛÜŸ", "a-zàâæçéèêëïîôùûüÿ"),
    ("IT", "A-ZÀÈÉÌÒÙ", "a-zàèéìòù"),
    ("ES", "A-ZÁÉÍÓÚÑ", "a-záéíóúñü"),
    ("IE", "A-ZÁÉÍÓÚ", "a-záéíóú"),
];

/// Contiguous code point range of a script that never appears in the
/// supported Latin-alphabet datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptBlock {
    pub name: &'static str,
    pub start: char,
    pub end: char,
}

impl ScriptBlock {
    pub fn contains(&self, c: char) -> bool {
        (self.start..=self.end).contains(&c)
    }
}

pub const DISALLOWED_SCRIPTS: &[ScriptBlock] = &[
    ScriptBlock { name: "Arabic", start: '\u{0600}', end: '\u{06FF}' },
    ScriptBlock { name: "Cyrillic", start: '\u{0400}', end: '\u{04FF}' },
    ScriptBlock { name: "Greek", start: '\u{0370}', end: '\u{03FF}' },
    ScriptBlock { name: "CJK Unified Ideographs", start: '\u{4E00}', end: '\u{9FFF}' },
    ScriptBlock { name: "Hiragana", start: '\u{3040}', end: '\u{309F}' },
    ScriptBlock { name: "Katakana", start: '\u{30A0}', end: '\u{30FF}' },
    ScriptBlock { name: "Hangul", start: '\u{AC00}', end: '\u{D7AF}' },
    ScriptBlock { name: "Thai", start: '\u{0E00}', end: '\u{0E7F}' },
    ScriptBlock { name: "Hebrew", start: '\u{0590}', end: '\u{05FF}' },
    ScriptBlock { name: "Devanagari", start: '\u{0900}', end: '\u{097F}' },
];

/// Name shapes with a very low prior of being a real first name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspiciousShape {
    /// `x`
    SingleCharacter,
    /// `aaa`, three or more of one character.
    RepeatedCharacter,
    /// `aabb`: a run of one character followed by a run of another.
    PairedRuns,
    /// Four or more ASCII consonants and nothing else.
    ConsonantOnly,
}

impl SuspiciousShape {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::SingleCharacter,
            Self::RepeatedCharacter,
            Self::PairedRuns,
            Self::ConsonantOnly,
        ]
    }

    /// `lowered` must already be lower-cased.
    pub fn matches(self, lowered: &str) -> bool {
        let chars: Vec<char> = lowered.chars().collect();
        match self {
            Self::SingleCharacter => chars.len() == 1,
            Self::RepeatedCharacter => {
                chars.len() >= 3 && chars.iter().all(|c| *c == chars[0])
            }
            Self::PairedRuns => paired_runs(&chars),
            Self::ConsonantOnly => {
                chars.len() >= 4 && chars.iter().all(|c| is_ascii_consonant(*c))
            }
        }
    }
}

fn paired_runs(chars: &[char]) -> bool {
    let first = match chars.first() {
        Some(c) => *c,
        None => return false,
    };
    let first_run = chars.iter().take_while(|c| **c == first).count();
    if first_run < 2 || first_run == chars.len() {
        return false;
    }
    let second = chars[first_run];
    let rest = &chars[first_run..];
    rest.len() >= 2 && rest.iter().all(|c| *c == second)
}

fn is_ascii_consonant(c: char) -> bool {
    c.is_ascii_lowercase() && !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Lookup tables for the blacklist, shape and script/format checks.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    joke_names: HashSet<String>,
    not_first_names: HashSet<String>,
    country_blacklists: HashMap<CountryCode, HashSet<String>>,
    suspicious_shapes: Vec<SuspiciousShape>,
    disallowed_scripts: Vec<ScriptBlock>,
    allowed_characters: HashMap<CountryCode, Regex>,
    name_formats: HashMap<CountryCode, Regex>,
}

impl PatternRegistry {
    /// Tables for the seven shipped countries.
    pub fn standard() -> Self {
        let allowed = Regex::new(LATIN_LETTERS).expect("static pattern compiles");

        let mut allowed_characters = HashMap::new();
        let mut country_blacklists = HashMap::new();
        for code in DEFAULT_COUNTRIES {
            let country = country(code);
            allowed_characters.insert(country.clone(), allowed.clone());
            country_blacklists.insert(country, HashSet::new());
        }

        let name_formats = NAME_FORMATS
            .iter()
            .map(|(code, upper, lower)| {
                let pattern = name_format_pattern(upper, lower);
                let regex = Regex::new(&pattern).expect("static pattern compiles");
                (country(code), regex)
            })
            .collect();

        Self {
            joke_names: lowered_set(JOKE_NAMES),
            not_first_names: lowered_set(NOT_FIRST_NAMES),
            country_blacklists,
            suspicious_shapes: SuspiciousShape::ordered().to_vec(),
            disallowed_scripts: DISALLOWED_SCRIPTS.to_vec(),
            allowed_characters,
            name_formats,
        }
    }

    pub fn with_country_blacklist<I, S>(mut self, country: CountryCode, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.country_blacklists
            .entry(country)
            .or_default()
            .extend(names.into_iter().map(|name| name.as_ref().to_lowercase()));
        self
    }

    /// Registers a format with the given upper-case initial and lower-case
    /// body character classes (contents of `[...]`, without brackets).
    pub fn with_name_format(
        mut self,
        country: CountryCode,
        upper: &str,
        lower: &str,
    ) -> Result<Self, regex::Error> {
        let regex = Regex::new(&name_format_pattern(upper, lower))?;
        self.name_formats.insert(country, regex);
        Ok(self)
    }

    pub fn is_joke_name(&self, lowered: &str) -> bool {
        self.joke_names.contains(lowered)
    }

    pub fn is_not_first_name(&self, lowered: &str) -> bool {
        self.not_first_names.contains(lowered)
    }

    pub fn is_country_blacklisted(&self, lowered: &str, country: &CountryCode) -> bool {
        self.country_blacklists
            .get(country)
            .map(|names| names.contains(lowered))
            .unwrap_or(false)
    }

    pub fn suspicious_shape(&self, lowered: &str) -> Option<SuspiciousShape> {
        self.suspicious_shapes
            .iter()
            .copied()
            .find(|shape| shape.matches(lowered))
    }

    pub fn disallowed_script(&self, name: &str) -> Option<&ScriptBlock> {
        name.chars().find_map(|c| {
            self.disallowed_scripts
                .iter()
                .find(|block| block.contains(c))
        })
    }

    pub fn allowed_characters(&self, country: &CountryCode) -> Option<&Regex> {
        self.allowed_characters.get(country)
    }

    pub fn name_format(&self, country: &CountryCode) -> Option<&Regex> {
        self.name_formats.get(country)
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn name_format_pattern(upper: &str, lower: &str) -> String {
    let part = format!(r"[{upper}][{lower}'\-\.]*");
    format!("^{part}(?: {part})*$")
}

fn lowered_set(names: &[&str]) -> HashSet<String> {
    names.iter().map(|name| name.to_lowercase()).collect()
}

fn country(code: &str) -> CountryCode {
    code.parse().expect("static country codes are valid")
}
