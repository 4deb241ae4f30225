//! Classifier-independent heuristics applied to a raw frequency ranking
//! before any of its names are written to a country/gender file.

use super::registry::SuspiciousShape;
use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_INITIALS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{Lu}\.(?:\p{Lu}\.?)?").expect("static pattern compiles"));

const VOWELS: &str = "aeiouyàáâãäåæèéêëìíîïòóôõöøœùúûüýÿ";

const DOUBLED_VOWEL_ENDINGS: &[&str] = &["aa", "ii", "uu"];
const DOUBLED_VOWEL_INFIXES: &[&str] = &["ii", "uu"];
const DOUBLED_VOWEL_EXCEPTIONS: &[&str] = &["hawaii", "kiiara"];

const GENERIC_TOKENS: &[&str] = &[
    "admin",
    "anonymous",
    "baby",
    "bro",
    "dummy",
    "guest",
    "inconnu",
    "madame",
    "mister",
    "monsieur",
    "none",
    "null",
    "personne",
    "rien",
    "test",
    "umm",
    "unknown",
    "user",
];

const REDUPLICATED_NICKNAMES: &[&str] = &[
    "bibi", "coco", "dede", "didi", "fifi", "gigi", "jojo", "kiki", "lolo", "lulu", "mimi",
    "momo", "nini", "nono", "riri", "titi", "toto", "zaza",
];

const CLIPPED_FORMS: &[&str] = &["cath", "fab", "flo", "greg", "manu", "nico", "seb", "steph", "val"];

const DIMINUTIVES: &[&str] = &[
    "bichette",
    "choupette",
    "chouchou",
    "doudou",
    "loulou",
    "minou",
    "nounou",
    "petit",
    "ptit",
];

/// Rule that turned a name down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalRule {
    Length,
    Digit,
    Character,
    Edge,
    RepeatedSeparator,
    Initials,
    TrailingPeriod,
    ShortUppercase,
    RepeatedCharacter,
    NoVowel,
    DoubledVowel,
    Blacklisted,
}

impl LocalRule {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Length => "length",
            Self::Digit => "digit",
            Self::Character => "character",
            Self::Edge => "edge",
            Self::RepeatedSeparator => "repeated_separator",
            Self::Initials => "initials",
            Self::TrailingPeriod => "trailing_period",
            Self::ShortUppercase => "short_uppercase",
            Self::RepeatedCharacter => "repeated_character",
            Self::NoVowel => "no_vowel",
            Self::DoubledVowel => "doubled_vowel",
            Self::Blacklisted => "blacklisted",
        }
    }
}

/// Accept/reject decision over one raw name.
pub trait NamePredicate: Send + Sync {
    fn accepts(&self, name: &str) -> bool;
}

impl<F> NamePredicate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn accepts(&self, name: &str) -> bool {
        self(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNameFilter {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for LocalNameFilter {
    fn default() -> Self {
        Self {
            min_length: 3,
            max_length: 20,
        }
    }
}

impl LocalNameFilter {
    pub fn new(min_length: usize, max_length: usize) -> Self {
        Self {
            min_length,
            max_length,
        }
    }

    /// Surrounding whitespace is ignored.
    pub fn check(&self, raw: &str) -> Result<(), LocalRule> {
        let name = raw.trim();
        let chars: Vec<char> = name.chars().collect();

        if chars.len() < self.min_length || chars.len() > self.max_length {
            return Err(LocalRule::Length);
        }
        if chars.iter().any(|c| c.is_numeric()) {
            return Err(LocalRule::Digit);
        }
        if !chars.iter().all(|c| c.is_alphabetic() || is_separator(*c)) {
            return Err(LocalRule::Character);
        }
        if LEADING_INITIALS.is_match(name) {
            return Err(LocalRule::Initials);
        }
        if name.ends_with('.') {
            return Err(LocalRule::TrailingPeriod);
        }
        let alphabetic_edges = matches!(
            (chars.first(), chars.last()),
            (Some(first), Some(last)) if first.is_alphabetic() && last.is_alphabetic()
        );
        if !alphabetic_edges {
            return Err(LocalRule::Edge);
        }
        if chars
            .windows(2)
            .any(|pair| is_separator(pair[0]) && is_separator(pair[1]))
        {
            return Err(LocalRule::RepeatedSeparator);
        }
        if chars.len() <= 4 && chars.iter().all(|c| c.is_uppercase()) {
            return Err(LocalRule::ShortUppercase);
        }

        let lowered = name.to_lowercase();
        if SuspiciousShape::RepeatedCharacter.matches(&lowered) {
            return Err(LocalRule::RepeatedCharacter);
        }
        if !lowered.chars().any(|c| VOWELS.contains(c)) {
            return Err(LocalRule::NoVowel);
        }
        if has_doubled_vowel(&lowered) {
            return Err(LocalRule::DoubledVowel);
        }
        if is_blacklisted(&lowered) {
            return Err(LocalRule::Blacklisted);
        }

        Ok(())
    }

    pub fn is_valid(&self, name: &str) -> bool {
        self.check(name).is_ok()
    }
}

impl NamePredicate for LocalNameFilter {
    fn accepts(&self, name: &str) -> bool {
        self.is_valid(name)
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, '-' | '\'' | '.' | ' ')
}

fn has_doubled_vowel(lowered: &str) -> bool {
    if DOUBLED_VOWEL_EXCEPTIONS.contains(&lowered) {
        return false;
    }
    DOUBLED_VOWEL_ENDINGS
        .iter()
        .any(|ending| lowered.ends_with(ending))
        || DOUBLED_VOWEL_INFIXES
            .iter()
            .any(|infix| lowered.contains(infix))
}

fn is_blacklisted(lowered: &str) -> bool {
    [GENERIC_TOKENS, REDUPLICATED_NICKNAMES, CLIPPED_FORMS, DIMINUTIVES]
        .iter()
        .any(|set| set.contains(&lowered))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_valid(name: &str) -> bool {
        LocalNameFilter::default().is_valid(name)
    }

    #[test]
    fn accepts_common_first_names() {
        for name in [
            "John",
            "Mary",
            "Alexander",
            "Elizabeth",
            "Jean-Claude",
            "O'Malley",
            "Anne-Marie",
            "Mary-Jane",
            "José",
            "Muhammad",
            "Aisha",
            "João",
            "Marie-Louise",
            "Aaron",
            "Amy",
            "Leo",
            "Nebuchadnezzar",
            "D'Angelo",
        ] {
            assert!(is_valid(name), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_length_outliers() {
        for name in ["", "x", "Al", "Jo", "ABCDEFGHIJKLMNOPQRSTU"] {
            assert_eq!(LocalNameFilter::default().check(name), Err(LocalRule::Length));
        }
    }

    #[test]
    fn zero_minimum_still_rejects_blank_names() {
        let filter = LocalNameFilter::new(0, 20);
        for name in ["", "   "] {
            assert_eq!(filter.check(name), Err(LocalRule::Edge), "{name:?}");
        }
        assert_eq!(filter.check("John"), Ok(()));
    }

    #[test]
    fn rejects_initials_abbreviations_and_digits() {
        let filter = LocalNameFilter::default();
        assert_eq!(filter.check("A.J."), Err(LocalRule::Initials));
        assert_eq!(filter.check("A.J"), Err(LocalRule::Initials));
        assert_eq!(filter.check("Jos."), Err(LocalRule::TrailingPeriod));
        assert_eq!(filter.check("Geo."), Err(LocalRule::TrailingPeriod));
        assert_eq!(filter.check("Sam123"), Err(LocalRule::Digit));
        assert_eq!(filter.check("John@Doe"), Err(LocalRule::Character));
        assert_eq!(filter.check("JRB"), Err(LocalRule::ShortUppercase));
    }

    #[test]
    fn rejects_bad_separators() {
        let filter = LocalNameFilter::default();
        assert_eq!(filter.check("Jean--Claude"), Err(LocalRule::RepeatedSeparator));
        assert_eq!(filter.check("O''Malley"), Err(LocalRule::RepeatedSeparator));
        for name in ["-John", "John-", "'John", "John'"] {
            assert_eq!(filter.check(name), Err(LocalRule::Edge), "{name}");
        }
    }

    #[test]
    fn rejects_vowel_heuristics() {
        let filter = LocalNameFilter::default();
        assert_eq!(filter.check("Brrr"), Err(LocalRule::NoVowel));
        assert_eq!(filter.check("Pst"), Err(LocalRule::NoVowel));
        assert_eq!(filter.check("Evaa"), Err(LocalRule::DoubledVowel));
        assert_eq!(filter.check("Claraa"), Err(LocalRule::DoubledVowel));
        assert_eq!(filter.check("Sabriina"), Err(LocalRule::DoubledVowel));
        assert_eq!(filter.check("eeee"), Err(LocalRule::RepeatedCharacter));
        assert!(filter.is_valid("Hawaii"));
    }

    #[test]
    fn rejects_literal_blacklists() {
        for name in ["Rien", "Bro", "Admin", "Toto", "Momo", "Umm", "Seb", "Loulou"] {
            assert!(!is_valid(name), "{name} should be rejected");
        }
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert!(is_valid("  John  "));
        assert!(is_valid("\tMary\n"));
        assert!(!is_valid("  Al  "));
        assert!(!is_valid("  A.J.  "));
    }

    #[test]
    fn closures_are_predicates() {
        let always = |_: &str| true;
        assert!(NamePredicate::accepts(&always, "anything"));
    }
}
