use super::ValidationConfig;
use crate::curation::domain::{Candidate, CountryCode, RejectionReason};
use crate::curation::registry::PatternRegistry;
use crate::curation::source::LookupResult;

pub(crate) fn check_blacklists(
    lowered: &str,
    country: &CountryCode,
    registry: &PatternRegistry,
) -> Option<RejectionReason> {
    if registry.is_joke_name(lowered) {
        return Some(RejectionReason::JokeName);
    }
    if registry.is_not_first_name(lowered) {
        return Some(RejectionReason::NotFirstName);
    }
    if registry.is_country_blacklisted(lowered, country) {
        return Some(RejectionReason::CountryBlacklisted);
    }
    None
}

pub(crate) fn check_shape(lowered: &str, registry: &PatternRegistry) -> Option<RejectionReason> {
    registry
        .suspicious_shape(lowered)
        .map(|_| RejectionReason::SuspiciousPattern)
}

pub(crate) fn check_length(name: &str, config: &ValidationConfig) -> Option<RejectionReason> {
    let length = name.chars().count();
    if length < config.min_length {
        Some(RejectionReason::TooShort)
    } else if length > config.max_length {
        Some(RejectionReason::TooLong)
    } else {
        None
    }
}

pub(crate) fn check_character_set(
    name: &str,
    country: &CountryCode,
    registry: &PatternRegistry,
) -> Option<RejectionReason> {
    if registry.disallowed_script(name).is_some() {
        return Some(RejectionReason::NonLatinScript);
    }

    match registry.allowed_characters(country) {
        Some(pattern) if !pattern.is_match(name) => Some(RejectionReason::InvalidCharacters),
        _ => None,
    }
}

pub(crate) fn check_format(
    name: &str,
    country: &CountryCode,
    registry: &PatternRegistry,
) -> Option<RejectionReason> {
    match registry.name_format(country) {
        Some(pattern) if !pattern.is_match(name) => Some(RejectionReason::InvalidFormat),
        _ => None,
    }
}

pub(crate) fn check_double_name(name: &str) -> Option<RejectionReason> {
    if !name.contains(' ') {
        return None;
    }

    let parts: Vec<&str> = name.split_whitespace().collect();
    if parts.len() > 2 {
        return Some(RejectionReason::TooManyParts);
    }

    let all_capitalized = parts
        .iter()
        .all(|part| part.chars().next().map(char::is_uppercase).unwrap_or(false));
    if all_capitalized {
        None
    } else {
        Some(RejectionReason::InvalidCapitalization)
    }
}

pub(crate) fn check_authority(
    candidate: &Candidate,
    lookup: Option<LookupResult>,
    config: &ValidationConfig,
) -> Option<RejectionReason> {
    let Some(record) = lookup.and_then(|result| result.first_name) else {
        return Some(RejectionReason::NotFound);
    };

    if !record.countries.contains(&candidate.country) {
        return Some(RejectionReason::CountryMismatch);
    }

    if record.gender_probability(candidate.gender) < 0.5 {
        return Some(RejectionReason::GenderMismatch);
    }

    match record.rank_in(&candidate.country) {
        Some(rank) if rank > config.rank_ceiling => Some(RejectionReason::TooRare),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curation::domain::Gender;
    use crate::curation::source::NameRecord;

    fn country(code: &str) -> CountryCode {
        code.parse().expect("valid code")
    }

    fn record(countries: &[(&str, Option<u32>)], male: f32) -> LookupResult {
        let mut record = NameRecord::default();
        record.gender_probabilities.insert(Gender::Male, male);
        record.gender_probabilities.insert(Gender::Female, 1.0 - male);
        for (code, rank) in countries {
            record.countries.insert(country(code));
            if let Some(rank) = rank {
                record.rank_by_country.insert(country(code), *rank);
            }
        }
        LookupResult {
            first_name: Some(record),
        }
    }

    #[test]
    fn length_window_is_inclusive() {
        let config = ValidationConfig::default();
        assert_eq!(check_length("Jo", &config), Some(RejectionReason::TooShort));
        assert_eq!(check_length("Bob", &config), None);
        assert_eq!(check_length(&"A".repeat(20), &config), None);
        assert_eq!(check_length(&"A".repeat(25), &config), Some(RejectionReason::TooLong));
        assert_eq!(check_length("Zoë", &config), None);
    }

    #[test]
    fn character_set_accepts_locale_diacritics() {
        let registry = PatternRegistry::standard();
        for (name, code) in [
            ("Müller", "DE"),
            ("Jäger", "DE"),
            ("François", "FR"),
            ("Étienne", "FR"),
            ("Núñez", "ES"),
            ("Mary-Ann", "US"),
            ("O'Connor", "GB"),
        ] {
            assert_eq!(check_character_set(name, &country(code), &registry), None, "{name}");
        }
        assert_eq!(
            check_character_set("王小明", &country("US"), &registry),
            Some(RejectionReason::NonLatinScript)
        );
        assert_eq!(
            check_character_set("John2", &country("US"), &registry),
            Some(RejectionReason::InvalidCharacters)
        );
    }

    #[test]
    fn format_requires_capitalized_parts() {
        let registry = PatternRegistry::standard();
        assert_eq!(check_format("Mary Anne", &country("US"), &registry), None);
        assert_eq!(
            check_format("john", &country("US"), &registry),
            Some(RejectionReason::InvalidFormat)
        );
        assert_eq!(
            check_format("Jose luis", &country("ES"), &registry),
            Some(RejectionReason::InvalidFormat)
        );
        assert_eq!(check_format("whatever", &country("JP"), &registry), None);
    }

    #[test]
    fn double_names_allow_two_capitalized_parts() {
        assert_eq!(check_double_name("John"), None);
        assert_eq!(check_double_name("Jose Luis"), None);
        assert_eq!(
            check_double_name("Jose Luis Maria"),
            Some(RejectionReason::TooManyParts)
        );
        assert_eq!(
            check_double_name("mary anne"),
            Some(RejectionReason::InvalidCapitalization)
        );
    }

    #[test]
    fn authority_checks_presence_country_gender_and_rank() {
        let config = ValidationConfig::default();
        let candidate = Candidate::new("Alex", Gender::Male, country("US"));

        assert_eq!(
            check_authority(&candidate, None, &config),
            Some(RejectionReason::NotFound)
        );
        assert_eq!(
            check_authority(&candidate, Some(LookupResult { first_name: None }), &config),
            Some(RejectionReason::NotFound)
        );
        assert_eq!(
            check_authority(&candidate, Some(record(&[("GB", Some(3))], 0.9)), &config),
            Some(RejectionReason::CountryMismatch)
        );
        assert_eq!(
            check_authority(&candidate, Some(record(&[("US", Some(3))], 0.2)), &config),
            Some(RejectionReason::GenderMismatch)
        );
        assert_eq!(
            check_authority(&candidate, Some(record(&[("US", Some(9000))], 0.9)), &config),
            Some(RejectionReason::TooRare)
        );
        assert_eq!(
            check_authority(&candidate, Some(record(&[("US", Some(5000))], 0.5)), &config),
            None
        );
        assert_eq!(
            check_authority(&candidate, Some(record(&[("US", None)], 0.9)), &config),
            None
        );
    }
}
