use super::{LookupResult, NameRecord, NameSource, SourceError};
use crate::curation::domain::{CountryCode, Gender, InvalidCountryCode};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

/// In-memory name authority loaded from a headered CSV export with columns
/// `name,country,rank,male,female` (one row per name and country).
#[derive(Debug, Default, Clone)]
pub struct AuthorityIndex {
    records: HashMap<String, NameRecord>,
    by_country: HashMap<CountryCode, Vec<RankedName>>,
}

#[derive(Debug, Clone)]
struct RankedName {
    name: String,
    rank: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct AuthorityRow {
    name: String,
    country: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    rank: Option<u32>,
    male: f32,
    female: f32,
}

impl AuthorityIndex {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SourceError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let mut index = Self::default();

        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map(|pos| pos.line()).unwrap_or_default();
            let row: AuthorityRow = record.deserialize(Some(&headers))?;
            let country: CountryCode =
                row.country
                    .parse()
                    .map_err(|err: InvalidCountryCode| SourceError::InvalidRow {
                        line,
                        detail: err.to_string(),
                    })?;
            index.insert(&row.name, country, row.rank, row.male, row.female);
        }

        index.sort();
        Ok(index)
    }

    /// Adds one name×country entry; gender probabilities of the first entry
    /// seen for a name win. Call [`AuthorityIndex::sort`] after the last insert.
    pub fn insert(
        &mut self,
        name: &str,
        country: CountryCode,
        rank: Option<u32>,
        male: f32,
        female: f32,
    ) {
        let record = self.records.entry(name.to_string()).or_insert_with(|| {
            let mut gender_probabilities = BTreeMap::new();
            gender_probabilities.insert(Gender::Male, male);
            gender_probabilities.insert(Gender::Female, female);
            NameRecord {
                gender_probabilities,
                ..NameRecord::default()
            }
        });

        if !record.countries.insert(country.clone()) {
            return;
        }
        if let Some(rank) = rank {
            record.rank_by_country.insert(country.clone(), rank);
        }

        self.by_country.entry(country).or_default().push(RankedName {
            name: name.to_string(),
            rank,
        });
    }

    /// Orders every country's names by rank (unranked last), then by name.
    pub fn sort(&mut self) {
        for names in self.by_country.values_mut() {
            names.sort_by(|a, b| {
                let a_rank = a.rank.unwrap_or(u32::MAX);
                let b_rank = b.rank.unwrap_or(u32::MAX);
                a_rank.cmp(&b_rank).then_with(|| a.name.cmp(&b.name))
            });
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl NameSource for AuthorityIndex {
    fn lookup(
        &self,
        name: &str,
        _country: &CountryCode,
    ) -> Result<Option<LookupResult>, SourceError> {
        Ok(self.records.get(name).map(|record| LookupResult {
            first_name: Some(record.clone()),
        }))
    }

    fn top_names(
        &self,
        country: &CountryCode,
        gender: Gender,
        n: usize,
    ) -> Result<Vec<String>, SourceError> {
        let Some(names) = self.by_country.get(country) else {
            return Ok(Vec::new());
        };

        Ok(names
            .iter()
            .filter(|entry| {
                self.records
                    .get(&entry.name)
                    .map(|record| record.gender_probability(gender) >= 0.5)
                    .unwrap_or(false)
            })
            .take(n)
            .map(|entry| entry.name.clone())
            .collect())
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "name,country,rank,male,female\n\
John,US,1,0.99,0.01\n\
Mary,US,2,0.01,0.99\n\
James,US,3,0.98,0.02\n\
James,GB,1,0.98,0.02\n\
Alex,US,,0.6,0.4\n\
Robert,US,4,0.99,0.01\n";

    fn us() -> CountryCode {
        "US".parse().expect("valid code")
    }

    #[test]
    fn lookup_returns_record_with_every_country() {
        let index = AuthorityIndex::from_reader(Cursor::new(SAMPLE)).expect("index loads");
        let result = index
            .lookup("James", &us())
            .expect("lookup")
            .expect("known name");
        let record = result.first_name.expect("first-name record");
        assert_eq!(record.countries.len(), 2);
        assert_eq!(record.rank_in(&"GB".parse().unwrap()), Some(1));
        assert!(record.gender_probability(Gender::Male) > 0.9);
        assert!(index.lookup("Nobody", &us()).expect("lookup").is_none());
    }

    #[test]
    fn top_names_are_ranked_and_filtered_by_gender() {
        let index = AuthorityIndex::from_reader(Cursor::new(SAMPLE)).expect("index loads");
        let male = index.top_names(&us(), Gender::Male, 10).expect("top names");
        assert_eq!(male, vec!["John", "James", "Robert", "Alex"]);
        let female = index.top_names(&us(), Gender::Female, 10).expect("top names");
        assert_eq!(female, vec!["Mary"]);
    }

    #[test]
    fn top_names_are_prefix_consistent() {
        let index = AuthorityIndex::from_reader(Cursor::new(SAMPLE)).expect("index loads");
        let all = index.top_names(&us(), Gender::Male, 10).expect("top names");
        for k in 0..=all.len() {
            let prefix = index.top_names(&us(), Gender::Male, k).expect("top names");
            assert_eq!(prefix.as_slice(), &all[..k]);
        }
    }

    #[test]
    fn unknown_country_yields_no_names() {
        let index = AuthorityIndex::from_reader(Cursor::new(SAMPLE)).expect("index loads");
        let names = index
            .top_names(&"JP".parse().unwrap(), Gender::Male, 5)
            .expect("top names");
        assert!(names.is_empty());
    }

    #[test]
    fn invalid_country_is_reported() {
        let csv = "name,country,rank,male,female\nJohn,USA,1,0.9,0.1\n";
        let error = AuthorityIndex::from_reader(Cursor::new(csv)).expect_err("bad country");
        assert!(matches!(error, SourceError::InvalidRow { .. }));
    }

    #[test]
    fn missing_file_propagates_io_error() {
        let error = AuthorityIndex::from_path("./does-not-exist.csv").expect_err("io error");
        assert!(matches!(error, SourceError::Io(_)));
    }
}
