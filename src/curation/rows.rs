//! Header-less `first_name,last_name,gender,country` rows.

use super::domain::{CountryCode, Gender};
use csv::ByteRecord;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRow {
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub country: CountryCode,
}

impl NameRow {
    pub fn first_name_only(first_name: impl Into<String>, gender: Gender, country: CountryCode) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: String::new(),
            gender,
            country,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RowError {
    #[error("row file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("row encoding error: {0}")]
    Csv(#[from] csv::Error),
}

/// Fields of an input row the cleaning pass looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawRow<'r> {
    /// Fewer than three fields, or a field that is not UTF-8.
    Malformed,
    Fields { first_name: &'r str, gender: &'r str },
}

impl<'r> RawRow<'r> {
    pub fn from_record(record: &'r ByteRecord) -> Self {
        if record.len() < 3 || record.iter().any(|field| std::str::from_utf8(field).is_err()) {
            return Self::Malformed;
        }
        match (field_str(record, 0), field_str(record, 2)) {
            (Some(first_name), Some(gender)) => Self::Fields { first_name, gender },
            _ => Self::Malformed,
        }
    }
}

fn field_str(record: &ByteRecord, index: usize) -> Option<&str> {
    record
        .get(index)
        .and_then(|field| std::str::from_utf8(field).ok())
}

pub fn reader_from<R: Read>(reader: R) -> csv::Reader<R> {
    reader_builder().from_reader(reader)
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(false).flexible(true);
    builder
}

/// Reads fully-typed rows, e.g. to inspect a generated file.
pub fn read_name_rows<R: Read>(reader: R) -> Result<Vec<NameRow>, RowError> {
    let mut csv_reader = reader_from(reader);
    let mut rows = Vec::new();
    for row in csv_reader.deserialize::<NameRow>() {
        rows.push(row?);
    }
    Ok(rows)
}

pub struct RowWriter<W: Write> {
    inner: csv::Writer<W>,
}

/// Row file written beside its destination and renamed into place by
/// [`StagedRows::commit`]. Dropping it uncommitted removes the staging file
/// and leaves the destination untouched.
pub struct StagedRows {
    staging: StagingPath,
    writer: RowWriter<File>,
}

impl StagedRows {
    /// Stages rows for `path`, creating its parent directories when missing.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, RowError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let staging = StagingPath {
            tmp_path: path.with_extension("tmp"),
            path,
            committed: false,
        };
        let file = File::create(&staging.tmp_path)?;
        Ok(Self {
            staging,
            writer: RowWriter::from_writer(file),
        })
    }

    pub fn writer(&mut self) -> &mut RowWriter<File> {
        &mut self.writer
    }

    pub fn commit(self) -> Result<PathBuf, RowError> {
        let Self { staging, writer } = self;
        drop(writer.into_inner()?);
        staging.commit()
    }
}

struct StagingPath {
    path: PathBuf,
    tmp_path: PathBuf,
    committed: bool,
}

impl StagingPath {
    fn commit(mut self) -> Result<PathBuf, RowError> {
        std::fs::rename(&self.tmp_path, &self.path)?;
        self.committed = true;
        Ok(self.path.clone())
    }
}

impl Drop for StagingPath {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.tmp_path);
        }
    }
}

impl<W: Write> RowWriter<W> {
    pub fn from_writer(writer: W) -> Self {
        let inner = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        Self { inner }
    }

    pub fn write_row(&mut self, row: &NameRow) -> Result<(), RowError> {
        self.inner.serialize(row)?;
        Ok(())
    }

    /// Copies an input record unchanged.
    pub fn write_record(&mut self, record: &ByteRecord) -> Result<(), RowError> {
        self.inner.write_byte_record(record)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), RowError> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W, RowError> {
        self.inner
            .into_inner()
            .map_err(|err| RowError::Io(err.into_error()))
    }
}

/// Counts newline bytes without decoding the file.
pub fn count_lines<P: AsRef<Path>>(path: P) -> Result<u64, RowError> {
    let mut reader = BufReader::with_capacity(1 << 20, File::open(path)?);
    let mut buffer = vec![0u8; 1 << 20];
    let mut count = 0u64;
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        count += buffer[..read].iter().filter(|b| **b == b'\n').count() as u64;
    }
    Ok(count)
}
