//! CSV sample reader
//!
//! Expects a header row followed by records of the form
//! `label,x1,x2,...,xn`. Values are returned unscaled.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{Reader, ReaderBuilder, StringRecord, Trim};

use crate::error::{NetworkError, Result};
use crate::io::source::{Sample, SampleSource};
use crate::matrix::Matrix;

pub struct CsvReader {
    path: PathBuf,
    reader: Reader<File>,
    record: StringRecord,
}

impl CsvReader {
    /// Open `path` and position the cursor on the first data record.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let reader = Self::build_reader(&path)?;
        Ok(Self {
            path,
            reader,
            record: StringRecord::new(),
        })
    }

    fn build_reader(path: &Path) -> Result<Reader<File>> {
        Ok(ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_path(path)?)
    }

    fn parse_record(record: &StringRecord) -> Result<Sample> {
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let malformed = |reason: String| NetworkError::MalformedRecord { line, reason };

        let label_field = record
            .get(0)
            .ok_or_else(|| malformed("empty record".to_string()))?;
        let label = label_field
            .parse::<u32>()
            .map_err(|e| malformed(format!("bad label '{}': {}", label_field, e)))?;

        let values = record
            .iter()
            .skip(1)
            .map(|field| {
                field
                    .parse::<f64>()
                    .map_err(|e| malformed(format!("bad value '{}': {}", field, e)))
            })
            .collect::<Result<Vec<f64>>>()?;
        if values.is_empty() {
            return Err(malformed("record has no input values".to_string()));
        }

        Ok(Sample::new(label, Matrix::row_vector(values)))
    }
}

impl SampleSource for CsvReader {
    fn next_sample(&mut self) -> Result<Option<Sample>> {
        if !self.reader.read_record(&mut self.record)? {
            return Ok(None);
        }
        Self::parse_record(&self.record).map(Some)
    }

    fn reset(&mut self) -> Result<()> {
        self.reader = Self::build_reader(&self.path)?;
        Ok(())
    }
}
