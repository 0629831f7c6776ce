//! CSV ingestion for the student performance dataset.
//!
//! The training file is a plain CSV with snake_case headers:
//! `gender`, `race_ethnicity`, `parental_level_of_education`, `lunch`,
//! `test_preparation_course`, `reading_score`, `writing_score`,
//! `math_score`. All three score columns must parse as numbers in
//! `[0, 100]`; malformed rows abort the load.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Columns every training file must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "gender",
    "race_ethnicity",
    "parental_level_of_education",
    "lunch",
    "test_preparation_course",
    "reading_score",
    "writing_score",
    "math_score",
];

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column {0:?}")]
    MissingColumn(&'static str),
    #[error("row {row}: {column} value {value} outside [0, 100]")]
    ScoreOutOfRange {
        row: usize,
        column: &'static str,
        value: f32,
    },
    #[error("dataset has no rows")]
    Empty,
}

/// Input features for one student, without the label.
///
/// This is the record shape the serving boundary submits for prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub gender: String,
    pub ethnicity: String,
    pub parental_education: String,
    pub lunch: String,
    pub test_prep: String,
    pub reading_score: f32,
    pub writing_score: f32,
}

impl StudentRecord {
    /// Categorical fields in schema order, paired with their column names.
    pub fn categorical_fields(&self) -> [(&'static str, &str); 5] {
        [
            ("gender", self.gender.as_str()),
            ("race_ethnicity", self.ethnicity.as_str()),
            (
                "parental_level_of_education",
                self.parental_education.as_str(),
            ),
            ("lunch", self.lunch.as_str()),
            ("test_preparation_course", self.test_prep.as_str()),
        ]
    }

    /// Numeric fields in schema order, paired with their column names.
    pub fn numeric_fields(&self) -> [(&'static str, f32); 2] {
        [
            ("reading_score", self.reading_score),
            ("writing_score", self.writing_score),
        ]
    }
}

/// One training row: input features plus the math-score label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRecord {
    pub features: StudentRecord,
    pub math_score: f32,
}

/// Raw CSV row as it appears on disk.
#[derive(Debug, Deserialize)]
struct CsvRow {
    gender: String,
    race_ethnicity: String,
    parental_level_of_education: String,
    lunch: String,
    test_preparation_course: String,
    reading_score: f32,
    writing_score: f32,
    math_score: f32,
}

/// Load and validate the full labeled dataset from a CSV file.
pub fn load_records(path: &Path) -> Result<Vec<LabeledRecord>, DatasetError> {
    let mut reader = csv::Reader::from_path(path)?;
    validate_headers(reader.headers()?)?;

    let mut out = Vec::new();
    for (idx, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row?;
        out.push(labeled_record(row, idx + 1)?);
    }
    if out.is_empty() {
        return Err(DatasetError::Empty);
    }
    Ok(out)
}

/// Collect the label column from a slice of records.
pub fn labels(records: &[LabeledRecord]) -> Vec<f32> {
    records.iter().map(|r| r.math_score).collect()
}

fn validate_headers(headers: &csv::StringRecord) -> Result<(), DatasetError> {
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(DatasetError::MissingColumn(column));
        }
    }
    Ok(())
}

fn labeled_record(row: CsvRow, row_idx: usize) -> Result<LabeledRecord, DatasetError> {
    check_score(row_idx, "reading_score", row.reading_score)?;
    check_score(row_idx, "writing_score", row.writing_score)?;
    check_score(row_idx, "math_score", row.math_score)?;
    Ok(LabeledRecord {
        features: StudentRecord {
            gender: row.gender,
            ethnicity: row.race_ethnicity,
            parental_education: row.parental_level_of_education,
            lunch: row.lunch,
            test_prep: row.test_preparation_course,
            reading_score: row.reading_score,
            writing_score: row.writing_score,
        },
        math_score: row.math_score,
    })
}

fn check_score(row: usize, column: &'static str, value: f32) -> Result<(), DatasetError> {
    // NaN fails both comparisons, so non-finite values are rejected here too.
    if value >= 0.0 && value <= 100.0 {
        Ok(())
    } else {
        Err(DatasetError::ScoreOutOfRange { row, column, value })
    }
}
