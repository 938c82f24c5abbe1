use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Unknown file type for file '{}'", .0.display())]
    UnsupportedFileType(PathBuf),

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Malformed row: expected at least {expected} cells, found {found} (no cell for '{missing}')")]
    MalformedRow {
        expected: usize,
        found: usize,
        missing: &'static str,
    },

    #[error("Cannot parse date '{0}'")]
    DateParse(String),

    #[error("Cannot convert {field} value '{value}' to a number")]
    FieldConversion { field: &'static str, value: String },

    #[error("Row {index} {row}: {source}")]
    AtRow {
        index: usize,
        row: String,
        #[source]
        source: Box<ConvertError>,
    },

    #[error("Settings error: {0}")]
    Settings(String),
}

impl ConvertError {
    /// Attach the source row position and raw content to a row-level failure.
    pub fn at_row(self, index: usize, row: String) -> Self {
        Self::AtRow {
            index,
            row,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
