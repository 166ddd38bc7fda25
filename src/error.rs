use crate::granules::Product;
use crate::readers::ReadError;

use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    DirectoryNotFound(PathBuf),
    NoGranules { product: Product, dir: PathBuf },
    DateMismatch(Vec<NaiveDate>),
    InvalidRoi(String),
    InvalidTimestamp(String),
    DimensionMismatch(String),
    Pattern(glob::PatternError),
    Read(ReadError),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DirectoryNotFound(path) => {
                write!(f, "directory not found: {}", path.display())
            }
            Error::NoGranules { product, dir } => {
                write!(
                    f,
                    "no MCD43{} granules found in {}",
                    product,
                    dir.display()
                )
            }
            Error::DateMismatch(dates) => {
                write!(f, "A1/A2 date mismatch, unpaired dates: {:?}", dates)
            }
            Error::InvalidRoi(msg) => write!(f, "invalid ROI: {}", msg),
            Error::InvalidTimestamp(input) => {
                write!(
                    f,
                    "invalid timestamp format: {:?} (expected %Y-%m-%d or %Y%j)",
                    input
                )
            }
            Error::DimensionMismatch(msg) => write!(f, "dimension mismatch: {}", msg),
            Error::Pattern(e) => write!(f, "invalid granule pattern: {}", e),
            Error::Read(e) => write!(f, "{}", e),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Json(e) => write!(f, "Failed to parse JSON: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<glob::PatternError> for Error {
    fn from(err: glob::PatternError) -> Error {
        Error::Pattern(err)
    }
}

impl From<ReadError> for Error {
    fn from(err: ReadError) -> Error {
        Error::Read(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}
