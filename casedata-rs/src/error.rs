use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error("missing data file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("invalid date {0:?}")]
    InvalidDate(String),

    #[error("dates out of order on line {line}: {date} does not follow {previous}")]
    Unordered {
        line: u64,
        date: String,
        previous: String,
    },

    #[error("no file named {0:?} in the environment")]
    UnknownFile(String),
}
