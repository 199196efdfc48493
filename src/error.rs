use thiserror::Error;

use crate::types::Timestamp;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("non-finite modeled power at {timestamp}")]
    NumericAnomaly { timestamp: Timestamp },
    #[error("missing column '{0}'")]
    MissingColumn(String),
    #[error("duplicate timestamp {0}")]
    DuplicateTimestamp(Timestamp),
    #[error("row at {timestamp} has {found} values, expected {expected}")]
    RowWidth {
        timestamp: Timestamp,
        expected: usize,
        found: usize,
    },
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("http request failed with status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("api error: {0}")]
    Api(String),
    #[error("config error: {0}")]
    Config(#[from] Box<figment::Error>),
}
