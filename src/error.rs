//! Error types for the index engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("search column {0:?} not found in header: {1:?}")]
    ColumnNotFound(String, Vec<String>),

    #[error("unsupported file extension: {0}")]
    UnsupportedFileType(String),

    #[error("record at byte offset {0} exceeds the 1 MiB line cap")]
    RecordTooLong(u64),

    #[error("malformed JSON record at byte offset {0}: {1}")]
    MalformedJson(u64, String),

    #[error("corrupted index data: {0}")]
    Corruption(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::MalformedJson(0, err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
