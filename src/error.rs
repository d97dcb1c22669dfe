//! Error taxonomy for the indexing core.
//!
//! Library code returns [`IndexError`]; the CLI boundary converts to
//! `anyhow::Error` and prints a single diagnostic line before exiting
//! non-zero.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad input: {0}")]
    BadInput(String),

    #[error("io failure reading {path}: {source}")]
    IoFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("schema failure: {0}")]
    SchemaFailure(String),

    #[error("store failure: {0}")]
    StoreFailure(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;

impl From<rusqlite::Error> for IndexError {
    fn from(err: rusqlite::Error) -> Self {
        IndexError::StoreFailure(err.to_string())
    }
}
