use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field '{0}'")]
    MissingField(String),

    #[error("Field '{0}' must not be empty")]
    EmptyField(String),

    #[error("Field '{field}' must be a number, got '{value}'")]
    NotNumeric { field: String, value: String },

    #[error("Id '{0}' is already in use")]
    DuplicateId(String),

    #[error("No id follows the highest existing id {0}")]
    IdExhausted(u64),
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Invalid record: {0}")]
    Validation(#[from] ValidationError),

    #[error("Could not find '{marker}' in {}", path.display())]
    StructureNotFound { path: PathBuf, marker: String },

    #[error("Failed to copy media '{}': {reason}", file.display())]
    MediaCopy { file: PathBuf, reason: String },

    #[error("No record at index {index} ({len} records)")]
    NotFound { index: usize, len: usize },

    #[error("'{operation}' is not supported for {collection}")]
    Unsupported {
        collection: &'static str,
        operation: &'static str,
    },

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
