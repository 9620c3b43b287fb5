use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum LivroError {
    #[error("ValidationError: {0}")]
    Validation(#[from] ValidationError),
    #[error("NotFound: livro {0}")]
    NotFound(i64),
    // A path segment that cannot name any record.
    #[error("NotFound: path id {0:?}")]
    UnknownId(String),
    #[error("InvalidInput: {0}")]
    InvalidInput(String),
    #[error("StorageError: {0}")]
    Storage(#[from] libsql::Error),
    #[error("StorageError: {0}")]
    StorageState(String),
}

pub type Result<T> = std::result::Result<T, LivroError>;
