//! Errors for query execution.

use query_engine_translation::translation;
use query_engine_translation::translation::error::ErrorKind;

/// A type for execution errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Translation(#[from] translation::error::Error),
    /// Whatever the executor failed with, untouched.
    #[error(transparent)]
    External(anyhow::Error),
    #[error("The executor must return an array of objects, one per row of the result set, or an object whose \"rows\" property is such an array. Instead got {0}")]
    DataShape(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Translation(err) => err.kind(),
            Error::External(_) => ErrorKind::ExternalCall,
            Error::DataShape(_) => ErrorKind::DataShape,
        }
    }
}

impl From<translation::error::RequestValidationError> for Error {
    fn from(err: translation::error::RequestValidationError) -> Error {
        Error::Translation(err.into())
    }
}
