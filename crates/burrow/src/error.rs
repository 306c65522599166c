use thiserror::Error;

use crate::operation::Operation;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{owner} has no {operation} operation")]
    OperationNotFound { operation: Operation, owner: String },

    #[error("{decorator} is already registered on {operation} for {owner}")]
    DuplicateRegistration {
        operation: Operation,
        decorator: String,
        owner: String,
    },

    #[error("built-in type {0} cannot be decorated")]
    SealedType(String),

    #[error("invalid index: {0}")]
    InvalidIndex(String),

    #[error("not a container at {0}")]
    NotAContainer(String),

    #[error("{0}")]
    InvalidArgument(String),
}

impl From<burrow_path::PathError> for Error {
    fn from(err: burrow_path::PathError) -> Self {
        match err {
            burrow_path::PathError::InvalidIndex(text) => Error::InvalidIndex(text),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
