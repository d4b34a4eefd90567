use common::pagination::PaginationError;
use models::errors::ModelError;
use thiserror::Error;

use crate::contacts::repository::RepositoryError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    /// Message without the variant prefix, for user-facing bodies.
    pub fn detail(&self) -> &str {
        match self {
            ServiceError::Validation(m)
            | ServiceError::NotFound(m)
            | ServiceError::Conflict(m)
            | ServiceError::Repository(m) => m,
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(m) => ServiceError::Validation(m),
        }
    }
}

impl From<PaginationError> for ServiceError {
    fn from(e: PaginationError) -> Self { ServiceError::Validation(e.to_string()) }
}

impl From<RepositoryError> for ServiceError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict { field } => {
                ServiceError::Conflict(format!("Contact with this {field} already exists"))
            }
            RepositoryError::Storage(m) => ServiceError::Repository(m),
        }
    }
}
