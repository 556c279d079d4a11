use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("message not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
