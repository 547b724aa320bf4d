//! Errors surfaced by control operations.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid request body: {0}")]
    InvalidBody(String),
}
