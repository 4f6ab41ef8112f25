//! Annotation workflow errors

use labelstore::StoreError;
use thiserror::Error;

/// Errors raised to the presentation boundary
///
/// `StateMissing` and `DataMissing` halt the current render cycle.
/// `Persistence` is a warning: the action that raised it was not committed
/// and can be repeated.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("State record {row_id} not found; run `lt init` to provision it")]
    StateMissing { row_id: i64 },

    #[error("Could not save progress: {0}")]
    Persistence(String),

    #[error("Catalog data missing: {0}")]
    DataMissing(String),
}

impl From<StoreError> for LabelError {
    fn from(err: StoreError) -> Self {
        LabelError::Persistence(err.to_string())
    }
}

impl LabelError {
    /// Whether the error must stop the current screen from rendering
    pub fn is_fatal(&self) -> bool {
        !matches!(self, LabelError::Persistence(_))
    }
}

/// Result of workflow operations
pub type LabelResult<T> = Result<T, LabelError>;
