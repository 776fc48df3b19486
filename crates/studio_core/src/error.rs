//! crates/studio_core/src/error.rs
//!
//! The error taxonomy every user-facing action reports through.

use crate::ports::PortError;

/// Why an action did not succeed. The `Display` text is what the caller sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// A required form field was blank.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Any other input rejected before touching the store.
    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// Duplicate ids, non-empty categories and the like.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// The store failed; the text is safe to show on admin CRUD paths.
    #[error("{0}")]
    Store(String),
}

/// A convenience type alias for `Result<T, ActionError>`.
pub type ActionResult<T> = Result<T, ActionError>;

impl ActionError {
    /// Wraps a store failure with a caller-facing prefix, e.g. `"Database insert failed"`.
    pub fn store(context: &str, err: &PortError) -> Self {
        ActionError::Store(format!("{context}: {err}"))
    }
}
