//! services/api/src/error.rs
//!
//! Defines the startup error type for the API service and the JSON shape every
//! action reports its outcome in.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use studio_core::error::ActionError;
use studio_core::ports::PortError;
use tracing::warn;
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error applying the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

//=========================================================================================
// Action Outcome
//=========================================================================================

/// `{ "success": true, ... }` or `{ "success": false, "error": ... }`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionReply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The id of the record the action affected, for optimistic UIs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionReply {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
            id: None,
            error: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok()
        }
    }

    pub fn with_id(mut self, id: impl ToString) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            id: None,
            error: Some(error.into()),
        }
    }
}

/// An [`ActionError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ActionRejection(pub ActionError);

impl From<ActionError> for ActionRejection {
    fn from(err: ActionError) -> Self {
        Self(err)
    }
}

impl ActionRejection {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ActionError::MissingField(_) | ActionError::Validation(_) => StatusCode::BAD_REQUEST,
            ActionError::Unauthorized => StatusCode::UNAUTHORIZED,
            ActionError::Conflict(_) => StatusCode::CONFLICT,
            ActionError::NotFound(_) => StatusCode::NOT_FOUND,
            ActionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ActionRejection {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), "Action rejected: {}", self.0);
        (status, Json(ActionReply::failure(self.0.to_string()))).into_response()
    }
}

/// Convenience type alias for action handler return values.
pub type ActionResponse<T = ActionReply> = Result<Json<T>, ActionRejection>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_status_follows_error_kind() {
        let cases = [
            (ActionError::MissingField("name"), StatusCode::BAD_REQUEST),
            (ActionError::Validation("Invalid status".into()), StatusCode::BAD_REQUEST),
            (ActionError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ActionError::Conflict("taken".into()), StatusCode::CONFLICT),
            (ActionError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (ActionError::Store("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ActionRejection(err).status(), status);
        }
    }

    #[test]
    fn failure_reply_omits_empty_fields() {
        let json = serde_json::to_value(ActionReply::failure("Unauthorized")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": false, "error": "Unauthorized" }));

        let json = serde_json::to_value(ActionReply::message("Saved").with_id(7)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": true, "message": "Saved", "id": "7" })
        );
    }
}
