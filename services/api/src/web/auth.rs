//! services/api/src/web/auth.rs
//!
//! Passwordless authentication endpoints: request a one-time code, trade it
//! for a session cookie, and log out.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Duration;
use serde::Deserialize;
use std::sync::Arc;
use studio_core::ports::PortError;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::error::ActionReply;
use crate::web::middleware::{session_token, SESSION_COOKIE};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct OtpRequest {
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

fn failure(status: StatusCode, error: &str) -> Response {
    (status, Json(ActionReply::failure(error))).into_response()
}

fn session_cookie(state: &AppState, value: &str, max_age_seconds: i64) -> String {
    let secure = if state.config.cookie_secure { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        SESSION_COOKIE, value, max_age_seconds, secure
    )
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/otp - Email a one-time sign-in code
#[utoipa::path(
    post,
    path = "/auth/otp",
    request_body = OtpRequest,
    responses(
        (status = 200, description = "Code sent", body = ActionReply),
        (status = 400, description = "Missing email", body = ActionReply),
        (status = 500, description = "Code could not be sent", body = ActionReply)
    )
)]
pub async fn request_code_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OtpRequest>,
) -> Response {
    let email = req.email.trim();
    if email.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Email is required");
    }

    match state.identity.send_one_time_code(email).await {
        Ok(()) => Json(ActionReply::message("Check your email for a sign-in code")).into_response(),
        Err(e) => {
            error!("Failed to send sign-in code: {:?}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Could not send a sign-in code")
        }
    }
}

/// POST /auth/verify - Trade a one-time code for a session cookie
#[utoipa::path(
    post,
    path = "/auth/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Signed in; `id` is the user id", body = ActionReply),
        (status = 401, description = "Invalid or expired code", body = ActionReply),
        (status = 500, description = "Internal server error", body = ActionReply)
    )
)]
pub async fn verify_code_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> Response {
    // 1. Consume the code
    let user = match state
        .identity
        .verify_one_time_code(req.email.trim(), req.code.trim())
        .await
    {
        Ok(user) => user,
        Err(PortError::Unexpected(e)) => {
            error!("Failed to verify sign-in code: {}", e);
            return failure(StatusCode::INTERNAL_SERVER_ERROR, "Could not sign in");
        }
        Err(e) => {
            warn!("Sign-in code rejected: {:?}", e);
            return failure(StatusCode::UNAUTHORIZED, "Invalid or expired code");
        }
    };

    // 2. Open a session for the user
    let session = match state.identity.create_session(user.id).await {
        Ok(session) => session,
        Err(e) => {
            error!(user_id = %user.id, "Failed to create auth session: {:?}", e);
            return failure(StatusCode::INTERNAL_SERVER_ERROR, "Could not sign in");
        }
    };

    // 3. Hand the token to the browser
    let max_age = Duration::days(state.config.session_ttl_days).num_seconds();
    let cookie = session_cookie(&state, &session.token, max_age);
    info!(user_id = %user.id, "User signed in");

    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(ActionReply::ok().with_id(user.id)),
    )
        .into_response()
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful", body = ActionReply)
    )
)]
pub async fn logout_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        if let Err(e) = state.identity.sign_out(&token).await {
            error!("Failed to delete auth session: {:?}", e);
        }
    }

    let cookie = session_cookie(&state, "", 0);
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(ActionReply::ok()),
    )
        .into_response()
}
