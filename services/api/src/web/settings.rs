//! services/api/src/web/settings.rs
//!
//! Admin settings: the profile list, two-step admin enrollment by one-time
//! code, removing admins and editing display names.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use studio_core::domain::Profile;
use studio_core::enrollment::{EnrollmentError, EnrollmentFailure, EnrollmentStep};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ActionReply, ActionResponse};
use crate::web::extract::RequireAdmin;
use crate::web::state::AppState;

//=========================================================================================
// Payloads
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct EnrollEmail {
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct EnrollVerify {
    pub email: String,
    pub code: String,
}

#[derive(Deserialize, ToSchema)]
pub struct DisplayNameUpdate {
    pub display_name: String,
}

/// Where the enrollment form stands after a step, plus the outcome.
#[derive(Serialize)]
pub struct EnrollmentReply {
    pub success: bool,
    #[serde(flatten)]
    pub step: EnrollmentStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EnrollmentReply {
    fn rejected(failure: EnrollmentFailure) -> Response {
        let status = match failure.error {
            EnrollmentError::MissingEmail
            | EnrollmentError::InvalidEmail
            | EnrollmentError::MissingCode
            | EnrollmentError::InvalidCode(_) => StatusCode::BAD_REQUEST,
            EnrollmentError::Unreachable(_) | EnrollmentError::PromotionFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let reply = EnrollmentReply {
            success: false,
            step: failure.step,
            id: None,
            error: Some(failure.error.to_string()),
        };
        (status, Json(reply)).into_response()
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/admin/settings/profiles - Every profile, newest first
#[utoipa::path(
    get,
    path = "/api/admin/settings/profiles",
    responses(
        (status = 200, description = "Profiles, newest first"),
        (status = 401, description = "Not an admin", body = ActionReply)
    )
)]
pub async fn list_profiles_handler(RequireAdmin(admin): RequireAdmin) -> Json<Vec<Profile>> {
    Json(admin.list_profiles().await)
}

/// POST /api/admin/settings/enroll/send - Step one: email a code to the candidate
#[utoipa::path(
    post,
    path = "/api/admin/settings/enroll/send",
    request_body = EnrollEmail,
    responses(
        (status = 200, description = "Code sent; the form moves to the `otp` step"),
        (status = 400, description = "Missing email; the form stays on `email`"),
        (status = 401, description = "Not an admin", body = ActionReply),
        (status = 500, description = "Code could not be sent; the form stays on `email`")
    )
)]
pub async fn send_enrollment_code_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
    Json(req): Json<EnrollEmail>,
) -> Response {
    match state.enrollment().send_code(&req.email).await {
        Ok(step) => Json(EnrollmentReply {
            success: true,
            step,
            id: None,
            error: None,
        })
        .into_response(),
        Err(failure) => EnrollmentReply::rejected(failure),
    }
}

/// POST /api/admin/settings/enroll/verify - Step two: verify and promote
///
/// The code is checked without touching the calling admin's session; no
/// cookie is set on this response.
#[utoipa::path(
    post,
    path = "/api/admin/settings/enroll/verify",
    request_body = EnrollVerify,
    responses(
        (status = 200, description = "Verified and promoted; the form resets to `email`"),
        (status = 400, description = "Missing or invalid code; the form stays on `otp`"),
        (status = 401, description = "Not an admin", body = ActionReply),
        (status = 500, description = "Verified, but failed to promote to admin")
    )
)]
pub async fn verify_enrollment_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(admin): RequireAdmin,
    Json(req): Json<EnrollVerify>,
) -> Response {
    match state
        .enrollment()
        .verify_and_promote(&admin, &req.email, &req.code)
        .await
    {
        Ok(user) => Json(EnrollmentReply {
            success: true,
            step: EnrollmentStep::Email,
            id: Some(user.id),
            error: None,
        })
        .into_response(),
        Err(failure) => EnrollmentReply::rejected(failure),
    }
}

/// DELETE /api/admin/settings/profiles/{id} - Remove another admin's profile
#[utoipa::path(
    delete,
    path = "/api/admin/settings/profiles/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Removed", body = ActionReply),
        (status = 400, description = "Cannot remove yourself", body = ActionReply),
        (status = 401, description = "Not an admin", body = ActionReply),
        (status = 404, description = "No such profile", body = ActionReply)
    )
)]
pub async fn remove_admin_handler(
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> ActionResponse {
    admin.remove_admin(id).await?;
    Ok(Json(ActionReply::message("Admin removed").with_id(id)))
}

/// PATCH /api/admin/settings/profiles/{id}/display-name
#[utoipa::path(
    patch,
    path = "/api/admin/settings/profiles/{id}/display-name",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = DisplayNameUpdate,
    responses(
        (status = 200, description = "Updated", body = ActionReply),
        (status = 401, description = "Not an admin", body = ActionReply),
        (status = 404, description = "No such profile", body = ActionReply)
    )
)]
pub async fn update_display_name_handler(
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
    Json(update): Json<DisplayNameUpdate>,
) -> ActionResponse {
    admin.update_display_name(id, &update.display_name).await?;
    Ok(Json(ActionReply::message("Display name updated").with_id(id)))
}
