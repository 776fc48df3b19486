//! services/api/src/web/extract.rs
//!
//! Extractors over the session the route guard already resolved.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;
use std::sync::Arc;
use studio_core::enrollment::AdminHandle;
use studio_core::error::ActionError;
use studio_core::session::ResolvedSession;

use crate::error::ActionRejection;
use crate::web::state::AppState;

/// The request's session; anonymous when the guard did not run.
pub struct CurrentSession(pub ResolvedSession);

impl<S: Send + Sync> FromRequestParts<S> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentSession(
            parts
                .extensions
                .get::<ResolvedSession>()
                .cloned()
                .unwrap_or_default(),
        ))
    }
}

/// Requires an admin session. Rejects with `401 {"success":false,"error":"Unauthorized"}`.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(admin): RequireAdmin) -> ActionResponse {
///     // admin.admin() is guaranteed to hold the admin role here
///     Ok(Json(ActionReply::ok()))
/// }
/// ```
pub struct RequireAdmin(pub AdminHandle);

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = ActionRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<ResolvedSession>()
            .ok_or(ActionRejection(ActionError::Unauthorized))?;
        let handle = AdminHandle::from_session(session, state.db.clone(), state.cache.clone())?;
        Ok(RequireAdmin(handle))
    }
}
