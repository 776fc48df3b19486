//! crates/studio_core/src/enrollment.rs
//!
//! Provisioning a new administrator by one-time code.
//!
//! The flow has two steps and keeps no server-side invite: the caller holds the
//! [`EnrollmentStep`] between requests. Verification goes through an
//! [`AnonymousVerifier`], which can only check codes, while the promotion is
//! written through the enrolling admin's [`AdminHandle`]. The two are separate
//! types so that verifying somebody else's code can never reach the session of
//! the admin doing the enrolling.

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{Profile, Role, User};
use crate::error::{ActionError, ActionResult};
use crate::ports::{CacheInvalidator, DatabaseService, IdentityService, PortError, PortResult};
use crate::session::ResolvedSession;

const ADMIN_SETTINGS_PATH: &str = "/admin/settings";

/// Where the operator currently is in the enrollment flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum EnrollmentStep {
    /// Waiting for a candidate email.
    Email,
    /// A code was sent to `email`; waiting for it.
    Otp { email: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrollmentError {
    #[error("Email is required")]
    MissingEmail,
    #[error("Enter a valid email address")]
    InvalidEmail,
    #[error("Code is required")]
    MissingCode,
    #[error("{0}")]
    InvalidCode(String),
    #[error("{0}")]
    Unreachable(String),
    #[error("Verified, but failed to promote to admin: {0}")]
    PromotionFailed(String),
}

/// A failed step: the error plus the step the operator stays on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentFailure {
    pub step: EnrollmentStep,
    pub error: EnrollmentError,
}

impl EnrollmentFailure {
    fn at(step: EnrollmentStep, error: EnrollmentError) -> Self {
        Self { step, error }
    }
}

/// Verify-only access to the identity store. Holds no session.
#[derive(Clone)]
pub struct AnonymousVerifier {
    identity: Arc<dyn IdentityService>,
}

impl AnonymousVerifier {
    pub fn new(identity: Arc<dyn IdentityService>) -> Self {
        Self { identity }
    }

    pub async fn verify(&self, email: &str, code: &str) -> PortResult<User> {
        self.identity.verify_one_time_code(email, code).await
    }
}

/// Profile write access, scoped to an authenticated admin.
#[derive(Clone)]
pub struct AdminHandle {
    admin: User,
    db: Arc<dyn DatabaseService>,
    cache: Arc<dyn CacheInvalidator>,
}

impl AdminHandle {
    /// Only an admin session yields a handle.
    pub fn from_session(
        session: &ResolvedSession,
        db: Arc<dyn DatabaseService>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> ActionResult<Self> {
        match &session.user {
            Some(user) if session.is_admin() => Ok(Self {
                admin: user.clone(),
                db,
                cache,
            }),
            _ => Err(ActionError::Unauthorized),
        }
    }

    pub fn admin(&self) -> &User {
        &self.admin
    }

    /// Every profile, newest first. Empty on read failure.
    pub async fn list_profiles(&self) -> Vec<Profile> {
        match self.db.list_profiles().await {
            Ok(profiles) => profiles,
            Err(e) => {
                error!("Error fetching admins: {:?}", e);
                Vec::new()
            }
        }
    }

    /// Grants `admin` to `user` and back-fills its email.
    ///
    /// The profile row may not exist yet right after verification; an update
    /// that fails or touches nothing falls back to an upsert on the user id.
    pub async fn promote(&self, user: &User) -> PortResult<()> {
        match self
            .db
            .update_profile_role(user.id, Role::Admin, &user.email)
            .await
        {
            Ok(rows) if rows > 0 => return Ok(()),
            Ok(_) => info!(user_id = %user.id, "Profile row not there yet, upserting"),
            Err(e) => warn!(user_id = %user.id, "Profile update failed, upserting: {:?}", e),
        }
        self.db.upsert_profile(user.id, &user.email, Role::Admin).await
    }

    /// Removes another admin's profile row. Admins cannot remove themselves.
    pub async fn remove_admin(&self, user_id: Uuid) -> ActionResult<()> {
        if user_id == self.admin.id {
            return Err(ActionError::Validation(
                "You cannot remove your own admin access".to_string(),
            ));
        }
        let removed = self.db.delete_profile(user_id).await.map_err(|e| {
            error!(%user_id, "Failed to remove admin: {:?}", e);
            ActionError::Store("Failed to remove admin".to_string())
        })?;
        if !removed {
            return Err(ActionError::NotFound(format!("Profile {user_id} not found")));
        }
        self.cache.revalidate(ADMIN_SETTINGS_PATH);
        Ok(())
    }

    pub async fn update_display_name(&self, user_id: Uuid, display_name: &str) -> ActionResult<()> {
        let updated = self
            .db
            .update_display_name(user_id, display_name.trim())
            .await
            .map_err(|e| {
                error!(%user_id, "Failed to update display name: {:?}", e);
                ActionError::Store("Failed to update display name".to_string())
            })?;
        if !updated {
            return Err(ActionError::NotFound(format!("Profile {user_id} not found")));
        }
        self.cache.revalidate(ADMIN_SETTINGS_PATH);
        Ok(())
    }
}

/// Drives both enrollment steps.
#[derive(Clone)]
pub struct AdminEnrollment {
    identity: Arc<dyn IdentityService>,
    verifier: AnonymousVerifier,
    cache: Arc<dyn CacheInvalidator>,
}

impl AdminEnrollment {
    pub fn new(identity: Arc<dyn IdentityService>, cache: Arc<dyn CacheInvalidator>) -> Self {
        Self {
            verifier: AnonymousVerifier::new(identity.clone()),
            identity,
            cache,
        }
    }

    /// Step `email`: create-or-reuse the account and send it a code.
    pub async fn send_code(&self, email: &str) -> Result<EnrollmentStep, EnrollmentFailure> {
        let email = email.trim();
        if email.is_empty() {
            return Err(EnrollmentFailure::at(EnrollmentStep::Email, EnrollmentError::MissingEmail));
        }
        if !email.contains('@') {
            return Err(EnrollmentFailure::at(EnrollmentStep::Email, EnrollmentError::InvalidEmail));
        }

        self.identity.send_one_time_code(email).await.map_err(|e| {
            error!(email, "Failed to send enrollment code: {:?}", e);
            EnrollmentFailure::at(
                EnrollmentStep::Email,
                EnrollmentError::Unreachable("Could not send a code".into()),
            )
        })?;

        info!(email, "Enrollment code sent");
        Ok(EnrollmentStep::Otp {
            email: email.to_string(),
        })
    }

    /// Step `otp`: verify anonymously, then promote through the admin's handle.
    /// On failure the operator stays on the `otp` step.
    pub async fn verify_and_promote(
        &self,
        admin: &AdminHandle,
        email: &str,
        code: &str,
    ) -> Result<User, EnrollmentFailure> {
        let email = email.trim();
        let stay = || EnrollmentStep::Otp {
            email: email.to_string(),
        };
        if email.is_empty() {
            return Err(EnrollmentFailure::at(EnrollmentStep::Email, EnrollmentError::MissingEmail));
        }
        let code = code.trim();
        if code.is_empty() {
            return Err(EnrollmentFailure::at(stay(), EnrollmentError::MissingCode));
        }

        let user = self.verifier.verify(email, code).await.map_err(|e| {
            warn!(email, "Enrollment code rejected: {:?}", e);
            let error = match e {
                PortError::InvalidToken(msg) | PortError::NotFound(msg) => EnrollmentError::InvalidCode(msg),
                PortError::Unexpected(_) => {
                    EnrollmentError::Unreachable("Could not verify the code".into())
                }
                other => EnrollmentError::InvalidCode(other.to_string()),
            };
            EnrollmentFailure::at(stay(), error)
        })?;

        admin.promote(&user).await.map_err(|e| {
            error!(user_id = %user.id, "Failed to promote to admin: {:?}", e);
            let message = match e {
                PortError::Unexpected(msg) => msg,
                other => other.to_string(),
            };
            EnrollmentFailure::at(stay(), EnrollmentError::PromotionFailed(message))
        })?;

        info!(user_id = %user.id, promoted_by = %admin.admin().id, "New admin enrolled");
        self.cache.revalidate(ADMIN_SETTINGS_PATH);
        Ok(user)
    }
}
