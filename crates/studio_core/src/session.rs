//! crates/studio_core/src/session.rs
//!
//! Session resolution: who is making this request, and are they an admin.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{Role, User};
use crate::ports::{DatabaseService, IdentityService, PortError};

/// The identity behind one request. Resolved once, then read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSession {
    pub user: Option<User>,
    pub role: Option<Role>,
}

impl ResolvedSession {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_some() && self.role == Some(Role::Admin)
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user.as_ref().map(|u| u.id)
    }
}

/// Resolves the session credential into an identity and role.
///
/// Fails closed: a failed user lookup yields an anonymous session, and a missing
/// or unreadable profile yields `role: None`.
pub async fn resolve_session(
    identity: &dyn IdentityService,
    db: &dyn DatabaseService,
    session_token: Option<&str>,
) -> ResolvedSession {
    let Some(token) = session_token.filter(|t| !t.is_empty()) else {
        return ResolvedSession::anonymous();
    };

    let user = match identity.get_user_by_session(token).await {
        Ok(Some(user)) => user,
        Ok(None) => return ResolvedSession::anonymous(),
        Err(e) => {
            warn!("Session lookup failed, treating request as anonymous: {:?}", e);
            return ResolvedSession::anonymous();
        }
    };

    let role = match db.get_profile(user.id).await {
        Ok(profile) => profile.role,
        Err(PortError::NotFound(_)) => {
            debug!(user_id = %user.id, "No profile row yet");
            None
        }
        Err(e) => {
            warn!(user_id = %user.id, "Profile lookup failed: {:?}", e);
            None
        }
    };

    ResolvedSession {
        user: Some(user),
        role,
    }
}
