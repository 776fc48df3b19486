//! crates/studio_core/src/guard.rs
//!
//! The route guard's access policy, evaluated per request against an
//! already-resolved session.

use crate::session::ResolvedSession;

/// The fixed destinations the guard routes between.
#[derive(Debug, Clone)]
pub struct GuardPaths {
    pub admin_prefix: String,
    pub login: String,
    pub access_denied: String,
    pub admin_root: String,
    pub site_root: String,
}

impl Default for GuardPaths {
    fn default() -> Self {
        Self {
            admin_prefix: "/admin".to_string(),
            login: "/login".to_string(),
            access_denied: "/access-denied".to_string(),
            admin_root: "/admin".to_string(),
            site_root: "/".to_string(),
        }
    }
}

/// The outcome of guarding one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Admin area, no user at all.
    Unauthenticated,
    /// Admin area, signed in without the admin role.
    Unauthorized,
    /// Signed-in user asked for the login page.
    AlreadySignedIn { admin: bool },
}

impl GuardDecision {
    /// Where to send the browser, or `None` to let the request through.
    pub fn redirect_target<'a>(&self, paths: &'a GuardPaths) -> Option<&'a str> {
        match self {
            GuardDecision::Allow => None,
            GuardDecision::Unauthenticated => Some(&paths.login),
            GuardDecision::Unauthorized => Some(&paths.access_denied),
            GuardDecision::AlreadySignedIn { admin: true } => Some(&paths.admin_root),
            GuardDecision::AlreadySignedIn { admin: false } => Some(&paths.site_root),
        }
    }
}

/// True when `path` is `prefix` itself or lies beneath it.
fn is_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

pub fn evaluate(paths: &GuardPaths, path: &str, session: &ResolvedSession) -> GuardDecision {
    if is_under(path, &paths.admin_prefix) {
        return match (&session.user, session.is_admin()) {
            (None, _) => GuardDecision::Unauthenticated,
            (Some(_), false) => GuardDecision::Unauthorized,
            (Some(_), true) => GuardDecision::Allow,
        };
    }

    if session.is_authenticated() && is_under(path, &paths.login) {
        return GuardDecision::AlreadySignedIn {
            admin: session.is_admin(),
        };
    }

    GuardDecision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, User};
    use uuid::Uuid;

    fn signed_in(role: Option<Role>) -> ResolvedSession {
        ResolvedSession {
            user: Some(User {
                id: Uuid::new_v4(),
                email: "someone@example.com".to_string(),
            }),
            role,
        }
    }

    const ADMIN_PATHS: [&str; 5] = [
        "/admin",
        "/admin/",
        "/admin/bookings",
        "/admin/photos/edit",
        "/admin/settings",
    ];

    #[test]
    fn anonymous_admin_requests_go_to_login() {
        let paths = GuardPaths::default();
        for path in ADMIN_PATHS {
            let decision = evaluate(&paths, path, &ResolvedSession::anonymous());
            assert_eq!(decision, GuardDecision::Unauthenticated, "{path}");
            assert_eq!(decision.redirect_target(&paths), Some("/login"));
        }
    }

    #[test]
    fn non_admin_requests_go_to_access_denied() {
        let paths = GuardPaths::default();
        for role in [None, Some(Role::User)] {
            for path in ADMIN_PATHS {
                let decision = evaluate(&paths, path, &signed_in(role));
                assert_eq!(decision, GuardDecision::Unauthorized, "{path}");
                assert_eq!(decision.redirect_target(&paths), Some("/access-denied"));
            }
        }
    }

    #[test]
    fn admins_pass() {
        let paths = GuardPaths::default();
        for path in ADMIN_PATHS {
            assert_eq!(
                evaluate(&paths, path, &signed_in(Some(Role::Admin))),
                GuardDecision::Allow
            );
        }
    }

    #[test]
    fn role_without_user_is_not_admin() {
        let paths = GuardPaths::default();
        let session = ResolvedSession {
            user: None,
            role: Some(Role::Admin),
        };
        assert_eq!(
            evaluate(&paths, "/admin", &session),
            GuardDecision::Unauthenticated
        );
    }

    #[test]
    fn login_page_redirects_signed_in_users() {
        let paths = GuardPaths::default();

        let admin = evaluate(&paths, "/login", &signed_in(Some(Role::Admin)));
        assert_eq!(admin.redirect_target(&paths), Some("/admin"));

        let member = evaluate(&paths, "/login", &signed_in(None));
        assert_eq!(member.redirect_target(&paths), Some("/"));

        let anon = evaluate(&paths, "/login", &ResolvedSession::anonymous());
        assert_eq!(anon, GuardDecision::Allow);
    }

    #[test]
    fn prefix_match_respects_segments() {
        let paths = GuardPaths::default();
        let anon = ResolvedSession::anonymous();
        assert_eq!(evaluate(&paths, "/administrator", &anon), GuardDecision::Allow);
        assert_eq!(evaluate(&paths, "/portfolio", &anon), GuardDecision::Allow);
        assert_eq!(evaluate(&paths, "/", &anon), GuardDecision::Allow);
        assert_eq!(
            evaluate(&paths, "/loginhelp", &signed_in(None)),
            GuardDecision::Allow
        );
    }
}
