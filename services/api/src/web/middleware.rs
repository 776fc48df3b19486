//! services/api/src/web/middleware.rs
//!
//! The route guard. Runs on every request: resolves the session cookie once,
//! redirects where the guard says so, and marks every response uncacheable.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use studio_core::guard::{self, GuardDecision};
use studio_core::session::resolve_session;
use tracing::debug;

use crate::web::state::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

const NO_STORE: &str = "no-store, max-age=0, must-revalidate";

/// Reads the session token from the `Cookie` header(s), if any.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            c.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
                .map(str::to_string)
        })
        .filter(|token| !token.is_empty())
}

/// Evaluates the guard for the request path.
///
/// Allowed requests carry the `ResolvedSession` in their extensions for the
/// handlers and extractors downstream; nothing resolves it a second time.
pub async fn route_guard(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = session_token(req.headers());
    let session = resolve_session(state.identity.as_ref(), state.db.as_ref(), token.as_deref()).await;

    let paths = &state.config.guard_paths;
    let decision = guard::evaluate(paths, req.uri().path(), &session);

    let mut response = match decision.redirect_target(paths) {
        Some(target) => {
            debug!(path = %req.uri().path(), ?decision, target, "Guard redirect");
            Redirect::to(target).into_response()
        }
        None => {
            debug_assert_eq!(decision, GuardDecision::Allow);
            req.extensions_mut().insert(session);
            next.run(req).await
        }
    };

    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cookies: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for cookie in cookies {
            map.append(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        map
    }

    #[test]
    fn finds_session_among_other_cookies() {
        assert_eq!(
            session_token(&headers(&["theme=dark; session=abc-123; lang=en"])),
            Some("abc-123".to_string())
        );
        assert_eq!(
            session_token(&headers(&["theme=dark", "session=xyz"])),
            Some("xyz".to_string())
        );
    }

    #[test]
    fn ignores_lookalike_and_empty_cookies() {
        assert_eq!(session_token(&headers(&["session_old=abc"])), None);
        assert_eq!(session_token(&headers(&["session="])), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }
}
