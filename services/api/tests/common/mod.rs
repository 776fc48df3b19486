#![allow(dead_code)]

use std::sync::Arc;

use api_lib::adapters::InMemoryStore;
use api_lib::config::Config;
use api_lib::web::{self, AppState};
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use studio_core::domain::{Role, User};
use studio_core::ports::IdentityService;
use tower::ServiceExt;

/// The full router over one in-memory store that plays every port, so tests
/// can seed data, inject failures and inspect revalidations.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
}

/// Build the application router exactly as the binary does, backed by a
/// fresh [`InMemoryStore`].
pub fn test_app() -> TestApp {
    test_app_with_config(Config::default())
}

pub fn test_app_with_config(config: Config) -> TestApp {
    let store = Arc::new(InMemoryStore::default());
    let state = Arc::new(AppState::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(config),
    ));
    TestApp {
        router: web::router(state),
        store,
    }
}

impl TestApp {
    /// Seeds a user with `role` and opens a session; returns the user and
    /// a ready-to-send `Cookie` header value.
    pub async fn sign_in(&self, email: &str, role: Option<Role>) -> (User, String) {
        let user = self.store.seed_user(email, role);
        let session = self.store.create_session(user.id).await.unwrap();
        (user, format!("session={}", session.token))
    }

    pub async fn admin_cookie(&self) -> String {
        self.sign_in("owner@studio.test", Some(Role::Admin)).await.1
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        self.send(request(Method::GET, uri, cookie, Body::empty(), None))
            .await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        self.send(request(Method::DELETE, uri, cookie, Body::empty(), None))
            .await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        body: serde_json::Value,
        cookie: Option<&str>,
    ) -> Response<Body> {
        self.send(json_request(Method::POST, uri, body, cookie)).await
    }

    pub async fn patch_json(
        &self,
        uri: &str,
        body: serde_json::Value,
        cookie: Option<&str>,
    ) -> Response<Body> {
        self.send(json_request(Method::PATCH, uri, body, cookie)).await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        form: MultipartBody,
        cookie: Option<&str>,
    ) -> Response<Body> {
        let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
        self.send(request(
            Method::POST,
            uri,
            cookie,
            Body::from(form.finish()),
            Some(&content_type),
        ))
        .await
    }
}

fn request(
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Body,
    content_type: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    builder.body(body).unwrap()
}

fn json_request(
    method: Method,
    uri: &str,
    body: serde_json::Value,
    cookie: Option<&str>,
) -> Request<Body> {
    request(
        method,
        uri,
        cookie,
        Body::from(serde_json::to_vec(&body).unwrap()),
        Some("application/json"),
    )
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn header<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

pub fn set_cookie(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
}

// ---------------------------------------------------------------------------
// Multipart
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "studio-test-boundary";

/// A hand-built `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartBody {
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(data);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.bytes
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.bytes
    }
}
