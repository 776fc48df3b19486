mod common;

use api_lib::adapters::FailPoint;
use api_lib::config::Config;
use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request, StatusCode};
use common::{body_json, header, set_cookie, test_app, test_app_with_config, TestApp};
use serde_json::json;
use studio_core::domain::Role;

/// Runs the whole code flow and returns the `Cookie` value the browser would send.
async fn sign_in_by_code(app: &TestApp, email: &str) -> String {
    let response = app.post_json("/auth/otp", json!({ "email": email }), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let code = app.store.last_code(email).unwrap();
    let response = app
        .post_json("/auth/verify", json!({ "email": email, "code": code }), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response).unwrap().to_string();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn code_sign_in_sets_a_session_cookie() {
    let app = test_app();
    let response = app
        .post_json("/auth/otp", json!({ "email": "Client@Example.com" }), None)
        .await;
    assert_eq!(
        body_json(response).await["message"],
        "Check your email for a sign-in code"
    );

    let cookie = sign_in_by_code(&app, "client@example.com").await;
    assert!(cookie.starts_with("session="));

    // A fresh account is a plain user.
    let response = app.get("/admin", Some(&cookie)).await;
    assert_eq!(header(&response, "location"), Some("/access-denied"));
    let response = app.get("/login", Some(&cookie)).await;
    assert_eq!(header(&response, "location"), Some("/"));
}

#[tokio::test]
async fn existing_admin_signs_in_to_the_dashboard() {
    let app = test_app();
    app.store.seed_user("owner@studio.test", Some(Role::Admin));

    let cookie = sign_in_by_code(&app, "owner@studio.test").await;
    let response = app.get("/admin", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn code_is_single_use() {
    let app = test_app();
    app.post_json("/auth/otp", json!({ "email": "jo@x.com" }), None)
        .await;
    let code = app.store.last_code("jo@x.com").unwrap();
    let body = json!({ "email": "jo@x.com", "code": code });

    let first = app.post_json("/auth/verify", body.clone(), None).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.post_json("/auth/verify", body, None).await;
    assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(set_cookie(&second), None);
    assert_eq!(body_json(second).await["error"], "Invalid or expired code");
}

#[tokio::test]
async fn code_stops_working_after_five_wrong_guesses() {
    let app = test_app();
    app.store.seed_user("owner@studio.test", Some(Role::Admin));
    app.post_json("/auth/otp", json!({ "email": "owner@studio.test" }), None)
        .await;
    let code = app.store.last_code("owner@studio.test").unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };

    for _ in 0..5 {
        let response = app
            .post_json(
                "/auth/verify",
                json!({ "email": "owner@studio.test", "code": wrong }),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = app
        .post_json(
            "/auth/verify",
            json!({ "email": "owner@studio.test", "code": code }),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(set_cookie(&response), None);

    // Requesting a new code starts over.
    let cookie = sign_in_by_code(&app, "owner@studio.test").await;
    assert_eq!(app.get("/admin", Some(&cookie)).await.status(), StatusCode::OK);
}

fn code_request_from(ip: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/auth/otp")
        .header(CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(r#"{"email":"jo@x.com"}"#))
        .unwrap()
}

#[tokio::test]
async fn sign_in_requests_are_rate_limited_per_client() {
    let app = test_app_with_config(Config {
        auth_rate_per_minute: 0.0,
        auth_burst: 3.0,
        ..Config::default()
    });

    for _ in 0..3 {
        let response = app.send(code_request_from("203.0.113.9")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = app.send(code_request_from("203.0.113.9")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let reply = body_json(response).await;
    assert_eq!(reply["success"], false);
    assert_eq!(reply["error"], "Too many attempts. Please wait and try again.");

    let response = app.send(code_request_from("198.51.100.4")).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Other anonymous actions are not limited.
    let response = app.post_json("/auth/logout", json!({}), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn blank_email_is_rejected() {
    let app = test_app();
    let response = app.post_json("/auth/otp", json!({ "email": " " }), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Email is required");
}

#[tokio::test]
async fn identity_store_outage_is_a_500() {
    let app = test_app();
    app.post_json("/auth/otp", json!({ "email": "jo@x.com" }), None)
        .await;
    let code = app.store.last_code("jo@x.com").unwrap();
    app.store.fail(FailPoint::VerifyCode);

    let response = app
        .post_json("/auth/verify", json!({ "email": "jo@x.com", "code": code }), None)
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "Could not sign in");
}

#[tokio::test]
async fn logout_ends_the_session_and_clears_the_cookie() {
    let app = test_app();
    let cookie = app.admin_cookie().await;

    let response = app.post_json("/auth/logout", json!({}), Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = set_cookie(&response).unwrap();
    assert!(cleared.starts_with("session=;"));
    assert!(cleared.contains("Max-Age=0"));

    let response = app.get("/admin", Some(&cookie)).await;
    assert_eq!(header(&response, "location"), Some("/login"));
}
