//! HTTP-level tests for the booking lifecycle: anonymous submission, admin
//! status changes and the financial aggregates.

mod common;

use api_lib::adapters::FailPoint;
use axum::http::StatusCode;
use common::{body_json, test_app, TestApp};
use serde_json::json;

fn booking(name: &str, price: &str) -> serde_json::Value {
    json!({
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "phone": "0871234567",
        "package_name": "Family Session",
        "package_price": price,
        "category_title": "Family",
        "message": "Saturday mornings work best",
    })
}

async fn submit(app: &TestApp, name: &str, price: &str) -> String {
    let response = app.post_json("/api/bookings", booking(name, price), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    json["id"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn anonymous_submission_is_stored_as_pending() {
    let app = test_app();
    let id = submit(&app, "Aoife", "€165").await;
    let admin = app.admin_cookie().await;

    let json = body_json(app.get("/api/admin/bookings", Some(&admin)).await).await;
    let bookings = json.as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["id"], id.as_str());
    assert_eq!(bookings[0]["status"], "pending");
    assert_eq!(bookings[0]["package_price"], "€165");
    assert!(app.store.revalidated().contains(&"/admin/bookings".to_string()));
}

#[tokio::test]
async fn status_in_the_form_is_ignored() {
    let app = test_app();
    let mut body = booking("Cian", "€250");
    body["status"] = json!("completed");
    let response = app.post_json("/api/bookings", body, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let admin = app.admin_cookie().await;
    let json = body_json(app.get("/api/admin/bookings", Some(&admin)).await).await;
    assert_eq!(json[0]["status"], "pending");
}

#[tokio::test]
async fn missing_required_field_is_reported_by_name() {
    let app = test_app();
    let mut body = booking("Nora", "€100");
    body["email"] = json!("   ");

    let response = app.post_json("/api/bookings", body, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Missing required field: email");
}

#[tokio::test]
async fn store_failure_on_submit_is_reported() {
    let app = test_app();
    app.store.fail(FailPoint::InsertBooking);

    let response = app.post_json("/api/bookings", booking("Liam", "€100"), None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["error"],
        "Failed to create booking. Please try again."
    );
}

// ---------------------------------------------------------------------------
// Status changes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn admin_can_move_between_any_statuses() {
    let app = test_app();
    let id = submit(&app, "Aoife", "€165").await;
    let admin = app.admin_cookie().await;
    let uri = format!("/api/admin/bookings/{id}/status");

    for status in ["completed", "pending", "cancelled", "confirmed"] {
        let response = app
            .patch_json(&uri, json!({ "status": status }), Some(&admin))
            .await;
        assert_eq!(response.status(), StatusCode::OK, "{status}");
        let listed = body_json(app.get("/api/admin/bookings", Some(&admin)).await).await;
        assert_eq!(listed[0]["status"], status);
    }
}

#[tokio::test]
async fn invalid_status_is_rejected_before_writing() {
    let app = test_app();
    let id = submit(&app, "Aoife", "€165").await;
    let admin = app.admin_cookie().await;

    let response = app
        .patch_json(
            &format!("/api/admin/bookings/{id}/status"),
            json!({ "status": "archived" }),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid status");

    let listed = body_json(app.get("/api/admin/bookings", Some(&admin)).await).await;
    assert_eq!(listed[0]["status"], "pending");
}

#[tokio::test]
async fn status_update_store_failure() {
    let app = test_app();
    let id = submit(&app, "Aoife", "€165").await;
    let admin = app.admin_cookie().await;
    app.store.fail(FailPoint::UpdateBookingStatus);

    let response = app
        .patch_json(
            &format!("/api/admin/bookings/{id}/status"),
            json!({ "status": "confirmed" }),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "Failed to update status");
}

#[tokio::test]
async fn anonymous_cannot_change_status() {
    let app = test_app();
    let id = submit(&app, "Aoife", "€165").await;

    let response = app
        .patch_json(
            &format!("/api/admin/bookings/{id}/status"),
            json!({ "status": "confirmed" }),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Financial stats
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stats_split_completed_from_unsettled() {
    let app = test_app();
    let admin = app.admin_cookie().await;
    let completed = submit(&app, "Aoife", "€165").await;
    let confirmed = submit(&app, "Cian", "€250").await;
    submit(&app, "Nora", "€100").await;

    for (id, status) in [(&completed, "completed"), (&confirmed, "confirmed")] {
        app.patch_json(
            &format!("/api/admin/bookings/{id}/status"),
            json!({ "status": status }),
            Some(&admin),
        )
        .await;
    }

    let stats = body_json(app.get("/api/admin/bookings/stats", Some(&admin)).await).await;
    assert_eq!(stats["profit"], 165.0);
    assert_eq!(stats["unsettled"], 250.0);
    assert_eq!(stats["total_bookings"], 3);
}

#[tokio::test]
async fn stats_read_failure_degrades_to_zero() {
    let app = test_app();
    let admin = app.admin_cookie().await;
    submit(&app, "Aoife", "€165").await;
    app.store.fail(FailPoint::BookingPrices);

    let response = app.get("/api/admin/bookings/stats", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let stats = body_json(response).await;
    assert_eq!(stats["profit"], 0.0);
    assert_eq!(stats["unsettled"], 0.0);
    assert_eq!(stats["total_bookings"], 0);
}

#[tokio::test]
async fn list_failure_degrades_to_empty() {
    let app = test_app();
    let admin = app.admin_cookie().await;
    submit(&app, "Aoife", "€165").await;
    app.store.fail(FailPoint::ListBookings);

    let json = body_json(app.get("/admin/bookings", Some(&admin)).await).await;
    assert!(json["bookings"].as_array().unwrap().is_empty());
}
