mod common;

use api_lib::adapters::FailPoint;
use axum::http::StatusCode;
use common::{body_json, test_app, TestApp};
use serde_json::json;

async fn send_contact(app: &TestApp, body: serde_json::Value) -> String {
    let response = app.post_json("/api/contact", body, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["id"].as_str().unwrap().to_string()
}

fn jo_lee() -> serde_json::Value {
    json!({
        "first_name": "Jo",
        "last_name": "Lee",
        "email": "jo@x.com",
        "subject": "General Inquiry",
        "message": "Hi",
    })
}

async fn unread(app: &TestApp, admin: &str) -> i64 {
    let json = body_json(app.get("/api/admin/messages/unread-count", Some(admin)).await).await;
    json["count"].as_i64().unwrap()
}

#[tokio::test]
async fn contact_message_is_read_exactly_once() {
    let app = test_app();
    let admin = app.admin_cookie().await;
    let id = send_contact(&app, jo_lee()).await;
    assert_eq!(unread(&app, &admin).await, 1);

    let uri = format!("/api/admin/messages/{id}/view");
    let first = body_json(app.post_json(&uri, json!({}), Some(&admin)).await).await;
    assert_eq!(first["marked_read"], true);
    assert_eq!(first["message"]["status"], "read");
    assert_eq!(first["message"]["first_name"], "Jo");
    assert_eq!(unread(&app, &admin).await, 0);

    let second = body_json(app.post_json(&uri, json!({}), Some(&admin)).await).await;
    assert_eq!(second["marked_read"], false);
    assert_eq!(unread(&app, &admin).await, 0);
    assert!(app.store.revalidated().contains(&"/admin/messages".to_string()));
}

#[tokio::test]
async fn radio_subject_is_used_when_hidden_input_is_missing() {
    let app = test_app();
    let admin = app.admin_cookie().await;
    let mut body = jo_lee();
    body["subject"] = json!("");
    body["subject_visual"] = json!("Event Coverage");
    send_contact(&app, body).await;

    let messages = body_json(app.get("/api/admin/messages", Some(&admin)).await).await;
    assert_eq!(messages[0]["subject"], "Event Coverage");
    assert_eq!(messages[0]["status"], "unread");
}

#[tokio::test]
async fn blank_field_is_named_in_the_error() {
    let app = test_app();
    let mut body = jo_lee();
    body["last_name"] = json!(" ");

    let response = app.post_json("/api/contact", body, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Missing required field: last_name"
    );
}

#[tokio::test]
async fn store_failure_on_contact_is_reported() {
    let app = test_app();
    app.store.fail(FailPoint::InsertMessage);

    let response = app.post_json("/api/contact", jo_lee(), None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["error"],
        "Failed to send message. Please try again."
    );
}

#[tokio::test]
async fn inbox_page_lists_newest_first_with_unread_count() {
    let app = test_app();
    let admin = app.admin_cookie().await;
    send_contact(&app, jo_lee()).await;
    let mut second = jo_lee();
    second["first_name"] = json!("Sam");
    send_contact(&app, second).await;

    let page = body_json(app.get("/admin/messages", Some(&admin)).await).await;
    assert_eq!(page["unread"], 2);
    assert_eq!(page["messages"][0]["first_name"], "Sam");
    assert_eq!(page["messages"][1]["first_name"], "Jo");
}

#[tokio::test]
async fn deleted_message_is_gone() {
    let app = test_app();
    let admin = app.admin_cookie().await;
    let id = send_contact(&app, jo_lee()).await;

    let response = app.delete(&format!("/api/admin/messages/{id}"), Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Message deleted");

    let messages = body_json(app.get("/api/admin/messages", Some(&admin)).await).await;
    assert!(messages.as_array().unwrap().is_empty());

    let again = app.delete(&format!("/api/admin/messages/{id}"), Some(&admin)).await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn viewing_an_unknown_message_is_404() {
    let app = test_app();
    let admin = app.admin_cookie().await;
    let response = app
        .post_json(
            &format!("/api/admin/messages/{}/view", uuid::Uuid::new_v4()),
            json!({}),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unread_count_failure_shows_zero() {
    let app = test_app();
    let admin = app.admin_cookie().await;
    send_contact(&app, jo_lee()).await;
    app.store.fail(FailPoint::ListMessages);

    assert_eq!(unread(&app, &admin).await, 0);
}
