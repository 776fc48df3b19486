//! services/api/src/web/messages.rs

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use studio_core::domain::Message;
use studio_core::inbox::ContactForm;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ActionReply, ActionResponse};
use crate::web::extract::RequireAdmin;
use crate::web::state::AppState;

/// Contact form payload. `subject_visual` carries the radio choice when the
/// hidden `subject` input is missing.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ContactRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub subject_visual: Option<String>,
    pub message: String,
}

impl From<ContactRequest> for ContactForm {
    fn from(request: ContactRequest) -> Self {
        ContactForm {
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            phone: request.phone,
            subject: request.subject,
            subject_visual: request.subject_visual,
            message: request.message,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct UnreadCount {
    pub count: i64,
}

/// An opened message and whether opening it flipped it to `read`.
#[derive(Serialize)]
pub struct ViewedMessage {
    pub message: Message,
    pub marked_read: bool,
}

/// POST /api/contact - Send a message from the contact form (anonymous)
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Message stored as unread", body = ActionReply),
        (status = 400, description = "Missing required field", body = ActionReply),
        (status = 500, description = "Store failure", body = ActionReply)
    )
)]
pub async fn submit_contact_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ContactRequest>,
) -> ActionResponse {
    let message = state.inbox().submit(request.into()).await?;
    Ok(Json(ActionReply::message("Message sent").with_id(message.id)))
}

/// GET /api/admin/messages - Every message, newest first
#[utoipa::path(
    get,
    path = "/api/admin/messages",
    responses(
        (status = 200, description = "Messages, newest first"),
        (status = 401, description = "Not an admin", body = ActionReply)
    )
)]
pub async fn list_messages_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<Vec<Message>> {
    Json(state.inbox().list().await)
}

/// GET /api/admin/messages/unread-count
#[utoipa::path(
    get,
    path = "/api/admin/messages/unread-count",
    responses(
        (status = 200, description = "Number of unread messages", body = UnreadCount),
        (status = 401, description = "Not an admin", body = ActionReply)
    )
)]
pub async fn unread_count_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<UnreadCount> {
    Json(UnreadCount {
        count: state.inbox().unread_count().await,
    })
}

/// POST /api/admin/messages/{id}/view - Open a message, marking it read
#[utoipa::path(
    post,
    path = "/api/admin/messages/{id}/view",
    params(("id" = Uuid, Path, description = "Message id")),
    responses(
        (status = 200, description = "The message and whether this view marked it read"),
        (status = 401, description = "Not an admin", body = ActionReply),
        (status = 404, description = "No such message", body = ActionReply)
    )
)]
pub async fn view_message_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> ActionResponse<ViewedMessage> {
    let (message, marked_read) = state.inbox().view_and_mark_read(id).await?;
    Ok(Json(ViewedMessage {
        message,
        marked_read,
    }))
}

/// POST /api/admin/messages/{id}/read
#[utoipa::path(
    post,
    path = "/api/admin/messages/{id}/read",
    params(("id" = Uuid, Path, description = "Message id")),
    responses(
        (status = 200, description = "Marked read", body = ActionReply),
        (status = 401, description = "Not an admin", body = ActionReply)
    )
)]
pub async fn mark_read_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> ActionResponse {
    state.inbox().mark_read(id).await?;
    Ok(Json(ActionReply::ok().with_id(id)))
}

/// DELETE /api/admin/messages/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/messages/{id}",
    params(("id" = Uuid, Path, description = "Message id")),
    responses(
        (status = 200, description = "Deleted", body = ActionReply),
        (status = 401, description = "Not an admin", body = ActionReply),
        (status = 404, description = "No such message", body = ActionReply)
    )
)]
pub async fn delete_message_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> ActionResponse {
    state.inbox().delete(id).await?;
    Ok(Json(ActionReply::message("Message deleted").with_id(id)))
}
