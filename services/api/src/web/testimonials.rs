//! services/api/src/web/testimonials.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use studio_core::domain::Testimonial;
use studio_core::showcase::{TestimonialForm, DEFAULT_TESTIMONIAL_LIMIT};
use uuid::Uuid;

use crate::error::{ActionReply, ActionResponse};
use crate::web::content::MultipartForm;
use crate::web::extract::RequireAdmin;
use crate::web::state::AppState;

#[derive(Deserialize)]
pub struct TestimonialQuery {
    pub limit: Option<i64>,
}

/// GET /testimonials?limit= - Newest first, 3 unless asked otherwise
#[utoipa::path(
    get,
    path = "/testimonials",
    params(("limit" = Option<i64>, Query, description = "At most this many (default 3)")),
    responses((status = 200, description = "Testimonials, newest first"))
)]
pub async fn public_testimonials_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TestimonialQuery>,
) -> Json<Vec<Testimonial>> {
    let limit = query.limit.unwrap_or(DEFAULT_TESTIMONIAL_LIMIT);
    Json(state.showcase().list_testimonials(Some(limit)).await)
}

/// GET /api/admin/testimonials - All of them, newest first
#[utoipa::path(
    get,
    path = "/api/admin/testimonials",
    responses(
        (status = 200, description = "Testimonials, newest first"),
        (status = 401, description = "Not an admin", body = ActionReply)
    )
)]
pub async fn list_testimonials_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<Vec<Testimonial>> {
    Json(state.showcase().list_testimonials(None).await)
}

/// POST /api/admin/testimonials - Multipart: name, location, text, rating, optional image
#[utoipa::path(
    post,
    path = "/api/admin/testimonials",
    request_body(content_type = "multipart/form-data", description = "name, location, text, rating (1-5), optional image"),
    responses(
        (status = 200, description = "Created", body = ActionReply),
        (status = 400, description = "Missing field or bad rating", body = ActionReply),
        (status = 401, description = "Not an admin", body = ActionReply)
    )
)]
pub async fn create_testimonial_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
    multipart: Multipart,
) -> ActionResponse {
    let mut form = MultipartForm::read(multipart).await?;
    let mut take = |name: &str| form.fields.remove(name).unwrap_or_default();
    let testimonial_form = TestimonialForm {
        name: take("name"),
        location: take("location"),
        text: take("text"),
        rating: take("rating"),
    };
    let image = form.files.into_iter().next();

    let testimonial = state
        .showcase()
        .create_testimonial(testimonial_form, image)
        .await?;
    Ok(Json(
        ActionReply::message("Testimonial added").with_id(testimonial.id),
    ))
}

/// DELETE /api/admin/testimonials/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/testimonials/{id}",
    params(("id" = Uuid, Path, description = "Testimonial id")),
    responses(
        (status = 200, description = "Deleted", body = ActionReply),
        (status = 401, description = "Not an admin", body = ActionReply),
        (status = 404, description = "No such testimonial", body = ActionReply)
    )
)]
pub async fn delete_testimonial_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> ActionResponse {
    state.showcase().delete_testimonial(id).await?;
    Ok(Json(ActionReply::message("Testimonial deleted").with_id(id)))
}
