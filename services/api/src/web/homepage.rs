//! services/api/src/web/homepage.rs

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use std::sync::Arc;
use studio_core::domain::HomepageImage;
use uuid::Uuid;

use crate::error::{ActionReply, ActionResponse};
use crate::web::content::MultipartForm;
use crate::web::extract::RequireAdmin;
use crate::web::state::AppState;

/// GET /homepage-images - The grid, newest 12
#[utoipa::path(
    get,
    path = "/homepage-images",
    responses((status = 200, description = "Up to 12 images, newest first"))
)]
pub async fn homepage_images_handler(State(state): State<Arc<AppState>>) -> Json<Vec<HomepageImage>> {
    Json(state.showcase().homepage_images().await)
}

/// POST /api/admin/homepage - Multipart file parts for the grid
#[utoipa::path(
    post,
    path = "/api/admin/homepage",
    request_body(content_type = "multipart/form-data", description = "One or more image files"),
    responses(
        (status = 200, description = "Images added", body = ActionReply),
        (status = 400, description = "Would exceed 12 images, or no files", body = ActionReply),
        (status = 401, description = "Not an admin", body = ActionReply),
        (status = 500, description = "No image could be uploaded", body = ActionReply)
    )
)]
pub async fn add_homepage_images_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
    multipart: Multipart,
) -> ActionResponse {
    let form = MultipartForm::read(multipart).await?;
    let added = state.showcase().add_homepage_images(form.files).await?;
    Ok(Json(ActionReply::message(format!(
        "Added {} images",
        added.len()
    ))))
}

/// DELETE /api/admin/homepage/{id} - Removes the grid entry; the blob is kept
#[utoipa::path(
    delete,
    path = "/api/admin/homepage/{id}",
    params(("id" = Uuid, Path, description = "Homepage image id")),
    responses(
        (status = 200, description = "Deleted", body = ActionReply),
        (status = 401, description = "Not an admin", body = ActionReply),
        (status = 404, description = "No such image", body = ActionReply)
    )
)]
pub async fn delete_homepage_image_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> ActionResponse {
    state.showcase().delete_homepage_image(id).await?;
    Ok(Json(ActionReply::message("Image removed").with_id(id)))
}
