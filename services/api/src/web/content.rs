//! services/api/src/web/content.rs
//!
//! Categories, photos and the public portfolio, plus the multipart reader the
//! upload endpoints share.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use studio_core::content::{CategoryPage, CategoryShowcase, UploadFailure};
use studio_core::domain::{Category, NewPhoto, Photo, PhotoRef, UploadFile};
use studio_core::error::ActionError;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ActionRejection, ActionReply, ActionResponse};
use crate::web::extract::RequireAdmin;
use crate::web::state::AppState;

//=========================================================================================
// Multipart
//=========================================================================================

/// The text fields and file parts of a multipart form.
#[derive(Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<UploadFile>,
}

impl MultipartForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Every non-empty file part, in the order received.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ActionRejection> {
        let mut form = MultipartForm::default();
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            warn!("Multipart error: {}", e);
            ActionError::Validation("Malformed form data".to_string())
        })? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.map_err(|e| {
                        warn!(file = %file_name, "Failed to read file part: {}", e);
                        ActionError::Validation(format!("Could not read {file_name}"))
                    })?;
                    if !data.is_empty() {
                        form.files.push(UploadFile {
                            file_name,
                            content_type,
                            data,
                        });
                    }
                }
                None => {
                    let value = field.text().await.map_err(|e| {
                        warn!(field = %name, "Failed to read text part: {}", e);
                        ActionError::Validation(format!("Could not read {name}"))
                    })?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }
}

//=========================================================================================
// Payloads
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct NewCategoryRequest {
    pub title: String,
    /// Optional explicit id; slugified like the title.
    pub id: Option<String>,
}

/// A photo already in storage, recorded by its public URL and object key.
#[derive(Deserialize, ToSchema)]
pub struct NewPhotoRequest {
    pub url: String,
    pub storage_path: String,
    pub category_id: String,
}

impl From<NewPhotoRequest> for NewPhoto {
    fn from(request: NewPhotoRequest) -> Self {
        NewPhoto {
            url: request.url,
            storage_path: request.storage_path,
            category_id: request.category_id,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct PhotoSelection {
    pub id: Uuid,
    pub storage_path: String,
}

impl From<PhotoSelection> for PhotoRef {
    fn from(selection: PhotoSelection) -> Self {
        PhotoRef {
            id: selection.id,
            storage_path: selection.storage_path,
        }
    }
}

#[derive(Deserialize)]
pub struct PhotoFilter {
    pub category: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct StoragePath {
    pub storage_path: String,
}

#[derive(Serialize)]
pub struct UploadSummary {
    pub success: bool,
    pub uploaded: usize,
    pub failed: usize,
    pub photos: Vec<Photo>,
    pub failures: Vec<UploadFailure>,
}

//=========================================================================================
// Categories
//=========================================================================================

/// POST /api/admin/categories
#[utoipa::path(
    post,
    path = "/api/admin/categories",
    request_body = NewCategoryRequest,
    responses(
        (status = 200, description = "Created; `id` is the category slug", body = ActionReply),
        (status = 400, description = "Missing title", body = ActionReply),
        (status = 401, description = "Not an admin", body = ActionReply),
        (status = 409, description = "Category ID already exists", body = ActionReply)
    )
)]
pub async fn create_category_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
    Json(req): Json<NewCategoryRequest>,
) -> ActionResponse {
    let category = state
        .content()
        .create_category(&req.title, req.id.as_deref())
        .await?;
    Ok(Json(ActionReply::message("Category created").with_id(category.id)))
}

/// GET /api/admin/categories - Oldest first
#[utoipa::path(
    get,
    path = "/api/admin/categories",
    responses(
        (status = 200, description = "Categories, oldest first"),
        (status = 401, description = "Not an admin", body = ActionReply)
    )
)]
pub async fn list_categories_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<Vec<Category>> {
    Json(state.content().list_categories().await)
}

/// DELETE /api/admin/categories/{id} - Refused while photos reference it
#[utoipa::path(
    delete,
    path = "/api/admin/categories/{id}",
    params(("id" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Deleted", body = ActionReply),
        (status = 401, description = "Not an admin", body = ActionReply),
        (status = 404, description = "No such category", body = ActionReply),
        (status = 409, description = "Category still contains photos", body = ActionReply)
    )
)]
pub async fn delete_category_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> ActionResponse {
    state.content().delete_category(&id).await?;
    Ok(Json(ActionReply::message("Category deleted").with_id(id)))
}

//=========================================================================================
// Photos
//=========================================================================================

/// GET /api/admin/photos?category=&limit=
#[utoipa::path(
    get,
    path = "/api/admin/photos",
    params(
        ("category" = Option<String>, Query, description = "Only photos in this category"),
        ("limit" = Option<i64>, Query, description = "At most this many")
    ),
    responses(
        (status = 200, description = "Photos, newest first"),
        (status = 401, description = "Not an admin", body = ActionReply)
    )
)]
pub async fn list_photos_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filter): Query<PhotoFilter>,
) -> Json<Vec<Photo>> {
    Json(
        state
            .content()
            .list_photos(filter.category.as_deref(), filter.limit)
            .await,
    )
}

/// POST /api/admin/photos - Upload one or more photos into a category
///
/// Multipart form with a `category_id` field and one or more file parts.
#[utoipa::path(
    post,
    path = "/api/admin/photos",
    request_body(content_type = "multipart/form-data", description = "`category_id` plus file parts"),
    responses(
        (status = 200, description = "At least one photo uploaded; counts per outcome"),
        (status = 400, description = "No category or no files", body = ActionReply),
        (status = 401, description = "Not an admin", body = ActionReply),
        (status = 404, description = "No such category", body = ActionReply),
        (status = 500, description = "Nothing could be uploaded")
    )
)]
pub async fn upload_photos_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
    multipart: Multipart,
) -> Result<Response, ActionRejection> {
    let form = MultipartForm::read(multipart).await?;
    let category_id = form
        .field("category_id")
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(ActionError::MissingField("category_id"))?
        .to_string();

    let report = state.content().upload_photos(&category_id, form.files).await?;
    let status = if report.uploaded.is_empty() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    let summary = UploadSummary {
        success: !report.uploaded.is_empty(),
        uploaded: report.uploaded.len(),
        failed: report.failed.len(),
        photos: report.uploaded,
        failures: report.failed,
    };
    Ok((status, Json(summary)).into_response())
}

/// POST /api/admin/photos/metadata - Record photos already in storage
#[utoipa::path(
    post,
    path = "/api/admin/photos/metadata",
    request_body = Vec<NewPhotoRequest>,
    responses(
        (status = 200, description = "Rows inserted", body = ActionReply),
        (status = 400, description = "No photos to save", body = ActionReply),
        (status = 401, description = "Not an admin", body = ActionReply),
        (status = 500, description = "Database insert failed", body = ActionReply)
    )
)]
pub async fn save_metadata_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
    Json(photos): Json<Vec<NewPhotoRequest>>,
) -> ActionResponse {
    let photos = photos.into_iter().map(Into::into).collect();
    let saved = state.content().save_photo_metadata(photos).await?;
    Ok(Json(ActionReply::message(format!(
        "Saved {} photos",
        saved.len()
    ))))
}

/// DELETE /api/admin/photos/{id}?storage_path= - Remove a photo and its blob
#[utoipa::path(
    delete,
    path = "/api/admin/photos/{id}",
    params(
        ("id" = Uuid, Path, description = "Photo id"),
        ("storage_path" = String, Query, description = "The photo's object key")
    ),
    responses(
        (status = 200, description = "Deleted", body = ActionReply),
        (status = 401, description = "Not an admin", body = ActionReply),
        (status = 500, description = "Storage or database removal failed", body = ActionReply)
    )
)]
pub async fn delete_photo_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    Query(path): Query<StoragePath>,
) -> ActionResponse {
    state.content().delete_photo(id, &path.storage_path).await?;
    Ok(Json(ActionReply::message("Photo deleted").with_id(id)))
}

/// POST /api/admin/photos/delete - Remove several photos at once
#[utoipa::path(
    post,
    path = "/api/admin/photos/delete",
    request_body = Vec<PhotoSelection>,
    responses(
        (status = 200, description = "Deleted", body = ActionReply),
        (status = 400, description = "No items selected", body = ActionReply),
        (status = 401, description = "Not an admin", body = ActionReply),
        (status = 500, description = "Storage or database removal failed; nothing deleted", body = ActionReply)
    )
)]
pub async fn delete_photos_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
    Json(selection): Json<Vec<PhotoSelection>>,
) -> ActionResponse {
    let items: Vec<PhotoRef> = selection.into_iter().map(Into::into).collect();
    let removed = state.content().delete_photos(&items).await?;
    Ok(Json(ActionReply::message(format!("Deleted {removed} photos"))))
}

//=========================================================================================
// Public portfolio
//=========================================================================================

/// GET /portfolio - Every category with its newest photos
#[utoipa::path(
    get,
    path = "/portfolio",
    responses((status = 200, description = "Categories oldest first, each with up to 10 photo URLs"))
)]
pub async fn portfolio_handler(State(state): State<Arc<AppState>>) -> Json<Vec<CategoryShowcase>> {
    Json(state.content().portfolio().await)
}

/// GET /portfolio/{category}
#[utoipa::path(
    get,
    path = "/portfolio/{category}",
    params(("category" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "The category and its photos, newest first"),
        (status = 404, description = "No such category", body = ActionReply)
    )
)]
pub async fn category_page_handler(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> ActionResponse<CategoryPage> {
    state
        .content()
        .category_page(&category)
        .await
        .map(Json)
        .ok_or_else(|| ActionError::NotFound(format!("Category {category} not found")).into())
}
