//! crates/studio_core/src/content.rs
//!
//! Categories and photos: the referential rule between them, the two-phase
//! upload (blob, then row) and the two-phase delete (blob, then row).

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{Category, NewPhoto, Photo, PhotoRef, UploadFile};
use crate::error::{ActionError, ActionResult};
use crate::ports::{CacheInvalidator, DatabaseService, ObjectStorage, PortError};
use crate::slug::slugify;

/// Photos shown per category on the portfolio overview.
pub const PORTFOLIO_PHOTOS_PER_CATEGORY: i64 = 10;

/// One category with its newest photo URLs, for the portfolio overview.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryShowcase {
    pub id: String,
    pub title: String,
    pub images: Vec<String>,
}

/// A category page: the category and all its photos, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryPage {
    pub category: Category,
    pub photos: Vec<Photo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadFailure {
    pub file_name: String,
    pub error: String,
}

/// The result of a multi-file upload. Partial success is a normal outcome.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub uploaded: Vec<Photo>,
    pub failed: Vec<UploadFailure>,
}

impl UploadReport {
    pub fn total(&self) -> usize {
        self.uploaded.len() + self.failed.len()
    }
}

/// `<prefix>/<millis>-<random>.<ext>`, unique enough for concurrent admins.
pub fn storage_key(prefix: &str, file: &UploadFile) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{}/{}-{}.{}",
        prefix,
        Utc::now().timestamp_millis(),
        &random[..7],
        file.extension()
    )
}

#[derive(Clone)]
pub struct ContentService {
    db: Arc<dyn DatabaseService>,
    storage: Arc<dyn ObjectStorage>,
    cache: Arc<dyn CacheInvalidator>,
}

impl ContentService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        storage: Arc<dyn ObjectStorage>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Self {
        Self { db, storage, cache }
    }

    fn revalidate(&self, paths: &[&str]) {
        for path in paths {
            self.cache.revalidate(path);
        }
    }

    //=====================================================================================
    // Categories
    //=====================================================================================

    /// Creates a category. The id is the slug of `explicit_id` when given,
    /// otherwise of `title`.
    pub async fn create_category(&self, title: &str, explicit_id: Option<&str>) -> ActionResult<Category> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ActionError::MissingField("title"));
        }
        let id = match explicit_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => slugify(id),
            None => slugify(title),
        };
        if id.is_empty() {
            return Err(ActionError::Validation(
                "Category ID must contain letters or digits".to_string(),
            ));
        }

        let category = self.db.insert_category(&id, title).await.map_err(|e| match e {
            PortError::Duplicate(_) => ActionError::Conflict("Category ID already exists".to_string()),
            other => {
                error!(category_id = %id, "Error creating category: {:?}", other);
                ActionError::store("Failed to create category", &other)
            }
        })?;

        info!(category_id = %category.id, "Category created");
        self.revalidate(&["/admin/categories", "/admin", "/portfolio"]);
        Ok(category)
    }

    /// Oldest first. Empty on read failure.
    pub async fn list_categories(&self) -> Vec<Category> {
        self.db.list_categories().await.unwrap_or_else(|e| {
            error!("Error fetching categories: {:?}", e);
            Vec::new()
        })
    }

    /// Refuses while any photo still references the category.
    pub async fn delete_category(&self, id: &str) -> ActionResult<()> {
        let count = self.db.count_photos_in_category(id).await.map_err(|e| {
            error!(category_id = id, "Error counting photos: {:?}", e);
            ActionError::Store("Failed to check for existing photos".to_string())
        })?;
        if count > 0 {
            return Err(ActionError::Conflict(format!(
                "Cannot delete category. It contains {count} photos. Please delete them first."
            )));
        }

        let deleted = self
            .db
            .delete_category(id)
            .await
            .map_err(|e| ActionError::store("Failed to delete category", &e))?;
        if !deleted {
            return Err(ActionError::NotFound(format!("Category {id} not found")));
        }

        info!(category_id = id, "Category deleted");
        self.revalidate(&["/admin/categories", "/admin", "/portfolio"]);
        Ok(())
    }

    //=====================================================================================
    // Photos
    //=====================================================================================

    /// Newest first. Empty on read failure.
    pub async fn list_photos(&self, category_id: Option<&str>, limit: Option<i64>) -> Vec<Photo> {
        self.db
            .list_photos(category_id, limit)
            .await
            .unwrap_or_else(|e| {
                error!("Error fetching photos: {:?}", e);
                Vec::new()
            })
    }

    /// Inserts rows for blobs that are already in storage.
    pub async fn save_photo_metadata(&self, photos: Vec<NewPhoto>) -> ActionResult<Vec<Photo>> {
        if photos.is_empty() {
            return Err(ActionError::Validation("No photos to save".to_string()));
        }
        let saved = self.db.insert_photos(photos).await.map_err(|e| {
            error!("Error inserting photos: {:?}", e);
            ActionError::store("Database insert failed", &e)
        })?;

        self.revalidate(&["/admin", "/portfolio", "/"]);
        Ok(saved)
    }

    /// Uploads each file under the category, then records metadata for the
    /// ones that made it into storage.
    pub async fn upload_photos(&self, category_id: &str, files: Vec<UploadFile>) -> ActionResult<UploadReport> {
        if files.is_empty() {
            return Err(ActionError::Validation("No files selected".to_string()));
        }
        let category = self.db.get_category(category_id).await.map_err(|e| match e {
            PortError::NotFound(_) => ActionError::NotFound(format!("Category {category_id} not found")),
            other => ActionError::store("Failed to load category", &other),
        })?;

        let mut stored = Vec::new();
        let mut failed = Vec::new();
        for file in files {
            let key = storage_key(&category.id, &file);
            match self
                .storage
                .upload(&key, file.data.clone(), file.content_type.as_deref())
                .await
            {
                Ok(()) => stored.push(NewPhoto {
                    url: self.storage.public_url(&key),
                    storage_path: key,
                    category_id: category.id.clone(),
                }),
                Err(e) => {
                    warn!(file = %file.file_name, "Upload failed: {:?}", e);
                    failed.push(UploadFailure {
                        file_name: file.file_name,
                        error: e.to_string(),
                    });
                }
            }
        }

        let uploaded = if stored.is_empty() {
            Vec::new()
        } else {
            self.save_photo_metadata(stored).await?
        };

        info!(
            category_id = %category.id,
            uploaded = uploaded.len(),
            failed = failed.len(),
            "Photo upload finished"
        );
        Ok(UploadReport { uploaded, failed })
    }

    /// Storage first; the row goes only once its blob is gone.
    pub async fn delete_photo(&self, id: Uuid, storage_path: &str) -> ActionResult<()> {
        self.storage
            .remove(&[storage_path.to_string()])
            .await
            .map_err(|e| {
                error!(photo_id = %id, "Error removing file: {:?}", e);
                ActionError::store("Storage removal failed", &e)
            })?;

        self.db.delete_photos(&[id]).await.map_err(|e| {
            error!(photo_id = %id, "Error removing record: {:?}", e);
            ActionError::store("Database removal failed", &e)
        })?;

        self.revalidate(&["/admin/photos", "/portfolio", "/"]);
        Ok(())
    }

    /// Batch variant of [`Self::delete_photo`]. Any storage failure aborts the
    /// whole batch before the database is touched.
    pub async fn delete_photos(&self, items: &[PhotoRef]) -> ActionResult<u64> {
        if items.is_empty() {
            return Err(ActionError::Validation("No items selected".to_string()));
        }
        let paths: Vec<String> = items.iter().map(|i| i.storage_path.clone()).collect();
        let ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();

        self.storage.remove(&paths).await.map_err(|e| {
            error!("Error removing files: {:?}", e);
            ActionError::store("Storage batch removal failed", &e)
        })?;

        let removed = self.db.delete_photos(&ids).await.map_err(|e| {
            error!("Error removing records: {:?}", e);
            ActionError::store("Database batch removal failed", &e)
        })?;

        info!(requested = items.len(), removed, "Photos deleted");
        self.revalidate(&["/admin/photos", "/portfolio"]);
        Ok(removed)
    }

    //=====================================================================================
    // Public portfolio
    //=====================================================================================

    /// Every category (oldest first) with its newest photo URLs. A category
    /// whose photos cannot be read shows none.
    pub async fn portfolio(&self) -> Vec<CategoryShowcase> {
        let categories = self.list_categories().await;
        let fetches = categories.into_iter().map(|category| async move {
            let images = match self
                .db
                .list_photos(Some(&category.id), Some(PORTFOLIO_PHOTOS_PER_CATEGORY))
                .await
            {
                Ok(photos) => photos.into_iter().map(|p| p.url).collect(),
                Err(e) => {
                    error!(category_id = %category.id, "Error fetching photos: {:?}", e);
                    Vec::new()
                }
            };
            CategoryShowcase {
                id: category.id,
                title: category.title,
                images,
            }
        });
        join_all(fetches).await
    }

    /// `None` when the category does not exist or cannot be read.
    pub async fn category_page(&self, id: &str) -> Option<CategoryPage> {
        let category = match self.db.get_category(id).await {
            Ok(category) => category,
            Err(PortError::NotFound(_)) => return None,
            Err(e) => {
                error!(category_id = id, "Error fetching category: {:?}", e);
                return None;
            }
        };
        let photos = self.list_photos(Some(&category.id), None).await;
        Some(CategoryPage { category, photos })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn storage_key_shape() {
        let file = UploadFile {
            file_name: "IMG_0042.jpeg".to_string(),
            content_type: Some("image/jpeg".to_string()),
            data: Bytes::from_static(b"x"),
        };
        let key = storage_key("weddings", &file);
        let (prefix, name) = key.split_once('/').unwrap();
        assert_eq!(prefix, "weddings");
        assert!(name.ends_with(".jpeg"));
        let (stamp, rest) = name.split_once('-').unwrap();
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(rest.len(), "abcdefg.jpeg".len());
    }

    #[test]
    fn storage_keys_do_not_collide() {
        let file = UploadFile {
            file_name: "a.png".to_string(),
            content_type: None,
            data: Bytes::new(),
        };
        assert_ne!(storage_key("x", &file), storage_key("x", &file));
    }
}
