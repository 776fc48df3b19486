//! crates/studio_core/src/showcase.rs
//!
//! Testimonials and the homepage image grid.

use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::bookings::required;
use crate::content::storage_key;
use crate::domain::{HomepageImage, NewTestimonial, Testimonial, UploadFile};
use crate::error::{ActionError, ActionResult};
use crate::ports::{CacheInvalidator, DatabaseService, ObjectStorage};

/// The homepage grid never holds more than this many images.
pub const MAX_HOMEPAGE_IMAGES: usize = 12;

/// Testimonials shown on the public site unless asked otherwise.
pub const DEFAULT_TESTIMONIAL_LIMIT: i64 = 3;

const HOMEPAGE_ALT_TEXT: &str = "Homepage Grid Image";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TestimonialForm {
    pub name: String,
    pub location: String,
    pub text: String,
    pub rating: String,
}

impl TestimonialForm {
    pub fn validate(&self) -> ActionResult<(String, String, String, i16)> {
        let name = required(&self.name, "name")?;
        let location = required(&self.location, "location")?;
        let text = required(&self.text, "text")?;
        let rating = self
            .rating
            .trim()
            .parse::<i16>()
            .ok()
            .filter(|r| (1..=5).contains(r))
            .ok_or_else(|| ActionError::Validation("Rating must be between 1 and 5".to_string()))?;
        Ok((name, location, text, rating))
    }
}

/// Refuses a batch that would push the grid past [`MAX_HOMEPAGE_IMAGES`].
pub fn check_homepage_capacity(existing: usize, incoming: usize) -> ActionResult<()> {
    if existing + incoming > MAX_HOMEPAGE_IMAGES {
        return Err(ActionError::Validation(format!(
            "You can only have a maximum of {MAX_HOMEPAGE_IMAGES} images directly on the homepage grid. \
             You currently have {existing} and are trying to upload {incoming}."
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ShowcaseService {
    db: Arc<dyn DatabaseService>,
    storage: Arc<dyn ObjectStorage>,
    cache: Arc<dyn CacheInvalidator>,
}

impl ShowcaseService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        storage: Arc<dyn ObjectStorage>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Self {
        Self { db, storage, cache }
    }

    //=====================================================================================
    // Testimonials
    //=====================================================================================

    pub async fn list_testimonials(&self, limit: Option<i64>) -> Vec<Testimonial> {
        self.db.list_testimonials(limit).await.unwrap_or_else(|e| {
            error!("Error fetching testimonials: {:?}", e);
            Vec::new()
        })
    }

    /// Uploads the optional portrait first, then inserts the row.
    pub async fn create_testimonial(
        &self,
        form: TestimonialForm,
        image: Option<UploadFile>,
    ) -> ActionResult<Testimonial> {
        let (name, location, text, rating) = form.validate()?;

        let image_url = match image.filter(|f| !f.data.is_empty()) {
            Some(file) => {
                let key = format!(
                    "testimonials/testimonial-{}.{}",
                    Utc::now().timestamp_millis(),
                    file.extension()
                );
                self.storage
                    .upload(&key, file.data.clone(), file.content_type.as_deref())
                    .await
                    .map_err(|e| {
                        error!("Testimonial image upload failed: {:?}", e);
                        ActionError::Store("Failed to upload image".to_string())
                    })?;
                Some(self.storage.public_url(&key))
            }
            None => None,
        };

        let testimonial = self
            .db
            .insert_testimonial(NewTestimonial {
                name,
                location,
                text,
                rating,
                image_url,
            })
            .await
            .map_err(|e| {
                error!("Error creating testimonial: {:?}", e);
                ActionError::Store("Failed to create testimonial".to_string())
            })?;

        self.cache.revalidate("/admin/testimonials");
        self.cache.revalidate("/testimonials");
        Ok(testimonial)
    }

    pub async fn delete_testimonial(&self, id: Uuid) -> ActionResult<()> {
        let deleted = self.db.delete_testimonial(id).await.map_err(|e| {
            error!(testimonial_id = %id, "Error deleting testimonial: {:?}", e);
            ActionError::Store("Failed to delete testimonial".to_string())
        })?;
        if !deleted {
            return Err(ActionError::NotFound(format!("Testimonial {id} not found")));
        }
        self.cache.revalidate("/admin/testimonials");
        self.cache.revalidate("/testimonials");
        Ok(())
    }

    //=====================================================================================
    // Homepage grid
    //=====================================================================================

    /// The newest images, at most [`MAX_HOMEPAGE_IMAGES`].
    pub async fn homepage_images(&self) -> Vec<HomepageImage> {
        self.db
            .list_homepage_images(Some(MAX_HOMEPAGE_IMAGES as i64))
            .await
            .unwrap_or_else(|e| {
                error!("Error fetching homepage images: {:?}", e);
                Vec::new()
            })
    }

    /// Refuses the whole batch up front if it would overflow the grid. Files
    /// that fail to upload are skipped; the rest are added.
    pub async fn add_homepage_images(&self, files: Vec<UploadFile>) -> ActionResult<Vec<HomepageImage>> {
        if files.is_empty() {
            return Err(ActionError::Validation("No files selected".to_string()));
        }
        let existing = self
            .db
            .count_homepage_images()
            .await
            .map_err(|e| ActionError::store("Failed to count homepage images", &e))?;
        check_homepage_capacity(existing.max(0) as usize, files.len())?;

        let mut added = Vec::new();
        for file in files {
            let key = storage_key("homepage", &file);
            if let Err(e) = self
                .storage
                .upload(&key, file.data.clone(), file.content_type.as_deref())
                .await
            {
                warn!(file = %file.file_name, "Homepage upload failed: {:?}", e);
                continue;
            }
            let image = self
                .db
                .insert_homepage_image(&self.storage.public_url(&key), Some(HOMEPAGE_ALT_TEXT))
                .await
                .map_err(|e| {
                    error!("Error saving homepage image: {:?}", e);
                    ActionError::Store("Failed to upload one or more images".to_string())
                })?;
            added.push(image);
        }

        if added.is_empty() {
            return Err(ActionError::Store("Failed to upload one or more images".to_string()));
        }
        info!(added = added.len(), "Homepage images added");
        self.cache.revalidate("/admin/homepage");
        self.cache.revalidate("/");
        Ok(added)
    }

    /// Removes the row only; the blob stays in storage.
    pub async fn delete_homepage_image(&self, id: Uuid) -> ActionResult<()> {
        let deleted = self.db.delete_homepage_image(id).await.map_err(|e| {
            error!(image_id = %id, "Error deleting homepage image: {:?}", e);
            ActionError::Store("Failed to delete image".to_string())
        })?;
        if !deleted {
            return Err(ActionError::NotFound(format!("Image {id} not found")));
        }
        self.cache.revalidate("/admin/homepage");
        self.cache.revalidate("/");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_twelve() {
        assert!(check_homepage_capacity(0, 12).is_ok());
        assert!(check_homepage_capacity(10, 2).is_ok());
        let err = check_homepage_capacity(10, 3).unwrap_err();
        assert!(err.to_string().contains("maximum of 12"));
        assert!(err.to_string().contains("currently have 10"));
    }

    #[test]
    fn rating_must_be_one_to_five() {
        let form = |rating: &str| TestimonialForm {
            name: "Mia".into(),
            location: "Cork".into(),
            text: "Lovely shoot".into(),
            rating: rating.into(),
        };
        assert_eq!(form("5").validate().unwrap().3, 5);
        assert_eq!(form(" 1 ").validate().unwrap().3, 1);
        for bad in ["0", "6", "", "five", "-3"] {
            assert!(form(bad).validate().is_err(), "{bad}");
        }
    }

    #[test]
    fn testimonial_requires_text() {
        let form = TestimonialForm {
            name: "Mia".into(),
            location: "Cork".into(),
            text: "".into(),
            rating: "4".into(),
        };
        assert_eq!(form.validate().unwrap_err(), ActionError::MissingField("text"));
    }
}
