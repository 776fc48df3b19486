//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use studio_core::domain::{
    Booking, BookingPrice, BookingStatus, Category, HomepageImage, Message, MessageStatus,
    NewBooking, NewMessage, NewPhoto, NewTestimonial, Photo, Profile, Role, Testimonial,
};
use studio_core::ports::{DatabaseService, PortError, PortResult};
use uuid::Uuid;

/// Postgres SQLSTATE for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found(what: String) -> impl FnOnce(sqlx::Error) -> PortError {
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        other => unexpected(other),
    }
}

/// Maps unique violations to `Duplicate`, everything else to `Unexpected`.
pub(crate) fn write_error(e: sqlx::Error) -> PortError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return PortError::Duplicate(db_err.message().to_string());
        }
    }
    unexpected(e)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ProfileRecord {
    id: Uuid,
    email: Option<String>,
    role: Option<String>,
    display_name: Option<String>,
    created_at: DateTime<Utc>,
}
impl ProfileRecord {
    fn to_domain(self) -> Profile {
        Profile {
            id: self.id,
            email: self.email,
            role: self.role.as_deref().map(Role::from_stored),
            display_name: self.display_name,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct BookingRecord {
    id: Uuid,
    created_at: DateTime<Utc>,
    name: String,
    email: String,
    phone: Option<String>,
    message: Option<String>,
    package_name: String,
    package_price: String,
    category_title: String,
    status: String,
}
impl BookingRecord {
    fn to_domain(self) -> PortResult<Booking> {
        let status = self
            .status
            .parse::<BookingStatus>()
            .map_err(|e| PortError::Unexpected(format!("Booking {}: {}", self.id, e)))?;
        Ok(Booking {
            id: self.id,
            created_at: self.created_at,
            name: self.name,
            email: self.email,
            phone: self.phone,
            message: self.message,
            package_name: self.package_name,
            package_price: self.package_price,
            category_title: self.category_title,
            status,
        })
    }
}

#[derive(FromRow)]
struct BookingPriceRecord {
    status: String,
    package_price: String,
}

#[derive(FromRow)]
struct MessageRecord {
    id: Uuid,
    created_at: DateTime<Utc>,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    subject: String,
    message: String,
    status: String,
}
impl MessageRecord {
    fn to_domain(self) -> PortResult<Message> {
        let status = self
            .status
            .parse::<MessageStatus>()
            .map_err(|e| PortError::Unexpected(format!("Message {}: {}", self.id, e)))?;
        Ok(Message {
            id: self.id,
            created_at: self.created_at,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            subject: self.subject,
            message: self.message,
            status,
        })
    }
}

#[derive(FromRow)]
struct CategoryRecord {
    id: String,
    title: String,
    created_at: DateTime<Utc>,
}
impl CategoryRecord {
    fn to_domain(self) -> Category {
        Category {
            id: self.id,
            title: self.title,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct PhotoRecord {
    id: Uuid,
    url: String,
    storage_path: String,
    category_id: String,
    created_at: DateTime<Utc>,
}
impl PhotoRecord {
    fn to_domain(self) -> Photo {
        Photo {
            id: self.id,
            url: self.url,
            storage_path: self.storage_path,
            category_id: self.category_id,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct TestimonialRecord {
    id: Uuid,
    name: String,
    location: String,
    text: String,
    rating: i16,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}
impl TestimonialRecord {
    fn to_domain(self) -> Testimonial {
        Testimonial {
            id: self.id,
            name: self.name,
            location: self.location,
            text: self.text,
            rating: self.rating,
            image_url: self.image_url,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct HomepageImageRecord {
    id: Uuid,
    url: String,
    alt_text: Option<String>,
    created_at: DateTime<Utc>,
}
impl HomepageImageRecord {
    fn to_domain(self) -> HomepageImage {
        HomepageImage {
            id: self.id,
            url: self.url,
            alt_text: self.alt_text,
            created_at: self.created_at,
        }
    }
}

const PROFILE_COLUMNS: &str = "id, email, role, display_name, created_at";
const BOOKING_COLUMNS: &str = "id, created_at, name, email, phone, message, package_name, \
     package_price, category_title, status";
const MESSAGE_COLUMNS: &str =
    "id, created_at, first_name, last_name, email, phone, subject, message, status";
const PHOTO_COLUMNS: &str = "id, url, storage_path, category_id, created_at";
const TESTIMONIAL_COLUMNS: &str = "id, name, location, text, rating, image_url, created_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn get_profile(&self, user_id: Uuid) -> PortResult<Profile> {
        let record = sqlx::query_as::<_, ProfileRecord>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("Profile {} not found", user_id)))?;
        Ok(record.to_domain())
    }

    async fn list_profiles(&self) -> PortResult<Vec<Profile>> {
        let records = sqlx::query_as::<_, ProfileRecord>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_profile_role(&self, user_id: Uuid, role: Role, email: &str) -> PortResult<u64> {
        let result = sqlx::query("UPDATE profiles SET role = $1, email = $2 WHERE id = $3")
            .bind(role.as_str())
            .bind(email)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected())
    }

    async fn upsert_profile(&self, user_id: Uuid, email: &str, role: Role) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO profiles (id, email, role) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email, role = EXCLUDED.role",
        )
        .bind(user_id)
        .bind(email)
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_profile(&self, user_id: Uuid) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_display_name(&self, user_id: Uuid, display_name: &str) -> PortResult<bool> {
        let result = sqlx::query("UPDATE profiles SET display_name = $1 WHERE id = $2")
            .bind(display_name)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_booking(&self, booking: NewBooking) -> PortResult<Booking> {
        let record = sqlx::query_as::<_, BookingRecord>(&format!(
            "INSERT INTO bookings (id, name, email, phone, message, package_name, package_price, \
             category_title, status) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending') \
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(booking.name)
        .bind(booking.email)
        .bind(booking.phone)
        .bind(booking.message)
        .bind(booking.package_name)
        .bind(booking.package_price)
        .bind(booking.category_title)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)?;
        record.to_domain()
    }

    async fn list_bookings(&self, limit: Option<i64>) -> PortResult<Vec<Booking>> {
        let records = sqlx::query_as::<_, BookingRecord>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn update_booking_status(&self, id: Uuid, status: BookingStatus) -> PortResult<bool> {
        let result = sqlx::query("UPDATE bookings SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_booking_prices(&self) -> PortResult<Vec<BookingPrice>> {
        let records = sqlx::query_as::<_, BookingPriceRecord>(
            "SELECT status, package_price FROM bookings",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| BookingPrice {
                status: r.status,
                package_price: r.package_price,
            })
            .collect())
    }

    async fn insert_message(&self, message: NewMessage) -> PortResult<Message> {
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            "INSERT INTO messages (id, first_name, last_name, email, phone, subject, message) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(message.first_name)
        .bind(message.last_name)
        .bind(message.email)
        .bind(message.phone)
        .bind(message.subject)
        .bind(message.message)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)?;
        record.to_domain()
    }

    async fn list_messages(&self) -> PortResult<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_message(&self, id: Uuid) -> PortResult<Message> {
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("Message {} not found", id)))?;
        record.to_domain()
    }

    async fn mark_message_read(&self, id: Uuid) -> PortResult<bool> {
        let result =
            sqlx::query("UPDATE messages SET status = 'read' WHERE id = $1 AND status = 'unread'")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_message(&self, id: Uuid) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_unread_messages(&self) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages WHERE status = 'unread'")
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn insert_category(&self, id: &str, title: &str) -> PortResult<Category> {
        let record = sqlx::query_as::<_, CategoryRecord>(
            "INSERT INTO categories (id, title) VALUES ($1, $2) RETURNING id, title, created_at",
        )
        .bind(id)
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(record.to_domain())
    }

    async fn list_categories(&self) -> PortResult<Vec<Category>> {
        let records = sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, title, created_at FROM categories ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_category(&self, id: &str) -> PortResult<Category> {
        let record = sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, title, created_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("Category {} not found", id)))?;
        Ok(record.to_domain())
    }

    async fn delete_category(&self, id: &str) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_photos_in_category(&self, category_id: &str) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM photos WHERE category_id = $1")
            .bind(category_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn insert_photos(&self, photos: Vec<NewPhoto>) -> PortResult<Vec<Photo>> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let mut saved = Vec::with_capacity(photos.len());
        for photo in photos {
            let record = sqlx::query_as::<_, PhotoRecord>(&format!(
                "INSERT INTO photos (id, url, storage_path, category_id) VALUES ($1, $2, $3, $4) \
                 RETURNING {PHOTO_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(photo.url)
            .bind(photo.storage_path)
            .bind(photo.category_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(write_error)?;
            saved.push(record.to_domain());
        }
        tx.commit().await.map_err(unexpected)?;
        Ok(saved)
    }

    async fn list_photos(
        &self,
        category_id: Option<&str>,
        limit: Option<i64>,
    ) -> PortResult<Vec<Photo>> {
        let records = sqlx::query_as::<_, PhotoRecord>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos WHERE ($1::text IS NULL OR category_id = $1) \
             ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(category_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn delete_photos(&self, ids: &[Uuid]) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM photos WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected())
    }

    async fn insert_testimonial(&self, testimonial: NewTestimonial) -> PortResult<Testimonial> {
        let record = sqlx::query_as::<_, TestimonialRecord>(&format!(
            "INSERT INTO testimonials (id, name, location, text, rating, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {TESTIMONIAL_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(testimonial.name)
        .bind(testimonial.location)
        .bind(testimonial.text)
        .bind(testimonial.rating)
        .bind(testimonial.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(record.to_domain())
    }

    async fn list_testimonials(&self, limit: Option<i64>) -> PortResult<Vec<Testimonial>> {
        let records = sqlx::query_as::<_, TestimonialRecord>(&format!(
            "SELECT {TESTIMONIAL_COLUMNS} FROM testimonials ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn delete_testimonial(&self, id: Uuid) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM testimonials WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_homepage_images(&self, limit: Option<i64>) -> PortResult<Vec<HomepageImage>> {
        let records = sqlx::query_as::<_, HomepageImageRecord>(
            "SELECT id, url, alt_text, created_at FROM homepage_images \
             ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn count_homepage_images(&self) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM homepage_images")
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn insert_homepage_image(
        &self,
        url: &str,
        alt_text: Option<&str>,
    ) -> PortResult<HomepageImage> {
        let record = sqlx::query_as::<_, HomepageImageRecord>(
            "INSERT INTO homepage_images (id, url, alt_text) VALUES ($1, $2, $3) \
             RETURNING id, url, alt_text, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(url)
        .bind(alt_text)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(record.to_domain())
    }

    async fn delete_homepage_image(&self, id: Uuid) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM homepage_images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }
}
