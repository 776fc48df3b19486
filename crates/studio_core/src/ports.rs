//! crates/studio_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture: the identity
//! store, the relational store, object storage and the cache invalidation
//! signal are all consumed through them.

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::domain::{
    AuthSession, Booking, BookingPrice, BookingStatus, Category, HomepageImage, Message,
    NewBooking, NewMessage, NewPhoto, NewTestimonial, Photo, Profile, Role, Testimonial, User,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A unique constraint rejected the write.
    #[error("Duplicate: {0}")]
    Duplicate(String),
    /// The store refused a credential (expired or wrong one-time code).
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The identity half of the external store.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Looks up the user owning a session token. `None` for unknown or expired tokens.
    async fn get_user_by_session(&self, session_token: &str) -> PortResult<Option<User>>;

    /// Creates the account if needed and dispatches a one-time code to `email`.
    async fn send_one_time_code(&self, email: &str) -> PortResult<()>;

    /// Consumes a one-time code. Never touches any session.
    async fn verify_one_time_code(&self, email: &str, code: &str) -> PortResult<User>;

    async fn create_session(&self, user_id: Uuid) -> PortResult<AuthSession>;

    async fn sign_out(&self, session_token: &str) -> PortResult<()>;
}

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Profiles ---
    async fn get_profile(&self, user_id: Uuid) -> PortResult<Profile>;

    async fn list_profiles(&self) -> PortResult<Vec<Profile>>;

    /// Sets role and email on an existing row. Returns the number of rows touched.
    async fn update_profile_role(&self, user_id: Uuid, role: Role, email: &str) -> PortResult<u64>;

    async fn upsert_profile(&self, user_id: Uuid, email: &str, role: Role) -> PortResult<()>;

    async fn delete_profile(&self, user_id: Uuid) -> PortResult<bool>;

    async fn update_display_name(&self, user_id: Uuid, display_name: &str) -> PortResult<bool>;

    // --- Bookings ---
    async fn insert_booking(&self, booking: NewBooking) -> PortResult<Booking>;

    /// Newest first.
    async fn list_bookings(&self, limit: Option<i64>) -> PortResult<Vec<Booking>>;

    async fn update_booking_status(&self, id: Uuid, status: BookingStatus) -> PortResult<bool>;

    async fn list_booking_prices(&self) -> PortResult<Vec<BookingPrice>>;

    // --- Messages ---
    async fn insert_message(&self, message: NewMessage) -> PortResult<Message>;

    /// Newest first.
    async fn list_messages(&self) -> PortResult<Vec<Message>>;

    async fn get_message(&self, id: Uuid) -> PortResult<Message>;

    /// Flips `unread` to `read`. Returns `true` only when the row actually changed.
    async fn mark_message_read(&self, id: Uuid) -> PortResult<bool>;

    async fn delete_message(&self, id: Uuid) -> PortResult<bool>;

    async fn count_unread_messages(&self) -> PortResult<i64>;

    // --- Categories ---
    async fn insert_category(&self, id: &str, title: &str) -> PortResult<Category>;

    /// Oldest first.
    async fn list_categories(&self) -> PortResult<Vec<Category>>;

    async fn get_category(&self, id: &str) -> PortResult<Category>;

    async fn delete_category(&self, id: &str) -> PortResult<bool>;

    async fn count_photos_in_category(&self, category_id: &str) -> PortResult<i64>;

    // --- Photos ---
    async fn insert_photos(&self, photos: Vec<NewPhoto>) -> PortResult<Vec<Photo>>;

    /// Newest first, optionally filtered by category.
    async fn list_photos(&self, category_id: Option<&str>, limit: Option<i64>)
        -> PortResult<Vec<Photo>>;

    async fn delete_photos(&self, ids: &[Uuid]) -> PortResult<u64>;

    // --- Testimonials ---
    async fn insert_testimonial(&self, testimonial: NewTestimonial) -> PortResult<Testimonial>;

    async fn list_testimonials(&self, limit: Option<i64>) -> PortResult<Vec<Testimonial>>;

    async fn delete_testimonial(&self, id: Uuid) -> PortResult<bool>;

    // --- Homepage grid ---
    async fn list_homepage_images(&self, limit: Option<i64>) -> PortResult<Vec<HomepageImage>>;

    async fn count_homepage_images(&self) -> PortResult<i64>;

    async fn insert_homepage_image(&self, url: &str, alt_text: Option<&str>)
        -> PortResult<HomepageImage>;

    async fn delete_homepage_image(&self, id: Uuid) -> PortResult<bool>;
}

/// The object-storage bucket holding photo blobs.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, path: &str, data: Bytes, content_type: Option<&str>) -> PortResult<()>;

    /// Removes every key in one call. Any failure fails the whole call.
    async fn remove(&self, paths: &[String]) -> PortResult<()>;

    fn public_url(&self, path: &str) -> String;
}

/// Named-path invalidation consumed by the rendering layer.
pub trait CacheInvalidator: Send + Sync {
    fn revalidate(&self, path: &str);
}
