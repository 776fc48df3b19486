//! crates/studio_core/src/domain.rs
//!
//! Defines the core data structures for the studio back office.
//! These structs are independent of any database; they derive `serde` so the
//! web layer can hand them to the renderer as-is.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Identity
//=========================================================================================

/// An identity issued by the identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
}

/// Authorization label attached to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    /// Stored roles are free text; anything other than `admin` grants nothing.
    pub fn from_stored(value: &str) -> Self {
        if value == "admin" {
            Role::Admin
        } else {
            Role::User
        }
    }
}

/// One row of `profiles`, 1:1 with a [`User`].
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A browser login session (the `session` cookie).
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Bookings
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the four booking statuses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status: {0}")]
pub struct InvalidStatus(pub String);

impl FromStr for BookingStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidStatus(s.to_string()))
    }
}

/// A client's session request.
#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub package_name: String,
    pub package_price: String,
    pub category_title: String,
    pub status: BookingStatus,
}

/// A validated booking submission, ready to insert. Always stored as `pending`.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub package_name: String,
    pub package_price: String,
    pub category_title: String,
}

/// The two columns the financial aggregates are derived from.
#[derive(Debug, Clone)]
pub struct BookingPrice {
    pub status: String,
    pub package_price: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FinancialStats {
    pub profit: f64,
    pub unsettled: f64,
    pub total_bookings: usize,
}

//=========================================================================================
// Messages
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Unread,
    Read,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Unread => "unread",
            MessageStatus::Read => "read",
        }
    }
}

impl FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unread" => Ok(MessageStatus::Unread),
            "read" => Ok(MessageStatus::Read),
            other => Err(format!("unknown message status '{other}'")),
        }
    }
}

/// A general enquiry from the contact form.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub status: MessageStatus,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

//=========================================================================================
// Content
//=========================================================================================

/// A portfolio category. `id` is a URL-safe slug.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Photo {
    pub id: Uuid,
    pub url: String,
    pub storage_path: String,
    pub category_id: String,
    pub created_at: DateTime<Utc>,
}

/// Metadata for a blob that has already been uploaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPhoto {
    pub url: String,
    pub storage_path: String,
    pub category_id: String,
}

/// A photo selected for deletion: the row id and its object key.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoRef {
    pub id: Uuid,
    pub storage_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Testimonial {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub text: String,
    pub rating: i16,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTestimonial {
    pub name: String,
    pub location: String,
    pub text: String,
    pub rating: i16,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomepageImage {
    pub id: Uuid,
    pub url: String,
    pub alt_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A file received from an upload form, before it reaches object storage.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadFile {
    /// The text after the last `.` of the original name, or `bin` when that
    /// is empty or not plain ASCII alphanumerics.
    pub fn extension(&self) -> &str {
        match self.file_name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
                ext
            }
            _ => "bin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_status_parses_only_known_values() {
        for status in BookingStatus::ALL {
            assert_eq!(status.as_str().parse::<BookingStatus>(), Ok(status));
        }
        assert!("archived".parse::<BookingStatus>().is_err());
        assert!("Pending".parse::<BookingStatus>().is_err());
        assert!("".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn stored_role_other_than_admin_is_user() {
        assert_eq!(Role::from_stored("admin"), Role::Admin);
        assert_eq!(Role::from_stored("editor"), Role::User);
        assert_eq!(Role::from_stored("ADMIN"), Role::User);
    }

    #[test]
    fn upload_extension() {
        let file = |name: &str| UploadFile {
            file_name: name.to_string(),
            content_type: None,
            data: Bytes::new(),
        };
        assert_eq!(file("beach.JPG").extension(), "JPG");
        assert_eq!(file("archive.tar.gz").extension(), "gz");
        assert_eq!(file("noext").extension(), "bin");
        assert_eq!(file("trailing.").extension(), "bin");
        assert_eq!(file("a.jpg/x").extension(), "bin");
        assert_eq!(file("x.p?g").extension(), "bin");
        assert_eq!(file("../../etc.passwd/..").extension(), "bin");
    }
}
