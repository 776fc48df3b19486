//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of every port, used by `STORE_BACKEND=memory`
//! for local development and by the integration tests. Individual operations
//! can be made to fail on demand with [`FailPoint`].

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use studio_core::domain::{
    AuthSession, Booking, BookingPrice, BookingStatus, Category, HomepageImage, Message,
    MessageStatus, NewBooking, NewMessage, NewPhoto, NewTestimonial, Photo, Profile, Role,
    Testimonial, User,
};
use studio_core::ports::{
    CacheInvalidator, DatabaseService, IdentityService, ObjectStorage, PortError, PortResult,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::adapters::identity::{
    code_matches, generate_code, hash_code, normalize_email, INVALID_CODE, MAX_CODE_ATTEMPTS,
};

/// An operation that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    SessionLookup,
    SendCode,
    VerifyCode,
    ListProfiles,
    ProfileUpdate,
    ProfileUpsert,
    InsertBooking,
    ListBookings,
    UpdateBookingStatus,
    BookingPrices,
    InsertMessage,
    ListMessages,
    MarkMessageRead,
    ListCategories,
    CountPhotos,
    InsertPhotos,
    ListPhotos,
    DeletePhotos,
    ListTestimonials,
    ListHomepageImages,
    StorageUpload,
    StorageRemove,
}

struct PendingCode {
    hash: String,
    expires_at: DateTime<Utc>,
    attempts: i32,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    codes: HashMap<String, PendingCode>,
    outbox: HashMap<String, String>,
    sessions: HashMap<String, AuthSession>,
    profiles: Vec<Profile>,
    bookings: Vec<Booking>,
    messages: Vec<Message>,
    categories: Vec<Category>,
    photos: Vec<Photo>,
    testimonials: Vec<Testimonial>,
    homepage_images: Vec<HomepageImage>,
    objects: HashMap<String, Bytes>,
    revalidated: Vec<String>,
    failing: HashSet<FailPoint>,
    failing_upload_suffixes: Vec<String>,
    profile_lag: bool,
}

impl Inner {
    fn check(&self, point: FailPoint) -> PortResult<()> {
        if self.failing.contains(&point) {
            return Err(PortError::Unexpected(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

/// Rows are kept in insertion order; "newest first" walks them backwards.
fn newest_first<T: Clone>(items: &[T], limit: Option<i64>) -> Vec<T> {
    let take = limit.map_or(usize::MAX, |l| l.max(0) as usize);
    items.iter().rev().take(take).cloned().collect()
}

pub struct InMemoryStore {
    inner: Mutex<Inner>,
    otp_ttl: Duration,
    session_ttl: Duration,
    public_base_url: String,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Duration::minutes(10), Duration::days(30), "/storage")
    }
}

impl InMemoryStore {
    pub fn new(otp_ttl: Duration, session_ttl: Duration, public_base_url: &str) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            otp_ttl,
            session_ttl,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn state(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    //=====================================================================================
    // Inspection and fault injection
    //=====================================================================================

    pub fn fail(&self, point: FailPoint) {
        self.state().failing.insert(point);
    }

    pub fn heal(&self, point: FailPoint) {
        self.state().failing.remove(&point);
    }

    /// Uploads whose key ends with `suffix` fail; the rest go through.
    pub fn fail_uploads_ending_with(&self, suffix: &str) {
        self.state().failing_upload_suffixes.push(suffix.to_string());
    }

    /// While set, verifying a code does not create the profile row.
    pub fn set_profile_lag(&self, lag: bool) {
        self.state().profile_lag = lag;
    }

    /// The last code sent to `email`, as the mailbox would show it.
    pub fn last_code(&self, email: &str) -> Option<String> {
        let email = email.trim().to_lowercase();
        self.state().outbox.get(&email).cloned()
    }

    /// Every path revalidated so far, in order.
    pub fn revalidated(&self) -> Vec<String> {
        self.state().revalidated.clone()
    }

    pub fn object_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state().objects.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn session_count(&self) -> usize {
        self.state().sessions.len()
    }

    /// Creates a confirmed user with a profile row carrying `role`.
    pub fn seed_user(&self, email: &str, role: Option<Role>) -> User {
        let mut state = self.state();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_lowercase(),
        };
        state.users.push(user.clone());
        state.profiles.push(Profile {
            id: user.id,
            email: Some(user.email.clone()),
            role,
            display_name: None,
            created_at: Utc::now(),
        });
        user
    }

    /// Puts a blob straight into the bucket.
    pub fn seed_object(&self, path: &str, data: &'static [u8]) {
        self.state()
            .objects
            .insert(path.to_string(), Bytes::from_static(data));
    }
}

//=========================================================================================
// IdentityService
//=========================================================================================

#[async_trait]
impl IdentityService for InMemoryStore {
    async fn get_user_by_session(&self, session_token: &str) -> PortResult<Option<User>> {
        let state = self.state();
        state.check(FailPoint::SessionLookup)?;
        let Some(session) = state.sessions.get(session_token) else {
            return Ok(None);
        };
        if session.expires_at <= Utc::now() {
            return Ok(None);
        }
        Ok(state.users.iter().find(|u| u.id == session.user_id).cloned())
    }

    async fn send_one_time_code(&self, email: &str) -> PortResult<()> {
        let email = normalize_email(email)?;
        let code = generate_code();
        let hash = hash_code(&code)?;

        let mut state = self.state();
        state.check(FailPoint::SendCode)?;
        if !state.users.iter().any(|u| u.email == email) {
            state.users.push(User {
                id: Uuid::new_v4(),
                email: email.clone(),
            });
        }
        state.codes.insert(
            email.clone(),
            PendingCode {
                hash,
                expires_at: Utc::now() + self.otp_ttl,
                attempts: 0,
            },
        );
        state.outbox.insert(email.clone(), code.clone());
        info!(to = %email, code = %code, "Sign-in code issued (memory store)");
        Ok(())
    }

    async fn verify_one_time_code(&self, email: &str, code: &str) -> PortResult<User> {
        let email = normalize_email(email)?;
        let invalid = || PortError::InvalidToken(INVALID_CODE.to_string());

        // Claim an attempt under the lock; hash outside it.
        let hash = {
            let mut state = self.state();
            state.check(FailPoint::VerifyCode)?;
            let pending = state.codes.get_mut(&email).ok_or_else(invalid)?;
            if pending.expires_at <= Utc::now() || pending.attempts >= MAX_CODE_ATTEMPTS {
                return Err(invalid());
            }
            pending.attempts += 1;
            pending.hash.clone()
        };
        if !code_matches(code, &hash) {
            debug!(email = %email, "Wrong sign-in code");
            return Err(invalid());
        }

        let mut state = self.state();
        // A code re-sent or consumed meanwhile no longer counts.
        if !state.codes.get(&email).is_some_and(|pending| pending.hash == hash) {
            return Err(invalid());
        }
        state.codes.remove(&email);

        let user = state
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| PortError::InvalidToken(INVALID_CODE.to_string()))?;

        if !state.profile_lag && !state.profiles.iter().any(|p| p.id == user.id) {
            state.profiles.push(Profile {
                id: user.id,
                email: Some(user.email.clone()),
                role: Some(Role::User),
                display_name: None,
                created_at: Utc::now(),
            });
        }
        Ok(user)
    }

    async fn create_session(&self, user_id: Uuid) -> PortResult<AuthSession> {
        let session = AuthSession {
            token: Uuid::new_v4().to_string(),
            user_id,
            expires_at: Utc::now() + self.session_ttl,
        };
        self.state()
            .sessions
            .insert(session.token.clone(), session.clone());
        Ok(session)
    }

    async fn sign_out(&self, session_token: &str) -> PortResult<()> {
        self.state().sessions.remove(session_token);
        Ok(())
    }
}

//=========================================================================================
// DatabaseService
//=========================================================================================

#[async_trait]
impl DatabaseService for InMemoryStore {
    async fn get_profile(&self, user_id: Uuid) -> PortResult<Profile> {
        self.state()
            .profiles
            .iter()
            .find(|p| p.id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Profile {} not found", user_id)))
    }

    async fn list_profiles(&self) -> PortResult<Vec<Profile>> {
        let state = self.state();
        state.check(FailPoint::ListProfiles)?;
        Ok(newest_first(&state.profiles, None))
    }

    async fn update_profile_role(&self, user_id: Uuid, role: Role, email: &str) -> PortResult<u64> {
        let mut state = self.state();
        state.check(FailPoint::ProfileUpdate)?;
        match state.profiles.iter_mut().find(|p| p.id == user_id) {
            Some(profile) => {
                profile.role = Some(role);
                profile.email = Some(email.to_string());
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn upsert_profile(&self, user_id: Uuid, email: &str, role: Role) -> PortResult<()> {
        let mut state = self.state();
        state.check(FailPoint::ProfileUpsert)?;
        match state.profiles.iter_mut().find(|p| p.id == user_id) {
            Some(profile) => {
                profile.role = Some(role);
                profile.email = Some(email.to_string());
            }
            None => state.profiles.push(Profile {
                id: user_id,
                email: Some(email.to_string()),
                role: Some(role),
                display_name: None,
                created_at: Utc::now(),
            }),
        }
        Ok(())
    }

    async fn delete_profile(&self, user_id: Uuid) -> PortResult<bool> {
        let mut state = self.state();
        let before = state.profiles.len();
        state.profiles.retain(|p| p.id != user_id);
        Ok(state.profiles.len() < before)
    }

    async fn update_display_name(&self, user_id: Uuid, display_name: &str) -> PortResult<bool> {
        let mut state = self.state();
        match state.profiles.iter_mut().find(|p| p.id == user_id) {
            Some(profile) => {
                profile.display_name = Some(display_name.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_booking(&self, booking: NewBooking) -> PortResult<Booking> {
        let mut state = self.state();
        state.check(FailPoint::InsertBooking)?;
        let booking = Booking {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            name: booking.name,
            email: booking.email,
            phone: booking.phone,
            message: booking.message,
            package_name: booking.package_name,
            package_price: booking.package_price,
            category_title: booking.category_title,
            status: BookingStatus::Pending,
        };
        state.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn list_bookings(&self, limit: Option<i64>) -> PortResult<Vec<Booking>> {
        let state = self.state();
        state.check(FailPoint::ListBookings)?;
        Ok(newest_first(&state.bookings, limit))
    }

    async fn update_booking_status(&self, id: Uuid, status: BookingStatus) -> PortResult<bool> {
        let mut state = self.state();
        state.check(FailPoint::UpdateBookingStatus)?;
        match state.bookings.iter_mut().find(|b| b.id == id) {
            Some(booking) => {
                booking.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_booking_prices(&self) -> PortResult<Vec<BookingPrice>> {
        let state = self.state();
        state.check(FailPoint::BookingPrices)?;
        Ok(state
            .bookings
            .iter()
            .map(|b| BookingPrice {
                status: b.status.as_str().to_string(),
                package_price: b.package_price.clone(),
            })
            .collect())
    }

    async fn insert_message(&self, message: NewMessage) -> PortResult<Message> {
        let mut state = self.state();
        state.check(FailPoint::InsertMessage)?;
        let message = Message {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            first_name: message.first_name,
            last_name: message.last_name,
            email: message.email,
            phone: message.phone,
            subject: message.subject,
            message: message.message,
            status: MessageStatus::Unread,
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn list_messages(&self) -> PortResult<Vec<Message>> {
        let state = self.state();
        state.check(FailPoint::ListMessages)?;
        Ok(newest_first(&state.messages, None))
    }

    async fn get_message(&self, id: Uuid) -> PortResult<Message> {
        self.state()
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Message {} not found", id)))
    }

    async fn mark_message_read(&self, id: Uuid) -> PortResult<bool> {
        let mut state = self.state();
        state.check(FailPoint::MarkMessageRead)?;
        match state
            .messages
            .iter_mut()
            .find(|m| m.id == id && m.status == MessageStatus::Unread)
        {
            Some(message) => {
                message.status = MessageStatus::Read;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_message(&self, id: Uuid) -> PortResult<bool> {
        let mut state = self.state();
        let before = state.messages.len();
        state.messages.retain(|m| m.id != id);
        Ok(state.messages.len() < before)
    }

    async fn count_unread_messages(&self) -> PortResult<i64> {
        let state = self.state();
        state.check(FailPoint::ListMessages)?;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.status == MessageStatus::Unread)
            .count() as i64)
    }

    async fn insert_category(&self, id: &str, title: &str) -> PortResult<Category> {
        let mut state = self.state();
        if state.categories.iter().any(|c| c.id == id) {
            return Err(PortError::Duplicate(format!("categories.id = {id}")));
        }
        let category = Category {
            id: id.to_string(),
            title: title.to_string(),
            created_at: Utc::now(),
        };
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn list_categories(&self) -> PortResult<Vec<Category>> {
        let state = self.state();
        state.check(FailPoint::ListCategories)?;
        Ok(state.categories.clone())
    }

    async fn get_category(&self, id: &str) -> PortResult<Category> {
        self.state()
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Category {} not found", id)))
    }

    async fn delete_category(&self, id: &str) -> PortResult<bool> {
        let mut state = self.state();
        if state.photos.iter().any(|p| p.category_id == id) {
            return Err(PortError::Unexpected(format!(
                "photos still reference category {id}"
            )));
        }
        let before = state.categories.len();
        state.categories.retain(|c| c.id != id);
        Ok(state.categories.len() < before)
    }

    async fn count_photos_in_category(&self, category_id: &str) -> PortResult<i64> {
        let state = self.state();
        state.check(FailPoint::CountPhotos)?;
        Ok(state
            .photos
            .iter()
            .filter(|p| p.category_id == category_id)
            .count() as i64)
    }

    async fn insert_photos(&self, photos: Vec<NewPhoto>) -> PortResult<Vec<Photo>> {
        let mut state = self.state();
        state.check(FailPoint::InsertPhotos)?;
        if let Some(orphan) = photos
            .iter()
            .find(|p| !state.categories.iter().any(|c| c.id == p.category_id))
        {
            return Err(PortError::Unexpected(format!(
                "category {} does not exist",
                orphan.category_id
            )));
        }
        let saved: Vec<Photo> = photos
            .into_iter()
            .map(|p| Photo {
                id: Uuid::new_v4(),
                url: p.url,
                storage_path: p.storage_path,
                category_id: p.category_id,
                created_at: Utc::now(),
            })
            .collect();
        state.photos.extend(saved.iter().cloned());
        Ok(saved)
    }

    async fn list_photos(
        &self,
        category_id: Option<&str>,
        limit: Option<i64>,
    ) -> PortResult<Vec<Photo>> {
        let state = self.state();
        state.check(FailPoint::ListPhotos)?;
        let matching: Vec<Photo> = state
            .photos
            .iter()
            .filter(|p| category_id.map_or(true, |c| p.category_id == c))
            .cloned()
            .collect();
        Ok(newest_first(&matching, limit))
    }

    async fn delete_photos(&self, ids: &[Uuid]) -> PortResult<u64> {
        let mut state = self.state();
        state.check(FailPoint::DeletePhotos)?;
        let before = state.photos.len();
        state.photos.retain(|p| !ids.contains(&p.id));
        Ok((before - state.photos.len()) as u64)
    }

    async fn insert_testimonial(&self, testimonial: NewTestimonial) -> PortResult<Testimonial> {
        let testimonial = Testimonial {
            id: Uuid::new_v4(),
            name: testimonial.name,
            location: testimonial.location,
            text: testimonial.text,
            rating: testimonial.rating,
            image_url: testimonial.image_url,
            created_at: Utc::now(),
        };
        self.state().testimonials.push(testimonial.clone());
        Ok(testimonial)
    }

    async fn list_testimonials(&self, limit: Option<i64>) -> PortResult<Vec<Testimonial>> {
        let state = self.state();
        state.check(FailPoint::ListTestimonials)?;
        Ok(newest_first(&state.testimonials, limit))
    }

    async fn delete_testimonial(&self, id: Uuid) -> PortResult<bool> {
        let mut state = self.state();
        let before = state.testimonials.len();
        state.testimonials.retain(|t| t.id != id);
        Ok(state.testimonials.len() < before)
    }

    async fn list_homepage_images(&self, limit: Option<i64>) -> PortResult<Vec<HomepageImage>> {
        let state = self.state();
        state.check(FailPoint::ListHomepageImages)?;
        Ok(newest_first(&state.homepage_images, limit))
    }

    async fn count_homepage_images(&self) -> PortResult<i64> {
        Ok(self.state().homepage_images.len() as i64)
    }

    async fn insert_homepage_image(
        &self,
        url: &str,
        alt_text: Option<&str>,
    ) -> PortResult<HomepageImage> {
        let image = HomepageImage {
            id: Uuid::new_v4(),
            url: url.to_string(),
            alt_text: alt_text.map(str::to_string),
            created_at: Utc::now(),
        };
        self.state().homepage_images.push(image.clone());
        Ok(image)
    }

    async fn delete_homepage_image(&self, id: Uuid) -> PortResult<bool> {
        let mut state = self.state();
        let before = state.homepage_images.len();
        state.homepage_images.retain(|i| i.id != id);
        Ok(state.homepage_images.len() < before)
    }
}

//=========================================================================================
// ObjectStorage and CacheInvalidator
//=========================================================================================

#[async_trait]
impl ObjectStorage for InMemoryStore {
    async fn upload(&self, path: &str, data: Bytes, _content_type: Option<&str>) -> PortResult<()> {
        let mut state = self.state();
        state.check(FailPoint::StorageUpload)?;
        if state.failing_upload_suffixes.iter().any(|s| path.ends_with(s.as_str())) {
            return Err(PortError::Unexpected(format!("injected failure uploading '{path}'")));
        }
        if data.is_empty() {
            return Err(PortError::Unexpected(format!("Empty file for '{path}'")));
        }
        state.objects.insert(path.to_string(), data);
        Ok(())
    }

    async fn remove(&self, paths: &[String]) -> PortResult<()> {
        let mut state = self.state();
        state.check(FailPoint::StorageRemove)?;
        for path in paths {
            state.objects.remove(path);
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url, path)
    }
}

impl CacheInvalidator for InMemoryStore {
    fn revalidate(&self, path: &str) {
        debug!(path, "Revalidating");
        self.state().revalidated.push(path.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn code_round_trip_creates_one_user_and_profile() {
        let store = InMemoryStore::default();
        store.send_one_time_code("Jo@Example.com").await.unwrap();
        store.send_one_time_code("jo@example.com").await.unwrap();
        let code = store.last_code("jo@example.com").unwrap();

        let user = store.verify_one_time_code("jo@example.com", &code).await.unwrap();
        assert_eq!(user.email, "jo@example.com");
        assert_eq!(store.state().users.len(), 1);
        assert_eq!(store.get_profile(user.id).await.unwrap().role, Some(Role::User));

        // Codes are single use.
        let again = store.verify_one_time_code("jo@example.com", &code).await;
        assert!(matches!(again, Err(PortError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn code_is_burned_after_too_many_wrong_guesses() {
        let store = InMemoryStore::default();
        store.send_one_time_code("jo@example.com").await.unwrap();
        let code = store.last_code("jo@example.com").unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };

        for _ in 0..MAX_CODE_ATTEMPTS {
            let guess = store.verify_one_time_code("jo@example.com", wrong).await;
            assert!(matches!(guess, Err(PortError::InvalidToken(_))));
        }
        let late = store.verify_one_time_code("jo@example.com", &code).await;
        assert!(matches!(late, Err(PortError::InvalidToken(_))));

        // A fresh code resets the counter.
        store.send_one_time_code("jo@example.com").await.unwrap();
        let code = store.last_code("jo@example.com").unwrap();
        assert!(store.verify_one_time_code("jo@example.com", &code).await.is_ok());
    }

    #[tokio::test]
    async fn uploads_fail_only_for_matching_keys() {
        let store = InMemoryStore::default();
        store.fail_uploads_ending_with(".gif");
        let data = Bytes::from_static(b"img");
        assert!(store.upload("p/a.jpg", data.clone(), None).await.is_ok());
        assert!(store.upload("p/b.gif", data, None).await.is_err());
        assert_eq!(store.object_keys(), ["p/a.jpg"]);
    }

    #[tokio::test]
    async fn profile_lag_skips_profile_row() {
        let store = InMemoryStore::default();
        store.set_profile_lag(true);
        store.send_one_time_code("new@example.com").await.unwrap();
        let code = store.last_code("new@example.com").unwrap();
        let user = store.verify_one_time_code("new@example.com", &code).await.unwrap();
        assert!(matches!(store.get_profile(user.id).await, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn expired_session_resolves_to_nobody() {
        let store = InMemoryStore::new(Duration::minutes(10), Duration::seconds(-1), "/storage");
        let user = store.seed_user("a@example.com", Some(Role::Admin));
        let session = store.create_session(user.id).await.unwrap();
        assert_eq!(store.get_user_by_session(&session.token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn lists_are_newest_first_and_limited() {
        let store = InMemoryStore::default();
        for url in ["a", "b", "c"] {
            store.insert_homepage_image(url, None).await.unwrap();
        }
        let urls: Vec<String> = store
            .list_homepage_images(Some(2))
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.url)
            .collect();
        assert_eq!(urls, ["c", "b"]);
    }
}
