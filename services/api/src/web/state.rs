//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::rate_limit::RateLimiter;
use std::sync::Arc;
use studio_core::bookings::BookingService;
use studio_core::content::ContentService;
use studio_core::enrollment::AdminEnrollment;
use studio_core::inbox::InboxService;
use studio_core::ports::{CacheInvalidator, DatabaseService, IdentityService, ObjectStorage};
use studio_core::showcase::ShowcaseService;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub identity: Arc<dyn IdentityService>,
    pub storage: Arc<dyn ObjectStorage>,
    pub cache: Arc<dyn CacheInvalidator>,
    pub config: Arc<Config>,
    /// Shared by `/auth/otp` and `/auth/verify`.
    pub auth_limiter: RateLimiter,
}

impl AppState {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        identity: Arc<dyn IdentityService>,
        storage: Arc<dyn ObjectStorage>,
        cache: Arc<dyn CacheInvalidator>,
        config: Arc<Config>,
    ) -> Self {
        let auth_limiter = RateLimiter::per_minute(config.auth_rate_per_minute, config.auth_burst);
        Self {
            db,
            identity,
            storage,
            cache,
            config,
            auth_limiter,
        }
    }

    pub fn bookings(&self) -> BookingService {
        BookingService::new(self.db.clone(), self.cache.clone())
    }

    pub fn inbox(&self) -> InboxService {
        InboxService::new(self.db.clone(), self.cache.clone())
    }

    pub fn content(&self) -> ContentService {
        ContentService::new(self.db.clone(), self.storage.clone(), self.cache.clone())
    }

    pub fn showcase(&self) -> ShowcaseService {
        ShowcaseService::new(self.db.clone(), self.storage.clone(), self.cache.clone())
    }

    pub fn enrollment(&self) -> AdminEnrollment {
        AdminEnrollment::new(self.identity.clone(), self.cache.clone())
    }
}
