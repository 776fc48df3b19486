//! services/api/src/web/pages.rs
//!
//! View-models for the rendered pages. Everything under `/admin` is reachable
//! only through the route guard, so these handlers assume an admin session.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use studio_core::domain::{
    Booking, Category, FinancialStats, HomepageImage, Message, Photo, Profile, Testimonial, User,
};
use studio_core::showcase::{DEFAULT_TESTIMONIAL_LIMIT, MAX_HOMEPAGE_IMAGES};

use crate::web::extract::{CurrentSession, RequireAdmin};
use crate::web::state::AppState;

/// Bookings shown in the dashboard's recent list.
const RECENT_BOOKINGS: i64 = 5;

#[derive(Serialize)]
pub struct HomePage {
    pub images: Vec<HomepageImage>,
    pub testimonials: Vec<Testimonial>,
}

#[derive(Serialize)]
pub struct StaticPage {
    pub page: &'static str,
    pub signed_in: bool,
}

#[derive(Serialize)]
pub struct Dashboard {
    pub stats: FinancialStats,
    pub recent_bookings: Vec<Booking>,
    pub unread_messages: i64,
    pub categories: Vec<Category>,
}

#[derive(Serialize)]
pub struct BookingsPage {
    pub bookings: Vec<Booking>,
}

#[derive(Serialize)]
pub struct MessagesPage {
    pub messages: Vec<Message>,
    pub unread: i64,
}

#[derive(Serialize)]
pub struct CategoriesPage {
    pub categories: Vec<Category>,
}

#[derive(Serialize)]
pub struct PhotosPage {
    pub photos: Vec<Photo>,
    pub categories: Vec<Category>,
}

#[derive(Serialize)]
pub struct TestimonialsPage {
    pub testimonials: Vec<Testimonial>,
}

#[derive(Serialize)]
pub struct HomepageGridPage {
    pub images: Vec<HomepageImage>,
    pub capacity: usize,
}

#[derive(Serialize)]
pub struct SettingsPage {
    pub current_admin: User,
    pub profiles: Vec<Profile>,
}

//=========================================================================================
// Public pages
//=========================================================================================

pub async fn home_page(State(state): State<Arc<AppState>>) -> Json<HomePage> {
    let showcase = state.showcase();
    let (images, testimonials) = tokio::join!(
        showcase.homepage_images(),
        showcase.list_testimonials(Some(DEFAULT_TESTIMONIAL_LIMIT))
    );
    Json(HomePage {
        images,
        testimonials,
    })
}

pub async fn login_page(CurrentSession(session): CurrentSession) -> Json<StaticPage> {
    Json(StaticPage {
        page: "login",
        signed_in: session.is_authenticated(),
    })
}

pub async fn access_denied_page(CurrentSession(session): CurrentSession) -> Json<StaticPage> {
    Json(StaticPage {
        page: "access-denied",
        signed_in: session.is_authenticated(),
    })
}

//=========================================================================================
// Admin pages
//=========================================================================================

pub async fn dashboard_page(State(state): State<Arc<AppState>>) -> Json<Dashboard> {
    let bookings = state.bookings();
    let inbox = state.inbox();
    let content = state.content();
    let (stats, recent_bookings, unread_messages, categories) = tokio::join!(
        bookings.financial_stats(),
        bookings.recent(RECENT_BOOKINGS),
        inbox.unread_count(),
        content.list_categories()
    );
    Json(Dashboard {
        stats,
        recent_bookings,
        unread_messages,
        categories,
    })
}

pub async fn bookings_page(State(state): State<Arc<AppState>>) -> Json<BookingsPage> {
    Json(BookingsPage {
        bookings: state.bookings().list().await,
    })
}

pub async fn messages_page(State(state): State<Arc<AppState>>) -> Json<MessagesPage> {
    let inbox = state.inbox();
    let (messages, unread) = tokio::join!(inbox.list(), inbox.unread_count());
    Json(MessagesPage { messages, unread })
}

pub async fn categories_page(State(state): State<Arc<AppState>>) -> Json<CategoriesPage> {
    Json(CategoriesPage {
        categories: state.content().list_categories().await,
    })
}

pub async fn photos_page(State(state): State<Arc<AppState>>) -> Json<PhotosPage> {
    let content = state.content();
    let (photos, categories) = tokio::join!(content.list_photos(None, None), content.list_categories());
    Json(PhotosPage { photos, categories })
}

pub async fn testimonials_page(State(state): State<Arc<AppState>>) -> Json<TestimonialsPage> {
    Json(TestimonialsPage {
        testimonials: state.showcase().list_testimonials(None).await,
    })
}

pub async fn homepage_grid_page(State(state): State<Arc<AppState>>) -> Json<HomepageGridPage> {
    Json(HomepageGridPage {
        images: state.showcase().homepage_images().await,
        capacity: MAX_HOMEPAGE_IMAGES,
    })
}

pub async fn settings_page(RequireAdmin(admin): RequireAdmin) -> Json<SettingsPage> {
    Json(SettingsPage {
        current_admin: admin.admin().clone(),
        profiles: admin.list_profiles().await,
    })
}
