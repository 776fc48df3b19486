pub mod auth;
pub mod bookings;
pub mod content;
pub mod extract;
pub mod homepage;
pub mod messages;
pub mod middleware;
pub mod pages;
pub mod rate_limit;
pub mod rest;
pub mod settings;
pub mod state;
pub mod testimonials;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::warn;

pub use middleware::route_guard;
pub use state::AppState;

/// Uploads may carry several full-size photos.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, ACCEPT]);
    match allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            warn!(origin = allowed_origin, "Ignoring unparsable ALLOWED_ORIGIN: {}", e);
            cors
        }
    }
}

/// Builds the complete application router: pages, public and admin actions,
/// auth endpoints and stored files, all behind the route guard.
pub fn router(state: Arc<AppState>) -> Router {
    // Rendered pages (JSON view-models)
    let pages = Router::new()
        .route("/", get(pages::home_page))
        .route("/login", get(pages::login_page))
        .route("/access-denied", get(pages::access_denied_page))
        .route("/portfolio", get(content::portfolio_handler))
        .route("/portfolio/{category}", get(content::category_page_handler))
        .route("/testimonials", get(testimonials::public_testimonials_handler))
        .route("/homepage-images", get(homepage::homepage_images_handler))
        .route("/admin", get(pages::dashboard_page))
        .route("/admin/bookings", get(pages::bookings_page))
        .route("/admin/messages", get(pages::messages_page))
        .route("/admin/categories", get(pages::categories_page))
        .route("/admin/photos", get(pages::photos_page))
        .route("/admin/testimonials", get(pages::testimonials_page))
        .route("/admin/homepage", get(pages::homepage_grid_page))
        .route("/admin/settings", get(pages::settings_page));

    // Code sign-in, rate limited per client
    let sign_in = Router::new()
        .route("/auth/otp", post(auth::request_code_handler))
        .route("/auth/verify", post(auth::verify_code_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth_limiter.clone(),
            rate_limit::rate_limit_middleware,
        ));

    // Anonymous actions
    let public_actions = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route("/api/bookings", post(bookings::submit_booking_handler))
        .route("/api/contact", post(messages::submit_contact_handler));

    // Admin actions, each gated by `RequireAdmin`
    let admin_actions = Router::new()
        .route("/api/admin/bookings", get(bookings::list_bookings_handler))
        .route("/api/admin/bookings/stats", get(bookings::financial_stats_handler))
        .route(
            "/api/admin/bookings/{id}/status",
            patch(bookings::update_status_handler),
        )
        .route("/api/admin/messages", get(messages::list_messages_handler))
        .route(
            "/api/admin/messages/unread-count",
            get(messages::unread_count_handler),
        )
        .route(
            "/api/admin/messages/{id}",
            delete(messages::delete_message_handler),
        )
        .route(
            "/api/admin/messages/{id}/view",
            post(messages::view_message_handler),
        )
        .route(
            "/api/admin/messages/{id}/read",
            post(messages::mark_read_handler),
        )
        .route(
            "/api/admin/categories",
            get(content::list_categories_handler).post(content::create_category_handler),
        )
        .route(
            "/api/admin/categories/{id}",
            delete(content::delete_category_handler),
        )
        .route(
            "/api/admin/photos",
            get(content::list_photos_handler).post(content::upload_photos_handler),
        )
        .route("/api/admin/photos/metadata", post(content::save_metadata_handler))
        .route("/api/admin/photos/delete", post(content::delete_photos_handler))
        .route("/api/admin/photos/{id}", delete(content::delete_photo_handler))
        .route(
            "/api/admin/testimonials",
            get(testimonials::list_testimonials_handler)
                .post(testimonials::create_testimonial_handler),
        )
        .route(
            "/api/admin/testimonials/{id}",
            delete(testimonials::delete_testimonial_handler),
        )
        .route("/api/admin/homepage", post(homepage::add_homepage_images_handler))
        .route(
            "/api/admin/homepage/{id}",
            delete(homepage::delete_homepage_image_handler),
        )
        .route(
            "/api/admin/settings/profiles",
            get(settings::list_profiles_handler),
        )
        .route(
            "/api/admin/settings/profiles/{id}",
            delete(settings::remove_admin_handler),
        )
        .route(
            "/api/admin/settings/profiles/{id}/display-name",
            patch(settings::update_display_name_handler),
        )
        .route(
            "/api/admin/settings/enroll/send",
            post(settings::send_enrollment_code_handler),
        )
        .route(
            "/api/admin/settings/enroll/verify",
            post(settings::verify_enrollment_handler),
        );

    Router::new()
        .merge(pages)
        .merge(sign_in)
        .merge(public_actions)
        .merge(admin_actions)
        .nest_service("/storage", ServeDir::new(&state.config.storage_root))
        .layer(axum_middleware::from_fn_with_state(state.clone(), route_guard))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.allowed_origin))
        .with_state(state)
}
