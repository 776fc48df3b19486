//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification.

use utoipa::OpenApi;

use crate::error::ActionReply;
use crate::web::{auth, bookings, content, homepage, messages, settings, testimonials};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::request_code_handler,
        auth::verify_code_handler,
        auth::logout_handler,
        bookings::submit_booking_handler,
        bookings::list_bookings_handler,
        bookings::update_status_handler,
        bookings::financial_stats_handler,
        messages::submit_contact_handler,
        messages::list_messages_handler,
        messages::unread_count_handler,
        messages::view_message_handler,
        messages::mark_read_handler,
        messages::delete_message_handler,
        content::create_category_handler,
        content::list_categories_handler,
        content::delete_category_handler,
        content::list_photos_handler,
        content::upload_photos_handler,
        content::save_metadata_handler,
        content::delete_photo_handler,
        content::delete_photos_handler,
        content::portfolio_handler,
        content::category_page_handler,
        testimonials::public_testimonials_handler,
        testimonials::list_testimonials_handler,
        testimonials::create_testimonial_handler,
        testimonials::delete_testimonial_handler,
        homepage::homepage_images_handler,
        homepage::add_homepage_images_handler,
        homepage::delete_homepage_image_handler,
        settings::list_profiles_handler,
        settings::send_enrollment_code_handler,
        settings::verify_enrollment_handler,
        settings::remove_admin_handler,
        settings::update_display_name_handler,
    ),
    components(
        schemas(
            ActionReply,
            auth::OtpRequest,
            auth::VerifyRequest,
            bookings::BookingRequest,
            bookings::StatusUpdate,
            messages::ContactRequest,
            messages::UnreadCount,
            content::NewCategoryRequest,
            content::NewPhotoRequest,
            content::PhotoSelection,
            settings::EnrollEmail,
            settings::EnrollVerify,
            settings::DisplayNameUpdate,
        )
    ),
    tags(
        (name = "Studio Back Office API", description = "Bookings, enquiries, portfolio content and admin enrollment for the photography studio.")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_bodies_are_documented() {
        let doc = ApiDoc::openapi();
        let schemas = doc.components.expect("components").schemas;
        for name in ["BookingRequest", "ContactRequest", "NewPhotoRequest", "PhotoSelection"] {
            assert!(schemas.contains_key(name), "{name}");
        }

        for path in ["/api/bookings", "/api/contact", "/api/admin/photos/metadata", "/api/admin/photos/delete"] {
            let item = doc.paths.paths.get(path).expect(path);
            let post = item.post.as_ref().expect(path);
            assert!(post.request_body.is_some(), "{path}");
        }
    }
}
