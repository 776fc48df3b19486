//! services/api/src/web/bookings.rs
//!
//! Public booking submission and the admin booking actions.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use studio_core::bookings::BookingForm;
use studio_core::domain::{Booking, FinancialStats};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ActionReply, ActionResponse};
use crate::web::extract::RequireAdmin;
use crate::web::state::AppState;

/// The booking form as the public site posts it.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct BookingRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub package_name: String,
    /// Display price, e.g. `"$1,200"`.
    pub package_price: String,
    pub category_title: String,
}

impl From<BookingRequest> for BookingForm {
    fn from(request: BookingRequest) -> Self {
        BookingForm {
            name: request.name,
            email: request.email,
            phone: request.phone,
            message: request.message,
            package_name: request.package_name,
            package_price: request.package_price,
            category_title: request.category_title,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct StatusUpdate {
    /// One of `pending`, `confirmed`, `completed`, `cancelled`.
    pub status: String,
}

/// POST /api/bookings - Submit a booking request (anonymous)
#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = BookingRequest,
    responses(
        (status = 200, description = "Booking stored as pending; `id` is the booking id", body = ActionReply),
        (status = 400, description = "Missing required field", body = ActionReply),
        (status = 500, description = "Store failure", body = ActionReply)
    )
)]
pub async fn submit_booking_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BookingRequest>,
) -> ActionResponse {
    let booking = state.bookings().submit(request.into()).await?;
    Ok(Json(
        ActionReply::message("Booking request sent").with_id(booking.id),
    ))
}

/// GET /api/admin/bookings - Every booking, newest first
#[utoipa::path(
    get,
    path = "/api/admin/bookings",
    responses(
        (status = 200, description = "Bookings, newest first"),
        (status = 401, description = "Not an admin", body = ActionReply)
    )
)]
pub async fn list_bookings_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<Vec<Booking>> {
    Json(state.bookings().list().await)
}

/// PATCH /api/admin/bookings/{id}/status - Move a booking to another status
#[utoipa::path(
    patch,
    path = "/api/admin/bookings/{id}/status",
    request_body = StatusUpdate,
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Status updated", body = ActionReply),
        (status = 400, description = "Invalid status", body = ActionReply),
        (status = 401, description = "Not an admin", body = ActionReply),
        (status = 404, description = "No such booking", body = ActionReply),
        (status = 500, description = "Failed to update status", body = ActionReply)
    )
)]
pub async fn update_status_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate>,
) -> ActionResponse {
    let status = state.bookings().update_status(id, &update.status).await?;
    Ok(Json(
        ActionReply::message(format!("Booking marked {status}")).with_id(id),
    ))
}

/// GET /api/admin/bookings/stats - Profit, unsettled revenue and booking count
#[utoipa::path(
    get,
    path = "/api/admin/bookings/stats",
    responses(
        (status = 200, description = "Financial aggregates; zeros when bookings cannot be read"),
        (status = 401, description = "Not an admin", body = ActionReply)
    )
)]
pub async fn financial_stats_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<FinancialStats> {
    Json(state.bookings().financial_stats().await)
}
