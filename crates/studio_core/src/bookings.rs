//! crates/studio_core/src/bookings.rs
//!
//! The booking lifecycle: public submission, admin status transitions and the
//! financial aggregates shown on the dashboard.

use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, LazyLock};
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{Booking, BookingPrice, BookingStatus, FinancialStats, NewBooking};
use crate::error::{ActionError, ActionResult};
use crate::ports::{CacheInvalidator, DatabaseService};

const ADMIN_BOOKINGS_PATH: &str = "/admin/bookings";

/// The booking form as posted by the public site.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookingForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub package_name: String,
    pub package_price: String,
    pub category_title: String,
}

/// Blank optional fields are stored as absent.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn required(value: &str, field: &'static str) -> ActionResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ActionError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

impl BookingForm {
    /// Checks the required fields in form order and builds the row to insert.
    pub fn validate(self) -> ActionResult<NewBooking> {
        Ok(NewBooking {
            name: required(&self.name, "name")?,
            email: required(&self.email, "email")?,
            package_name: required(&self.package_name, "package_name")?,
            category_title: required(&self.category_title, "category_title")?,
            package_price: self.package_price.trim().to_string(),
            phone: optional(self.phone),
            message: optional(self.message),
        })
    }
}

static NON_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9.]").expect("static regex"));

/// Parses a currency-prefixed price such as `"€165"`.
///
/// Everything but digits and dots is stripped; the longest leading number is
/// used and anything unparsable counts as zero.
pub fn parse_price(raw: &str) -> f64 {
    let stripped = NON_NUMERIC.replace_all(raw, "");
    let end = stripped
        .char_indices()
        .filter(|(_, c)| *c == '.')
        .nth(1)
        .map(|(i, _)| i)
        .unwrap_or(stripped.len());
    stripped[..end].parse::<f64>().unwrap_or(0.0)
}

/// `profit` sums completed bookings, `unsettled` sums confirmed ones.
pub fn compute_stats(prices: &[BookingPrice]) -> FinancialStats {
    prices.iter().fold(
        FinancialStats {
            total_bookings: prices.len(),
            ..FinancialStats::default()
        },
        |mut stats, entry| {
            match entry.status.parse::<BookingStatus>() {
                Ok(BookingStatus::Completed) => stats.profit += parse_price(&entry.package_price),
                Ok(BookingStatus::Confirmed) => stats.unsettled += parse_price(&entry.package_price),
                _ => {}
            }
            stats
        },
    )
}

#[derive(Clone)]
pub struct BookingService {
    db: Arc<dyn DatabaseService>,
    cache: Arc<dyn CacheInvalidator>,
}

impl BookingService {
    pub fn new(db: Arc<dyn DatabaseService>, cache: Arc<dyn CacheInvalidator>) -> Self {
        Self { db, cache }
    }

    /// The only mutation open to anonymous callers. New bookings are always `pending`.
    pub async fn submit(&self, form: BookingForm) -> ActionResult<Booking> {
        let booking = form.validate()?;

        let created = self.db.insert_booking(booking).await.map_err(|e| {
            error!("Failed to create booking: {:?}", e);
            ActionError::Store("Failed to create booking. Please try again.".to_string())
        })?;

        info!(booking_id = %created.id, "Booking request received");
        self.cache.revalidate(ADMIN_BOOKINGS_PATH);
        Ok(created)
    }

    /// Newest first. A failed read is logged and reported as no bookings.
    pub async fn list(&self) -> Vec<Booking> {
        self.list_limited(None).await
    }

    /// The dashboard's recent-bookings widget.
    pub async fn recent(&self, limit: i64) -> Vec<Booking> {
        self.list_limited(Some(limit)).await
    }

    async fn list_limited(&self, limit: Option<i64>) -> Vec<Booking> {
        match self.db.list_bookings(limit).await {
            Ok(bookings) => bookings,
            Err(e) => {
                error!("Error fetching bookings: {:?}", e);
                Vec::new()
            }
        }
    }

    /// Validates the status before writing. Any status may follow any other.
    pub async fn update_status(&self, id: Uuid, new_status: &str) -> ActionResult<BookingStatus> {
        let status = new_status
            .parse::<BookingStatus>()
            .map_err(|_| ActionError::Validation("Invalid status".to_string()))?;

        let updated = self
            .db
            .update_booking_status(id, status)
            .await
            .map_err(|e| {
                error!(booking_id = %id, "Error updating booking: {:?}", e);
                ActionError::Store("Failed to update status".to_string())
            })?;
        if !updated {
            return Err(ActionError::NotFound(format!("Booking {id} not found")));
        }

        info!(booking_id = %id, status = %status, "Booking status updated");
        self.cache.revalidate(ADMIN_BOOKINGS_PATH);
        Ok(status)
    }

    /// All-zero stats on read failure; the dashboard never fails on this widget.
    pub async fn financial_stats(&self) -> FinancialStats {
        match self.db.list_booking_prices().await {
            Ok(prices) => compute_stats(&prices),
            Err(e) => {
                error!("Error fetching financial stats: {:?}", e);
                FinancialStats::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(status: &str, package_price: &str) -> BookingPrice {
        BookingPrice {
            status: status.to_string(),
            package_price: package_price.to_string(),
        }
    }

    #[test]
    fn parses_currency_prefixed_prices() {
        assert_eq!(parse_price("€165"), 165.0);
        assert_eq!(parse_price("$1,250.50"), 1250.5);
        assert_eq!(parse_price("from £99.99 per hour"), 99.99);
        assert_eq!(parse_price("1.2.3"), 1.2);
        assert_eq!(parse_price(".5"), 0.5);
    }

    #[test]
    fn unparsable_price_is_zero() {
        assert_eq!(parse_price(""), 0.0);
        assert_eq!(parse_price("on request"), 0.0);
        assert_eq!(parse_price("."), 0.0);
    }

    #[test]
    fn stats_split_completed_and_confirmed() {
        let stats = compute_stats(&[
            price("completed", "€165"),
            price("confirmed", "€250"),
            price("pending", "€100"),
        ]);
        assert_eq!(stats.profit, 165.0);
        assert_eq!(stats.unsettled, 250.0);
        assert_eq!(stats.total_bookings, 3);
    }

    #[test]
    fn cancelled_and_unknown_statuses_only_count_towards_total() {
        let stats = compute_stats(&[
            price("cancelled", "€500"),
            price("weird", "€10"),
            price("completed", "free"),
        ]);
        assert_eq!(stats.profit, 0.0);
        assert_eq!(stats.unsettled, 0.0);
        assert_eq!(stats.total_bookings, 3);
    }

    #[test]
    fn form_requires_core_fields() {
        let form = BookingForm {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            package_name: "Mini Session".into(),
            category_title: "Family".into(),
            ..Default::default()
        };
        let booking = form.clone().validate().unwrap();
        assert_eq!(booking.name, "Ana");
        assert_eq!(booking.phone, None);

        for (field, form) in [
            ("name", BookingForm { name: "  ".into(), ..form.clone() }),
            ("email", BookingForm { email: String::new(), ..form.clone() }),
            ("package_name", BookingForm { package_name: String::new(), ..form.clone() }),
            ("category_title", BookingForm { category_title: "\t".into(), ..form.clone() }),
        ] {
            assert_eq!(form.validate().unwrap_err(), ActionError::MissingField(field));
        }
    }

    #[test]
    fn blank_optionals_are_dropped() {
        let form = BookingForm {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone: Some("   ".into()),
            message: Some(" Hello ".into()),
            package_name: "Mini".into(),
            category_title: "Family".into(),
            ..Default::default()
        };
        let booking = form.validate().unwrap();
        assert_eq!(booking.phone, None);
        assert_eq!(booking.message.as_deref(), Some("Hello"));
    }
}
