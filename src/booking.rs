// Booking records persisted to the remote bookings table, one per cart item at
// checkout. The mapping from a cart item is fixed: missing dates and guest
// counts get kind-appropriate defaults so every submitted row is complete.

use crate::cart::{CartItem, ItemKind};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

// What the remote schema distinguishes: property stays vs service bookings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingKind {
    Property,
    Service,
}

impl From<ItemKind> for BookingKind {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Rental => BookingKind::Property,
            ItemKind::Tour | ItemKind::Transfer | ItemKind::Product | ItemKind::Other => {
                BookingKind::Service
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBooking {
    pub user_id: String,
    pub item_id: String,
    pub item_type: BookingKind,
    pub status: BookingStatus,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total_price: f64,
    pub guests: u32,
}

impl NewBooking {
    pub fn from_cart_item(user_id: &str, item: &CartItem) -> Self {
        Self::from_cart_item_on(user_id, item, Utc::now().date_naive())
    }

    // Date defaults: rentals fall back to a one-night stay starting today,
    // everything else to a same-day range
    pub fn from_cart_item_on(user_id: &str, item: &CartItem, today: NaiveDate) -> Self {
        let check_in = item.check_in.unwrap_or(today);
        let default_check_out = match item.kind {
            ItemKind::Rental => check_in + Duration::days(1),
            _ => check_in,
        };
        let check_out = item.check_out.unwrap_or(default_check_out);

        Self {
            user_id: user_id.to_string(),
            item_id: item.id.clone(),
            item_type: item.kind.into(),
            status: BookingStatus::Pending,
            check_in,
            check_out,
            total_price: item.price,
            guests: item.guests.unwrap_or(1),
        }
    }

    // Row shape submitted to the bookings table
    pub fn to_row(&self) -> Value {
        json!({
            "user_id": self.user_id,
            "item_id": self.item_id,
            "item_type": self.item_type,
            "status": self.status,
            "check_in": self.check_in,
            "check_out": self.check_out,
            "total_price": self.total_price,
            "guests": self.guests,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_rental_maps_to_property_booking() {
        let item = CartItem::new("p1", ItemKind::Rental, "Seaside Villa", 500.0)
            .with_dates(day(2026, 9, 1), day(2026, 9, 5))
            .with_guests(3);

        let booking = NewBooking::from_cart_item_on("user-1", &item, day(2026, 8, 25));

        assert_eq!(booking.item_type, BookingKind::Property);
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.check_in, day(2026, 9, 1));
        assert_eq!(booking.check_out, day(2026, 9, 5));
        assert_eq!(booking.guests, 3);
        assert_eq!(booking.total_price, 500.0);
    }

    #[test]
    fn test_rental_without_dates_defaults_to_one_night() {
        let item = CartItem::new("p2", ItemKind::Rental, "City Flat", 120.0);
        let booking = NewBooking::from_cart_item_on("user-1", &item, day(2026, 8, 25));

        assert_eq!(booking.check_in, day(2026, 8, 25));
        assert_eq!(booking.check_out, day(2026, 8, 26));
        assert_eq!(booking.guests, 1);
    }

    #[test]
    fn test_service_without_dates_is_same_day() {
        let item = CartItem::new("t1", ItemKind::Transfer, "Airport Transfer", 30.0);
        let booking = NewBooking::from_cart_item_on("user-1", &item, day(2026, 8, 25));

        assert_eq!(booking.item_type, BookingKind::Service);
        assert_eq!(booking.check_in, day(2026, 8, 25));
        assert_eq!(booking.check_out, day(2026, 8, 25));
    }

    #[test]
    fn test_row_uses_remote_field_names() {
        let item = CartItem::new("rec-1", ItemKind::Tour, "Sunset Boat Tour", 45.0);
        let row = NewBooking::from_cart_item_on("user-9", &item, day(2026, 8, 25)).to_row();

        assert_eq!(row["user_id"], "user-9");
        assert_eq!(row["item_id"], "rec-1");
        assert_eq!(row["item_type"], "service");
        assert_eq!(row["status"], "pending");
        assert_eq!(row["check_in"], "2026-08-25");
        assert_eq!(row["total_price"], 45.0);
        assert_eq!(row["guests"], 1);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&BookingStatus::Confirmed).unwrap(),
            "\"confirmed\""
        );
        let status: BookingStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, BookingStatus::Cancelled);
    }
}
