use crate::error::BookingError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a non-negative monetary value.
///
/// This is a wrapper around `rust_decimal::Decimal` to enforce domain-specific rules
/// and provide type safety for price calculations.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, BookingError> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(BookingError::Validation(
                "Amount must not be negative".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = BookingError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Lifecycle status of a booking.
///
/// Serialized with the wire names the rest of the platform uses
/// (`WAITING_PAYMENT`, ...). `Cancelled` and `Completed` are terminal.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    WaitingPayment,
    WaitingConfirmation,
    Processing,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    /// The wire name, also used by the snapshot writer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaitingPayment => "WAITING_PAYMENT",
            Self::WaitingConfirmation => "WAITING_CONFIRMATION",
            Self::Processing => "PROCESSING",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment evidence submitted by the guest, pending tenant verification.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct PaymentProof {
    /// Location of the stored file, as returned by the blob store.
    pub file_url: String,
    pub submitted_at: DateTime<Utc>,
    /// Set when the tenant approves the booking.
    pub verified_at: Option<DateTime<Utc>>,
}

/// A reservation of a room for a date range by a guest.
///
/// The guest and tenant parties are fixed at creation time; the only mutable
/// parts are `status` and `payment_proof`, and both change exclusively through
/// ledger compare-and-swap writes driven by the transition engine.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Booking {
    pub id: u64,
    /// The guest who created the reservation.
    pub guest_user_id: u64,
    /// The owner of the property being booked.
    pub tenant_owner_id: u64,
    pub room_id: u64,
    pub status: BookingStatus,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    /// Fixed at creation: nightly base price times the number of nights.
    pub total_amount: Amount,
    pub payment_proof: Option<PaymentProof>,
}

impl Booking {
    /// Creates a booking in `WaitingPayment`, validating the date range and
    /// guest count.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        guest_user_id: u64,
        tenant_owner_id: u64,
        room_id: u64,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guests: u32,
        total_amount: Amount,
    ) -> Result<Self, BookingError> {
        if check_in >= check_out {
            return Err(BookingError::Validation(
                "check-in must be before check-out".to_string(),
            ));
        }
        if guests == 0 {
            return Err(BookingError::Validation(
                "guest count must be positive".to_string(),
            ));
        }
        Ok(Self {
            id,
            guest_user_id,
            tenant_owner_id,
            room_id,
            status: BookingStatus::WaitingPayment,
            check_in,
            check_out,
            guests,
            total_amount,
            payment_proof: None,
        })
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(0.0)).is_ok());
        assert!(Amount::new(dec!(150000.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(BookingError::Validation(_))
        ));
    }

    #[test]
    fn test_status_terminality() {
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
        assert!(!BookingStatus::WaitingPayment.is_terminal());
        assert!(!BookingStatus::WaitingConfirmation.is_terminal());
        assert!(!BookingStatus::Processing.is_terminal());
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&BookingStatus::WaitingPayment).unwrap();
        assert_eq!(json, "\"WAITING_PAYMENT\"");
        let status: BookingStatus = serde_json::from_str("\"WAITING_CONFIRMATION\"").unwrap();
        assert_eq!(status, BookingStatus::WaitingConfirmation);
        assert_eq!(BookingStatus::Processing.to_string(), "PROCESSING");
    }

    #[test]
    fn test_booking_new_starts_waiting_payment() {
        let booking = Booking::new(
            1,
            10,
            20,
            7,
            date("2025-06-01"),
            date("2025-06-03"),
            2,
            Amount::new(dec!(200.0)).unwrap(),
        )
        .unwrap();
        assert_eq!(booking.status, BookingStatus::WaitingPayment);
        assert!(booking.payment_proof.is_none());
        assert_eq!(booking.nights(), 2);
    }

    #[test]
    fn test_booking_new_rejects_inverted_dates() {
        let result = Booking::new(
            1,
            10,
            20,
            7,
            date("2025-06-03"),
            date("2025-06-01"),
            2,
            Amount::ZERO,
        );
        assert!(matches!(result, Err(BookingError::Validation(_))));

        let same_day = Booking::new(
            1,
            10,
            20,
            7,
            date("2025-06-01"),
            date("2025-06-01"),
            2,
            Amount::ZERO,
        );
        assert!(matches!(same_day, Err(BookingError::Validation(_))));
    }

    #[test]
    fn test_booking_new_rejects_zero_guests() {
        let result = Booking::new(
            1,
            10,
            20,
            7,
            date("2025-06-01"),
            date("2025-06-03"),
            0,
            Amount::ZERO,
        );
        assert!(matches!(result, Err(BookingError::Validation(_))));
    }
}
