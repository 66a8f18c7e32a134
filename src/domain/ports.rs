use super::booking::{Amount, Booking, BookingStatus, PaymentProof};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

/// Outcome of a conditional status write.
#[derive(Debug, PartialEq, Clone)]
pub enum CasOutcome {
    /// The write landed; carries the booking as stored after the swap.
    Committed(Booking),
    /// The stored status no longer matched the expected one.
    Conflict,
    NotFound,
}

/// Proof mutation that rides a compare-and-swap, so status and proof commit
/// atomically.
#[derive(Debug, PartialEq, Clone)]
pub enum ProofUpdate {
    /// Attach a freshly validated proof (proof upload).
    Attach(PaymentProof),
    /// Stamp the existing proof as verified (tenant approval).
    Verify(DateTime<Utc>),
    /// Drop the proof reference (tenant rejection; a fresh upload is required).
    Clear,
}

impl ProofUpdate {
    pub fn apply(self, booking: &mut Booking) {
        match self {
            Self::Attach(proof) => booking.payment_proof = Some(proof),
            Self::Verify(at) => {
                if let Some(proof) = booking.payment_proof.as_mut() {
                    proof.verified_at = Some(at);
                }
            }
            Self::Clear => booking.payment_proof = None,
        }
    }
}

/// Storage abstraction for bookings.
///
/// `compare_and_swap` is the concurrency-control primitive the whole core
/// relies on: the write must be rejected with `Conflict` when the stored
/// status no longer matches `expected`, never silently overwritten. Bookings
/// are independent units; no cross-booking guarantees are required.
#[async_trait]
pub trait BookingLedger: Send + Sync {
    /// Persists a new booking. A duplicate id is a `Conflict` error.
    async fn insert(&self, booking: Booking) -> Result<()>;

    async fn load(&self, booking_id: u64) -> Result<Option<Booking>>;

    /// Conditionally moves `booking_id` from `expected` to `next`, applying
    /// `proof_update` under the same guard.
    async fn compare_and_swap(
        &self,
        booking_id: u64,
        expected: BookingStatus,
        next: BookingStatus,
        proof_update: Option<ProofUpdate>,
    ) -> Result<CasOutcome>;

    /// Booking history for a guest's dashboard.
    async fn bookings_for_guest(&self, guest_id: u64) -> Result<Vec<Booking>>;

    /// A tenant's order list, optionally narrowed to one status.
    async fn bookings_for_tenant(
        &self,
        tenant_id: u64,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>>;

    async fn all_bookings(&self) -> Result<Vec<Booking>>;
}

/// Property catalog collaborator: room availability and pricing.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn is_room_available(
        &self,
        room_id: u64,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<bool>;

    /// Nightly base price, `None` for an unknown room.
    async fn base_price(&self, room_id: u64) -> Result<Option<Amount>>;
}

/// What a dispatched notification is about.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum NotificationKind {
    ProofSubmitted,
    BookingApproved,
    BookingRejected,
    BookingCancelled,
    PaymentReminder,
}

/// Delivery collaborator. Dispatch is fire-and-forget relative to the
/// transition that triggered it: failures are logged by the caller, never
/// propagated.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, booking_id: u64, kind: NotificationKind, recipient: u64) -> Result<()>;
}

pub type BookingLedgerBox = Box<dyn BookingLedger>;
pub type CatalogBox = Box<dyn Catalog>;
pub type NotifierHandle = Arc<dyn Notifier>;
