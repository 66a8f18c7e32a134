use crate::domain::booking::{Amount, Booking, BookingStatus};
use crate::domain::ports::{BookingLedger, CasOutcome, Catalog, ProofUpdate};
use crate::error::{BookingError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory booking ledger.
///
/// Uses `Arc<RwLock<HashMap<u64, Booking>>>` to allow shared concurrent
/// access. The compare-and-swap runs entirely under the write guard, which is
/// what makes transitions on a single booking linearizable.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    bookings: Arc<RwLock<HashMap<u64, Booking>>>,
}

impl InMemoryLedger {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingLedger for InMemoryLedger {
    async fn insert(&self, booking: Booking) -> Result<()> {
        let mut bookings = self.bookings.write().await;
        if bookings.contains_key(&booking.id) {
            return Err(BookingError::Conflict);
        }
        bookings.insert(booking.id, booking);
        Ok(())
    }

    async fn load(&self, booking_id: u64) -> Result<Option<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings.get(&booking_id).cloned())
    }

    async fn compare_and_swap(
        &self,
        booking_id: u64,
        expected: BookingStatus,
        next: BookingStatus,
        proof_update: Option<ProofUpdate>,
    ) -> Result<CasOutcome> {
        let mut bookings = self.bookings.write().await;
        let Some(booking) = bookings.get_mut(&booking_id) else {
            return Ok(CasOutcome::NotFound);
        };
        if booking.status != expected {
            return Ok(CasOutcome::Conflict);
        }
        if let Some(update) = proof_update {
            update.apply(booking);
        }
        booking.status = next;
        Ok(CasOutcome::Committed(booking.clone()))
    }

    async fn bookings_for_guest(&self, guest_id: u64) -> Result<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings
            .values()
            .filter(|b| b.guest_user_id == guest_id)
            .cloned()
            .collect())
    }

    async fn bookings_for_tenant(
        &self,
        tenant_id: u64,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings
            .values()
            .filter(|b| b.tenant_owner_id == tenant_id)
            .filter(|b| status.is_none_or(|s| b.status == s))
            .cloned()
            .collect())
    }

    async fn all_bookings(&self) -> Result<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings.values().cloned().collect())
    }
}

/// Catalog stub backed by a fixed price table.
///
/// A room is available iff it has a price. `with_flat_price` makes every room
/// available at the same nightly rate, which is what the replay driver and
/// most tests want.
#[derive(Default, Clone)]
pub struct StaticCatalog {
    prices: HashMap<u64, Amount>,
    flat: Option<Amount>,
}

impl StaticCatalog {
    /// Creates a catalog with no rooms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog where every room exists and costs `price` per night.
    pub fn with_flat_price(price: Amount) -> Self {
        Self {
            prices: HashMap::new(),
            flat: Some(price),
        }
    }

    /// Adds a single priced room.
    pub fn with_room(mut self, room_id: u64, price: Amount) -> Self {
        self.prices.insert(room_id, price);
        self
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn is_room_available(
        &self,
        room_id: u64,
        _check_in: NaiveDate,
        _check_out: NaiveDate,
    ) -> Result<bool> {
        Ok(self.prices.contains_key(&room_id) || self.flat.is_some())
    }

    async fn base_price(&self, room_id: u64) -> Result<Option<Amount>> {
        Ok(self.prices.get(&room_id).copied().or(self.flat))
    }
}
