use crate::domain::booking::{Booking, BookingStatus};
use crate::domain::ports::{BookingLedger, CasOutcome, ProofUpdate};
use crate::error::{BookingError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing booking records.
pub const CF_BOOKINGS: &str = "bookings";

/// A persistent ledger implementation using RocksDB.
///
/// Bookings are stored as JSON values under big-endian id keys. RocksDB gives
/// no transactional read-modify-write on its own, so a mutex serializes the
/// insert and compare-and-swap paths; reads go straight to the database.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbLedger {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDbLedger {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the "bookings" column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_bookings = ColumnFamilyDescriptor::new(CF_BOOKINGS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_bookings])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(CF_BOOKINGS).ok_or_else(|| {
            BookingError::Internal(Box::new(std::io::Error::other(
                "Bookings column family not found",
            )))
        })
    }

    fn get_booking(&self, booking_id: u64) -> Result<Option<Booking>> {
        let cf = self.cf()?;
        let Some(bytes) = self.db.get_cf(cf, booking_id.to_be_bytes())? else {
            return Ok(None);
        };
        let booking = serde_json::from_slice(&bytes).map_err(|e| {
            BookingError::Internal(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Deserialization error: {}", e),
            )))
        })?;
        Ok(Some(booking))
    }

    fn put_booking(&self, booking: &Booking) -> Result<()> {
        let cf = self.cf()?;
        let value = serde_json::to_vec(booking).map_err(|e| {
            BookingError::Internal(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Serialization error: {}", e),
            )))
        })?;
        self.db.put_cf(cf, booking.id.to_be_bytes(), value)?;
        Ok(())
    }

    fn scan(&self) -> Result<Vec<Booking>> {
        let cf = self.cf()?;
        let mut bookings = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            let booking: Booking = serde_json::from_slice(&value).map_err(|e| {
                BookingError::Internal(Box::new(std::io::Error::other(format!(
                    "Failed to deserialize booking: {}",
                    e
                ))))
            })?;
            bookings.push(booking);
        }
        Ok(bookings)
    }
}

#[async_trait]
impl BookingLedger for RocksDbLedger {
    async fn insert(&self, booking: Booking) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.get_booking(booking.id)?.is_some() {
            return Err(BookingError::Conflict);
        }
        self.put_booking(&booking)
    }

    async fn load(&self, booking_id: u64) -> Result<Option<Booking>> {
        self.get_booking(booking_id)
    }

    async fn compare_and_swap(
        &self,
        booking_id: u64,
        expected: BookingStatus,
        next: BookingStatus,
        proof_update: Option<ProofUpdate>,
    ) -> Result<CasOutcome> {
        let _guard = self.write_lock.lock().await;
        let Some(mut booking) = self.get_booking(booking_id)? else {
            return Ok(CasOutcome::NotFound);
        };
        if booking.status != expected {
            return Ok(CasOutcome::Conflict);
        }
        if let Some(update) = proof_update {
            update.apply(&mut booking);
        }
        booking.status = next;
        self.put_booking(&booking)?;
        Ok(CasOutcome::Committed(booking))
    }

    async fn bookings_for_guest(&self, guest_id: u64) -> Result<Vec<Booking>> {
        let mut bookings = self.scan()?;
        bookings.retain(|b| b.guest_user_id == guest_id);
        Ok(bookings)
    }

    async fn bookings_for_tenant(
        &self,
        tenant_id: u64,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>> {
        let mut bookings = self.scan()?;
        bookings.retain(|b| b.tenant_owner_id == tenant_id);
        if let Some(status) = status {
            bookings.retain(|b| b.status == status);
        }
        Ok(bookings)
    }

    async fn all_bookings(&self) -> Result<Vec<Booking>> {
        self.scan()
    }
}
