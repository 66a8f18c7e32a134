use crate::domain::transition::RejectReason;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BookingError>;

/// Failure taxonomy surfaced by the booking core.
///
/// Every operation returns one of these as a typed result. Side-effect
/// failures (notification delivery) are logged instead and never appear here.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("booking not found")]
    NotFound,
    #[error("actor is not a party to this booking")]
    Unauthorized,
    #[error("transition rejected: {0}")]
    Rejected(RejectReason),
    #[error("invalid attachment: {0}")]
    InvalidAttachment(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("conflicting concurrent transition")]
    Conflict,
    #[error("storage unavailable")]
    Unavailable,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    Storage(#[from] rocksdb::Error),
    #[error("internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}
