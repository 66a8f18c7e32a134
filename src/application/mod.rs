//! Application layer containing the core business logic orchestration.
//!
//! This module defines the `BookingService`, which drives every booking
//! action through the same protocol: load, authorize, decide, commit via
//! compare-and-swap, then fire post-commit side effects.

pub mod proof;
pub mod service;
