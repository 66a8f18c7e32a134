use crate::domain::actor::Role;
use crate::domain::transition::Action;
use crate::error::{BookingError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;

/// One row of a booking action script.
///
/// Only `action`, `booking`, `actor` and `role` are always present; the rest
/// is payload for the specific action (creation details, the stored proof
/// reference, the scheduler's date) and stays empty otherwise.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ActionRecord {
    pub action: Action,
    pub booking: u64,
    pub actor: u64,
    pub role: Role,
    #[serde(default)]
    pub room: Option<u64>,
    #[serde(default)]
    pub tenant: Option<u64>,
    #[serde(default)]
    pub check_in: Option<NaiveDate>,
    #[serde(default)]
    pub check_out: Option<NaiveDate>,
    #[serde(default)]
    pub guests: Option<u32>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

/// Reads booking actions from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over
/// `Result<ActionRecord>`. It handles whitespace trimming and flexible record
/// lengths automatically.
pub struct ActionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ActionReader<R> {
    /// Creates a new `ActionReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes action records.
    pub fn records(self) -> impl Iterator<Item = Result<ActionRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(BookingError::from))
    }
}
