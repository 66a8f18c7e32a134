use crate::domain::booking::Booking;
use crate::error::Result;
use std::io::Write;

/// Writes final booking snapshots as CSV.
///
/// Rows are sorted by booking id and amounts are normalized (no trailing
/// zeros) so output is stable across runs.
pub struct BookingWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> BookingWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_bookings(&mut self, mut bookings: Vec<Booking>) -> Result<()> {
        bookings.sort_by_key(|b| b.id);

        self.writer.write_record([
            "id",
            "guest",
            "tenant",
            "status",
            "check_in",
            "check_out",
            "guests",
            "total",
            "proof",
            "verified",
        ])?;

        for booking in bookings {
            let proof_url = booking
                .payment_proof
                .as_ref()
                .map(|p| p.file_url.clone())
                .unwrap_or_default();
            let verified = booking
                .payment_proof
                .as_ref()
                .is_some_and(|p| p.verified_at.is_some());

            self.writer.write_record([
                booking.id.to_string(),
                booking.guest_user_id.to_string(),
                booking.tenant_owner_id.to_string(),
                booking.status.to_string(),
                booking.check_in.to_string(),
                booking.check_out.to_string(),
                booking.guests.to_string(),
                booking.total_amount.value().normalize().to_string(),
                proof_url,
                verified.to_string(),
            ])?;
        }

        self.writer.flush()?;
        Ok(())
    }
}
