use crate::domain::booking::PaymentProof;
use crate::error::{BookingError, Result};
use chrono::Utc;

/// Size ceiling for payment proof uploads.
pub const MAX_PROOF_BYTES: u64 = 1024 * 1024;

const ACCEPTED_TYPES: [&str; 3] = ["jpg", "jpeg", "png"];

/// File reference handed back by the blob store after the upload landed.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ProofUpload {
    pub file_url: String,
    pub size_bytes: u64,
    /// Bare extension (`jpg`) or MIME form (`image/jpeg`).
    pub content_type: String,
}

/// Validates an uploaded proof reference before the transition engine or the
/// ledger is ever consulted.
pub fn validate_proof(upload: &ProofUpload) -> Result<PaymentProof> {
    if upload.file_url.trim().is_empty() {
        return Err(BookingError::InvalidAttachment(
            "missing file reference".to_string(),
        ));
    }

    let normalized = upload.content_type.trim().to_ascii_lowercase();
    let extension = normalized.strip_prefix("image/").unwrap_or(&normalized);
    if !ACCEPTED_TYPES.contains(&extension) {
        return Err(BookingError::InvalidAttachment(format!(
            "unsupported content type: {}",
            upload.content_type
        )));
    }

    if upload.size_bytes > MAX_PROOF_BYTES {
        return Err(BookingError::InvalidAttachment(format!(
            "file is {} bytes, limit is {} bytes",
            upload.size_bytes, MAX_PROOF_BYTES
        )));
    }

    Ok(PaymentProof {
        file_url: upload.file_url.clone(),
        submitted_at: Utc::now(),
        verified_at: None,
    })
}
