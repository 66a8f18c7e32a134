use super::actor::Role;
use super::booking::BookingStatus;
use serde::Deserialize;
use std::fmt;

/// Actions a caller can request against a booking.
///
/// `Create` is routed to booking creation by the service and is never a valid
/// transition on an existing record; it is kept in the enum so an action
/// script is a single column.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    UploadProof,
    Cancel,
    Approve,
    Reject,
    Remind,
    Complete,
}

/// Why a requested transition was refused.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RejectReason {
    /// The actor's role never performs this action.
    WrongRole,
    /// The role performs this action, but not from the current status.
    InvalidStatus,
    /// The booking is cancelled or completed; nothing further is permitted.
    Terminal,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::WrongRole => "actor role may not perform this action",
            Self::InvalidStatus => "action not legal from current status",
            Self::Terminal => "booking is in a terminal status",
        };
        f.write_str(msg)
    }
}

/// Decides the status transition for `(status, role, action)`.
///
/// Pure and total: every listed pair maps to exactly one next status, every
/// unlisted pair is rejected. Terminal statuses refuse everything before the
/// table is consulted. `Remind` maps a booking back onto its own status; the
/// caller treats the commit as a pure side-effect trigger.
pub fn decide(
    status: BookingStatus,
    role: Role,
    action: Action,
) -> Result<BookingStatus, RejectReason> {
    use Action::*;
    use BookingStatus::*;
    use Role::*;

    if status.is_terminal() {
        return Err(RejectReason::Terminal);
    }

    match (status, role, action) {
        (WaitingPayment, Guest, UploadProof) => Ok(WaitingConfirmation),
        (WaitingPayment, Guest, Cancel) => Ok(Cancelled),
        (WaitingPayment | WaitingConfirmation, Tenant, Cancel) => Ok(Cancelled),
        (WaitingConfirmation, Tenant, Approve) => Ok(Processing),
        (WaitingConfirmation, Tenant, Reject) => Ok(WaitingPayment),
        (Processing, Tenant, Remind) => Ok(Processing),
        (Processing, System, Complete) => Ok(Completed),
        (_, role, action) if performs(role, action) => Err(RejectReason::InvalidStatus),
        _ => Err(RejectReason::WrongRole),
    }
}

/// Whether `role` performs `action` from any status at all.
fn performs(role: Role, action: Action) -> bool {
    matches!(
        (role, action),
        (
            Role::Guest,
            Action::Create | Action::UploadProof | Action::Cancel
        ) | (
            Role::Tenant,
            Action::Cancel | Action::Approve | Action::Reject | Action::Remind
        ) | (Role::System, Action::Complete)
    )
}
