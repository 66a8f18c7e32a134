use crate::application::proof::{ProofUpload, validate_proof};
use crate::domain::actor::{Actor, Role};
use crate::domain::booking::{Amount, Booking, BookingStatus};
use crate::domain::ports::{
    BookingLedgerBox, CasOutcome, CatalogBox, NotificationKind, NotifierHandle, ProofUpdate,
};
use crate::domain::transition::{Action, RejectReason, decide};
use crate::error::{BookingError, Result};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// How many times a transition is re-attempted after losing a
/// compare-and-swap race or timing out against the ledger.
pub const MAX_TRANSITION_RETRIES: usize = 3;

const DEFAULT_LEDGER_TIMEOUT: Duration = Duration::from_secs(5);

/// Guest-supplied reservation request.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct NewBooking {
    pub id: u64,
    pub room_id: u64,
    pub tenant_owner_id: u64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
}

/// The main entry point for booking lifecycle operations.
///
/// `BookingService` owns the storage and collaborator ports and runs every
/// action through the same protocol: load the booking, authorize the actor,
/// ask the transition engine for the next status, commit it with a
/// compare-and-swap, then dispatch side effects. Conflicting concurrent
/// actions are linearized by the ledger's compare-and-swap; the loser retries
/// from a fresh read and re-evaluates its action against whatever the winner
/// produced.
pub struct BookingService {
    ledger: BookingLedgerBox,
    catalog: CatalogBox,
    notifier: NotifierHandle,
    ledger_timeout: Duration,
}

impl BookingService {
    pub fn new(ledger: BookingLedgerBox, catalog: CatalogBox, notifier: NotifierHandle) -> Self {
        Self {
            ledger,
            catalog,
            notifier,
            ledger_timeout: DEFAULT_LEDGER_TIMEOUT,
        }
    }

    /// Overrides the bound applied to every ledger and catalog call.
    pub fn with_ledger_timeout(mut self, ledger_timeout: Duration) -> Self {
        self.ledger_timeout = ledger_timeout;
        self
    }

    /// Creates a booking in `WaitingPayment` after validating the request and
    /// confirming availability with the catalog collaborator.
    pub async fn create_booking(&self, actor: Actor, request: NewBooking) -> Result<Booking> {
        if actor.role != Role::Guest {
            return Err(BookingError::Rejected(RejectReason::WrongRole));
        }

        let available = self
            .bounded(self.catalog.is_room_available(
                request.room_id,
                request.check_in,
                request.check_out,
            ))
            .await?;
        if !available {
            return Err(BookingError::Validation(format!(
                "room {} is not available for {}..{}",
                request.room_id, request.check_in, request.check_out
            )));
        }

        let base_price = self
            .bounded(self.catalog.base_price(request.room_id))
            .await?
            .ok_or_else(|| BookingError::Validation(format!("unknown room {}", request.room_id)))?;

        // an inverted date range is rejected by Booking::new below
        let nights = nights(&request).max(0);
        let booking = Booking::new(
            request.id,
            actor.id,
            request.tenant_owner_id,
            request.room_id,
            request.check_in,
            request.check_out,
            request.guests,
            Amount::try_from(base_price.value() * Decimal::from(nights))?,
        )?;

        self.bounded(self.ledger.insert(booking.clone())).await?;
        info!(booking = booking.id, guest = actor.id, "booking created");
        Ok(booking)
    }

    /// Attaches a validated payment proof and advances the booking to
    /// `WaitingConfirmation`.
    pub async fn upload_payment_proof(
        &self,
        booking_id: u64,
        actor: Actor,
        upload: ProofUpload,
    ) -> Result<Booking> {
        let proof = validate_proof(&upload)?;
        self.apply(
            booking_id,
            actor,
            Action::UploadProof,
            Some(ProofUpdate::Attach(proof)),
        )
        .await
    }

    pub async fn cancel_booking(&self, booking_id: u64, actor: Actor) -> Result<Booking> {
        self.apply(booking_id, actor, Action::Cancel, None).await
    }

    /// Tenant approval: marks the proof verified and moves to `Processing`.
    pub async fn approve_booking(&self, booking_id: u64, actor: Actor) -> Result<Booking> {
        self.apply(
            booking_id,
            actor,
            Action::Approve,
            Some(ProofUpdate::Verify(Utc::now())),
        )
        .await
    }

    /// Tenant rejection: back to `WaitingPayment` with the proof cleared, so
    /// the guest has to upload a fresh one.
    pub async fn reject_booking(&self, booking_id: u64, actor: Actor) -> Result<Booking> {
        self.apply(booking_id, actor, Action::Reject, Some(ProofUpdate::Clear))
            .await
    }

    /// Dispatches a payment reminder. The booking's status is unchanged.
    pub async fn send_reminder(&self, booking_id: u64, actor: Actor) -> Result<Booking> {
        self.apply(booking_id, actor, Action::Remind, None).await
    }

    /// Closes out a finished stay. Invoked by the scheduler collaborator with
    /// the current date; refuses to run before checkout has passed.
    pub async fn complete_booking(
        &self,
        booking_id: u64,
        actor: Actor,
        as_of: NaiveDate,
    ) -> Result<Booking> {
        let booking = self
            .bounded(self.ledger.load(booking_id))
            .await?
            .ok_or(BookingError::NotFound)?;
        if as_of < booking.check_out {
            return Err(BookingError::Validation(format!(
                "checkout {} has not passed",
                booking.check_out
            )));
        }
        self.apply(booking_id, actor, Action::Complete, None).await
    }

    pub async fn guest_bookings(&self, guest_id: u64) -> Result<Vec<Booking>> {
        self.bounded(self.ledger.bookings_for_guest(guest_id)).await
    }

    pub async fn tenant_bookings(
        &self,
        tenant_id: u64,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>> {
        self.bounded(self.ledger.bookings_for_tenant(tenant_id, status))
            .await
    }

    /// Consumes the service and returns the final state of all bookings.
    pub async fn into_snapshots(self) -> Result<Vec<Booking>> {
        self.ledger.all_bookings().await
    }

    /// The shared transition protocol.
    ///
    /// Retries the whole load-decide-swap sequence on a lost race or a timed
    /// out ledger call; whichever of the two caused the final exhausted
    /// attempt picks the surfaced error (`Conflict` vs `Unavailable`).
    async fn apply(
        &self,
        booking_id: u64,
        actor: Actor,
        action: Action,
        proof_update: Option<ProofUpdate>,
    ) -> Result<Booking> {
        let mut timed_out = false;

        for _ in 0..MAX_TRANSITION_RETRIES {
            let booking = match self.bounded(self.ledger.load(booking_id)).await {
                Ok(Some(booking)) => booking,
                Ok(None) => return Err(BookingError::NotFound),
                Err(BookingError::Unavailable) => {
                    timed_out = true;
                    continue;
                }
                Err(e) => return Err(e),
            };

            authorize(&booking, actor)?;
            let next = decide(booking.status, actor.role, action).map_err(BookingError::Rejected)?;

            let swap = self
                .bounded(self.ledger.compare_and_swap(
                    booking_id,
                    booking.status,
                    next,
                    proof_update.clone(),
                ))
                .await;
            match swap {
                Ok(CasOutcome::Committed(updated)) => {
                    info!(
                        booking = booking_id,
                        prev = %booking.status,
                        next = %updated.status,
                        ?action,
                        "transition committed"
                    );
                    self.dispatch_effects(&updated, actor, action);
                    return Ok(updated);
                }
                Ok(CasOutcome::Conflict) => {
                    timed_out = false;
                    continue;
                }
                Ok(CasOutcome::NotFound) => return Err(BookingError::NotFound),
                Err(BookingError::Unavailable) => {
                    timed_out = true;
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        warn!(booking = booking_id, ?action, timed_out, "transition retries exhausted");
        if timed_out {
            Err(BookingError::Unavailable)
        } else {
            Err(BookingError::Conflict)
        }
    }

    /// Fires the post-commit notification for `action`, if any. Best-effort:
    /// the dispatch runs detached and a failure is logged, never propagated.
    fn dispatch_effects(&self, booking: &Booking, actor: Actor, action: Action) {
        let effect = match action {
            Action::UploadProof => Some((
                NotificationKind::ProofSubmitted,
                booking.tenant_owner_id,
            )),
            Action::Approve => Some((NotificationKind::BookingApproved, booking.guest_user_id)),
            Action::Reject => Some((NotificationKind::BookingRejected, booking.guest_user_id)),
            Action::Remind => Some((NotificationKind::PaymentReminder, booking.guest_user_id)),
            Action::Cancel => {
                let counterparty = match actor.role {
                    Role::Guest => booking.tenant_owner_id,
                    _ => booking.guest_user_id,
                };
                Some((NotificationKind::BookingCancelled, counterparty))
            }
            Action::Create | Action::Complete => None,
        };
        let Some((kind, recipient)) = effect else {
            return;
        };

        let notifier = Arc::clone(&self.notifier);
        let booking_id = booking.id;
        tokio::spawn(async move {
            if let Err(err) = notifier.notify(booking_id, kind, recipient).await {
                warn!(booking = booking_id, ?kind, %err, "notification dispatch failed");
            }
        });
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>> + Send) -> Result<T> {
        match timeout(self.ledger_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(BookingError::Unavailable),
        }
    }
}

fn authorize(booking: &Booking, actor: Actor) -> Result<()> {
    let expected = match actor.role {
        Role::Guest => Some(booking.guest_user_id),
        Role::Tenant => Some(booking.tenant_owner_id),
        Role::System => None,
    };
    match expected {
        Some(party) if party != actor.id => Err(BookingError::Unauthorized),
        _ => Ok(()),
    }
}

fn nights(request: &NewBooking) -> i64 {
    (request.check_out - request.check_in).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transition::RejectReason;
    use crate::infrastructure::in_memory::{InMemoryLedger, StaticCatalog};
    use crate::infrastructure::notify::NullNotifier;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn service() -> BookingService {
        BookingService::new(
            Box::new(InMemoryLedger::new()),
            Box::new(StaticCatalog::with_flat_price(
                Amount::new(dec!(100.0)).unwrap(),
            )),
            Arc::new(NullNotifier),
        )
    }

    fn request() -> NewBooking {
        NewBooking {
            id: 1,
            room_id: 7,
            tenant_owner_id: 20,
            check_in: date("2025-06-01"),
            check_out: date("2025-06-03"),
            guests: 2,
        }
    }

    fn proof_upload() -> ProofUpload {
        ProofUpload {
            file_url: "proofs/1.jpg".to_string(),
            size_bytes: 2048,
            content_type: "jpg".to_string(),
        }
    }

    const GUEST: Actor = Actor { id: 10, role: Role::Guest };
    const TENANT: Actor = Actor { id: 20, role: Role::Tenant };
    const SCHEDULER: Actor = Actor { id: 0, role: Role::System };

    #[tokio::test]
    async fn test_create_computes_total_from_nights() {
        let service = service();
        let booking = service.create_booking(GUEST, request()).await.unwrap();
        assert_eq!(booking.status, BookingStatus::WaitingPayment);
        // two nights at 100.0
        assert_eq!(booking.total_amount, Amount::new(dec!(200.0)).unwrap());
        assert_eq!(booking.guest_user_id, 10);
        assert_eq!(booking.tenant_owner_id, 20);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let service = service();
        service.create_booking(GUEST, request()).await.unwrap();
        let result = service.create_booking(GUEST, request()).await;
        assert!(matches!(result, Err(BookingError::Conflict)));
    }

    #[tokio::test]
    async fn test_upload_then_approve_verifies_proof() {
        let service = service();
        service.create_booking(GUEST, request()).await.unwrap();

        let booking = service
            .upload_payment_proof(1, GUEST, proof_upload())
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::WaitingConfirmation);
        let proof = booking.payment_proof.unwrap();
        assert_eq!(proof.file_url, "proofs/1.jpg");
        assert!(proof.verified_at.is_none());

        let booking = service.approve_booking(1, TENANT).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Processing);
        assert!(booking.payment_proof.unwrap().verified_at.is_some());
    }

    #[tokio::test]
    async fn test_reject_reverts_and_clears_proof() {
        let service = service();
        service.create_booking(GUEST, request()).await.unwrap();
        service
            .upload_payment_proof(1, GUEST, proof_upload())
            .await
            .unwrap();

        let booking = service.reject_booking(1, TENANT).await.unwrap();
        assert_eq!(booking.status, BookingStatus::WaitingPayment);
        assert!(booking.payment_proof.is_none());

        // the guest can cancel again now that no proof is pending
        let booking = service.cancel_booking(1, GUEST).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_guest_cannot_cancel_after_upload() {
        let service = service();
        service.create_booking(GUEST, request()).await.unwrap();
        service
            .upload_payment_proof(1, GUEST, proof_upload())
            .await
            .unwrap();

        let result = service.cancel_booking(1, GUEST).await;
        assert!(matches!(
            result,
            Err(BookingError::Rejected(RejectReason::InvalidStatus))
        ));

        let booking = service.cancel_booking(1, TENANT).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_unrelated_actor_is_unauthorized() {
        let service = service();
        service.create_booking(GUEST, request()).await.unwrap();

        let stranger = Actor::new(99, Role::Guest);
        let result = service.cancel_booking(1, stranger).await;
        assert!(matches!(result, Err(BookingError::Unauthorized)));

        let fake_tenant = Actor::new(99, Role::Tenant);
        let result = service.cancel_booking(1, fake_tenant).await;
        assert!(matches!(result, Err(BookingError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_reminder_is_idempotent_on_status() {
        let service = service();
        service.create_booking(GUEST, request()).await.unwrap();
        service
            .upload_payment_proof(1, GUEST, proof_upload())
            .await
            .unwrap();
        service.approve_booking(1, TENANT).await.unwrap();

        let first = service.send_reminder(1, TENANT).await.unwrap();
        let second = service.send_reminder(1, TENANT).await.unwrap();
        assert_eq!(first.status, BookingStatus::Processing);
        assert_eq!(second.status, BookingStatus::Processing);
    }

    #[tokio::test]
    async fn test_complete_requires_checkout_passed() {
        let service = service();
        service.create_booking(GUEST, request()).await.unwrap();
        service
            .upload_payment_proof(1, GUEST, proof_upload())
            .await
            .unwrap();
        service.approve_booking(1, TENANT).await.unwrap();

        let early = service
            .complete_booking(1, SCHEDULER, date("2025-06-02"))
            .await;
        assert!(matches!(early, Err(BookingError::Validation(_))));

        let booking = service
            .complete_booking(1, SCHEDULER, date("2025-06-03"))
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Completed);
    }

    #[tokio::test]
    async fn test_terminal_booking_refuses_all_actions() {
        let service = service();
        service.create_booking(GUEST, request()).await.unwrap();
        service.cancel_booking(1, GUEST).await.unwrap();

        let result = service.approve_booking(1, TENANT).await;
        assert!(matches!(
            result,
            Err(BookingError::Rejected(RejectReason::Terminal))
        ));
        let result = service.upload_payment_proof(1, GUEST, proof_upload()).await;
        assert!(matches!(
            result,
            Err(BookingError::Rejected(RejectReason::Terminal))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_unavailable_room() {
        let service = BookingService::new(
            Box::new(InMemoryLedger::new()),
            Box::new(StaticCatalog::new()),
            Arc::new(NullNotifier),
        );
        let result = service.create_booking(GUEST, request()).await;
        assert!(matches!(result, Err(BookingError::Validation(_))));
    }

    #[tokio::test]
    async fn test_tenant_bookings_filters_by_status() {
        let service = service();
        service.create_booking(GUEST, request()).await.unwrap();
        let mut second = request();
        second.id = 2;
        service.create_booking(GUEST, second).await.unwrap();
        service.cancel_booking(2, GUEST).await.unwrap();

        let waiting = service
            .tenant_bookings(20, Some(BookingStatus::WaitingPayment))
            .await
            .unwrap();
        assert_eq!(waiting.len(), 1);
        assert_eq!(waiting[0].id, 1);

        let all = service.tenant_bookings(20, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let mine = service.guest_bookings(10).await.unwrap();
        assert_eq!(mine.len(), 2);
    }
}
