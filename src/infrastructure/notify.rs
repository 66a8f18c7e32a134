use crate::domain::ports::{NotificationKind, Notifier};
use crate::error::Result;
use async_trait::async_trait;
use tracing::info;

/// Notification sink that records every delivery in the process log.
///
/// Stands in for the real delivery collaborator in the replay driver; the
/// core only requires that dispatch is asynchronous and best-effort.
#[derive(Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, booking_id: u64, kind: NotificationKind, recipient: u64) -> Result<()> {
        info!(booking = booking_id, ?kind, recipient, "notification dispatched");
        Ok(())
    }
}

/// Sink that drops every notification. Useful in tests.
#[derive(Default, Clone)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(
        &self,
        _booking_id: u64,
        _kind: NotificationKind,
        _recipient: u64,
    ) -> Result<()> {
        Ok(())
    }
}
