use crate::error::Result;
use async_trait::async_trait;

/// Best-effort outbound notification. Delivery failures are the caller's
/// to swallow; they never affect schedule state.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: &str, message: &str) -> Result<()>;
}

/// Default notifier: writes the message to the log. Stands in for SMS,
/// email, or push delivery.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, recipient: &str, message: &str) -> Result<()> {
        tracing::info!(recipient = %recipient, message = %message, "Notification");
        Ok(())
    }
}
