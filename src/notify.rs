use axum::async_trait;
use tracing::info;

/// Outbound notification capability. The digest job and password-reset flow
/// only see this trait; production wiring swaps the transport without
/// touching callers.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Default variant: logs the message instead of delivering it.
#[derive(Clone)]
pub struct ConsoleSender;

#[async_trait]
impl NotificationSender for ConsoleSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        info!(%to, %subject, body_len = body.len(), "notification (console sender)");
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Captures sent messages for assertions.
    #[derive(Default)]
    pub struct RecordingSender {
        pub sent: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl NotificationSender for RecordingSender {
        async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
            self.sent
                .lock()
                .expect("sender mutex")
                .push((to.to_string(), subject.to_string(), body.to_string()));
            Ok(())
        }
    }
}
