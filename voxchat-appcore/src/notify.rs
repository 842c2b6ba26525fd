use async_trait::async_trait;

use voxchat_engine::traits::Notifier;

/// Notifier that routes transient error notices into the log. Hosts with a
/// real surface (toast, status line) supply their own implementation.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_error(&self, summary: &str, detail: &str) {
        log::warn!("{summary}: {detail}");
    }
}
