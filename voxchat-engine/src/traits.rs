use async_trait::async_trait;

use voxchat_api::decode::{ApiError, DecodedReply};
use voxchat_core::{Capture, Language};

/// One question against the assistant backend, already normalized into a
/// decoded reply. Implementations own request building, transport and
/// decoding; the client only sequences flows and the timeline.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn ask_text(&self, query: &str) -> Result<DecodedReply, ApiError>;

    async fn ask_voice(
        &self,
        capture: &Capture,
        language: Language,
    ) -> Result<DecodedReply, ApiError>;
}

/// Surface-to-user seam for transient error notices. Presentation (toast,
/// status line, log) is the host's business.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_error(&self, summary: &str, detail: &str);
}
