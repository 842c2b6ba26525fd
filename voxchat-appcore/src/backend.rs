use async_trait::async_trait;

use voxchat_api::decode::{ApiError, DecodedReply, decode_reply};
use voxchat_api::endpoints::{build_text_ask_request, build_voice_ask_request};
use voxchat_api::runtime;
use voxchat_core::{Capture, Language};
use voxchat_engine::traits::ChatBackend;

/// The real backend: builds the wire request, executes it, and runs the
/// reply through the decoder.
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    base_url: String,
}

impl HttpChatBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn ask_text(&self, query: &str) -> Result<DecodedReply, ApiError> {
        let req = build_text_ask_request(&self.base_url, query);
        log::debug!("text ask: {req:?}");
        let resp = runtime::execute(&req)
            .await
            .map_err(|e| ApiError::Transport(format!("{e:#}")))?;
        decode_reply(&resp)
    }

    async fn ask_voice(
        &self,
        capture: &Capture,
        language: Language,
    ) -> Result<DecodedReply, ApiError> {
        let req = build_voice_ask_request(&self.base_url, capture, language);
        log::debug!("voice ask ({language}): {req:?}");
        let resp = runtime::execute(&req)
            .await
            .map_err(|e| ApiError::Transport(format!("{e:#}")))?;
        decode_reply(&resp)
    }
}
