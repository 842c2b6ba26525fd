use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};

use voxchat_api::decode::{ApiError, AudioSource};
use voxchat_core::{
    AudioRef, Capture, Language, MediaStore, Message, MessageTimeline, Sender, now_unix_ms,
};

use crate::traits::{ChatBackend, Notifier};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("message is empty")]
    EmptyInput,

    #[error("another exchange is already in flight")]
    Busy,

    #[error(transparent)]
    Request(#[from] ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Text,
    Voice,
}

const FLOW_NONE: u8 = 0;
const FLOW_TEXT: u8 = 1;
const FLOW_VOICE: u8 = 2;

/// Observable busy signal. Set for the whole duration of either flow; the
/// host uses it to disable concurrent submissions.
#[derive(Clone, Default)]
pub struct BusyFlag {
    flag: Arc<AtomicBool>,
}

impl BusyFlag {
    pub fn get(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn try_raise(&self) -> bool {
        self.flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Orchestrates the two request flows (text, voice) against the backend and
/// owns the merged timeline.
///
/// Only one flow of either kind runs at a time. `cancel` clears the busy
/// signal immediately but does not abort the transport; a late completion
/// still decodes and appends (the timeline resort puts it where its creation
/// timestamp says) and is prevented from clearing a newer flow's busy state
/// by a generation check.
pub struct ConversationClient {
    backend: Arc<dyn ChatBackend>,
    notifier: Arc<dyn Notifier>,
    media: Arc<MediaStore>,
    timeline: Mutex<MessageTimeline>,
    busy: BusyFlag,
    in_flight: Arc<AtomicU8>,
    generation: AtomicU64,
}

impl ConversationClient {
    pub fn new(backend: Arc<dyn ChatBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            notifier,
            media: Arc::new(MediaStore::new()),
            timeline: Mutex::new(MessageTimeline::new()),
            busy: BusyFlag::default(),
            in_flight: Arc::new(AtomicU8::new(FLOW_NONE)),
            generation: AtomicU64::new(0),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    /// Cloneable handle onto the busy signal for displays.
    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }

    /// Which flow, if any, is currently suspended on the backend. A pending
    /// voice flow is what gates new recording starts; a pending text flow
    /// does not block the gesture, only the hand-off.
    pub fn in_flight(&self) -> Option<FlowKind> {
        match self.in_flight.load(Ordering::SeqCst) {
            FLOW_TEXT => Some(FlowKind::Text),
            FLOW_VOICE => Some(FlowKind::Voice),
            _ => None,
        }
    }

    /// Local media registry backing `AudioRef::Local` refs (captures and
    /// inline assistant audio). Playback resolves bytes through this.
    pub fn media(&self) -> Arc<MediaStore> {
        self.media.clone()
    }

    /// Ordered snapshot of the conversation.
    pub fn messages(&self) -> Vec<Message> {
        self.timeline.lock().unwrap().messages().cloned().collect()
    }

    /// Clears the loading state without aborting the in-flight request.
    /// Its late completion will still append normally.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.in_flight.store(FLOW_NONE, Ordering::SeqCst);
        self.busy.clear();
    }

    /// Discards the conversation and releases every local media ref the
    /// messages held.
    pub fn clear(&self) {
        let drained = self.timeline.lock().unwrap().clear();
        for message in &drained {
            if let Some(audio) = message.audio_ref() {
                self.media.release(audio);
            }
        }
    }

    /// Text flow: optimistic user message, then the `/ask` exchange.
    /// Whitespace-only input is rejected before anything is appended or sent.
    /// On failure the optimistic message remains and nothing else is
    /// appended.
    pub async fn send_text(&self, input: &str) -> Result<(), ClientError> {
        let content = input.trim();
        if content.is_empty() {
            return Err(ClientError::EmptyInput);
        }

        let token = self.begin_flow(FlowKind::Text)?;
        self.append(Message::text(Sender::User, content, now_unix_ms()));

        let result = self.backend.ask_text(content).await;
        self.finish_flow(token);

        match result {
            Ok(reply) => {
                self.append(Message::text(Sender::Assistant, reply.text, now_unix_ms()));
                Ok(())
            }
            Err(e) => {
                self.notifier
                    .notify_error("Failed to send message", &e.to_string())
                    .await;
                Err(e.into())
            }
        }
    }

    /// Voice flow: the finalized capture becomes an optimistic user voice
    /// message, then the `/speak-ai` exchange. A decoded reply carrying
    /// audio becomes an assistant voice message (audio wins over any
    /// accompanying text); otherwise the decoded text is appended.
    pub async fn send_voice(
        &self,
        capture: Capture,
        language: Language,
    ) -> Result<(), ClientError> {
        let token = self.begin_flow(FlowKind::Voice)?;

        let user_audio = self
            .media
            .insert(capture.mime.clone(), capture.bytes.clone());
        self.append(Message::voice(Sender::User, user_audio, now_unix_ms()));

        let result = self.backend.ask_voice(&capture, language).await;
        self.finish_flow(token);

        match result {
            Ok(reply) => {
                let ts = now_unix_ms();
                match reply.audio {
                    Some(AudioSource::Inline { mime, bytes }) => {
                        let audio = self.media.insert(mime, bytes);
                        self.append(Message::voice(Sender::Assistant, audio, ts));
                    }
                    Some(AudioSource::Url(url)) => {
                        self.append(Message::voice(Sender::Assistant, AudioRef::Remote(url), ts));
                    }
                    None => {
                        self.append(Message::text(Sender::Assistant, reply.text, ts));
                    }
                }
                Ok(())
            }
            Err(e) => {
                self.notifier
                    .notify_error("Failed to send voice message", &e.to_string())
                    .await;
                Err(e.into())
            }
        }
    }

    fn append(&self, message: Message) {
        self.timeline.lock().unwrap().append(message);
    }

    fn begin_flow(&self, kind: FlowKind) -> Result<u64, ClientError> {
        if !self.busy.try_raise() {
            return Err(ClientError::Busy);
        }
        let code = match kind {
            FlowKind::Text => FLOW_TEXT,
            FlowKind::Voice => FLOW_VOICE,
        };
        self.in_flight.store(code, Ordering::SeqCst);
        Ok(self.generation.load(Ordering::SeqCst))
    }

    fn finish_flow(&self, token: u64) {
        // A cancelled flow's completion must not stomp a newer flow's busy
        // state; only the generation that raised the flag may clear it.
        if self.generation.load(Ordering::SeqCst) == token {
            self.in_flight.store(FLOW_NONE, Ordering::SeqCst);
            self.busy.clear();
        }
    }
}
