use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaId(pub Uuid);

impl MediaId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MediaId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn is_user(self) -> bool {
        self == Sender::User
    }
}

/// Opaque locator resolvable to playable audio bytes.
///
/// `Remote` is a URL (or `data:audio` URI) handed out by the backend;
/// `Local` points into the process-local [`crate::MediaStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioRef {
    Remote(String),
    Local(MediaId),
}

impl AudioRef {
    pub fn is_local(&self) -> bool {
        matches!(self, AudioRef::Local(_))
    }
}

/// A finished, finalized block of recorded audio ready to be sent.
#[derive(Clone, PartialEq, Eq)]
pub struct Capture {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Capture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capture")
            .field("mime", &self.mime)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Text { content: String },
    Voice { audio: AudioRef },
}

/// One entry of the conversation.
///
/// Messages are immutable after creation; render code discriminates on
/// `kind`, never on field presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub timestamp_ms: i64,
    pub kind: MessageKind,
}

impl Message {
    pub fn text(sender: Sender, content: impl Into<String>, timestamp_ms: i64) -> Self {
        Self {
            id: MessageId::new(),
            sender,
            timestamp_ms,
            kind: MessageKind::Text {
                content: content.into(),
            },
        }
    }

    pub fn voice(sender: Sender, audio: AudioRef, timestamp_ms: i64) -> Self {
        Self {
            id: MessageId::new(),
            sender,
            timestamp_ms,
            kind: MessageKind::Voice { audio },
        }
    }

    pub fn audio_ref(&self) -> Option<&AudioRef> {
        match &self.kind {
            MessageKind::Voice { audio } => Some(audio),
            MessageKind::Text { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_ids_are_unique() {
        let a = Message::text(Sender::User, "a", 1);
        let b = Message::text(Sender::User, "a", 1);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn audio_ref_only_on_voice() {
        let t = Message::text(Sender::Assistant, "hi", 1);
        assert!(t.audio_ref().is_none());

        let v = Message::voice(Sender::Assistant, AudioRef::Remote("https://x/a.wav".into()), 2);
        assert_eq!(
            v.audio_ref(),
            Some(&AudioRef::Remote("https://x/a.wav".into()))
        );
    }
}
