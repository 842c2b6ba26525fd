use serde_json::Value;

use crate::request::HttpResponse;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx reply; `message` is extracted best-effort from the body.
    #[error("{message}")]
    RequestFailed { status: u16, message: String },

    /// The request never produced a response.
    #[error("http transport failed: {0}")]
    Transport(String),
}

/// Where a reply's audio comes from. Inline bytes are materialized into a
/// local ref by the flow that owns the media store; decoding itself stays a
/// pure function of the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    Url(String),
    Inline { mime: String, bytes: Vec<u8> },
}

/// Normalized backend reply. When `audio` is present it takes display-kind
/// precedence over `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedReply {
    pub text: String,
    pub audio: Option<AudioSource>,
}

impl DecodedReply {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            audio: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.audio.is_none()
    }
}

/// Classifies a raw backend response.
///
/// The two endpoints are not contractually uniform: a reply can be binary
/// audio, JSON with an `answer` field, JSON with an embedded URL, or plain
/// text. The success path never fails on a malformed body; only a failure
/// status raises an error. An empty reply is valid.
pub fn decode_reply(resp: &HttpResponse) -> Result<DecodedReply, ApiError> {
    if !resp.is_success() {
        return Err(ApiError::RequestFailed {
            status: resp.status,
            message: failure_message(resp),
        });
    }

    if let Some(content_type) = resp.header("content-type") {
        if content_type.starts_with("audio/") {
            return Ok(DecodedReply {
                text: String::new(),
                audio: Some(AudioSource::Inline {
                    mime: content_type.to_string(),
                    bytes: resp.body.clone(),
                }),
            });
        }
    }

    let Ok(value) = serde_json::from_slice::<Value>(&resp.body) else {
        return Ok(DecodedReply::text_only(""));
    };

    // Text endpoint shape: an object carrying `answer`.
    if let Some(answer) = value.as_object().and_then(|o| o.get("answer")) {
        let text = match answer.as_str() {
            Some(s) => s.to_string(),
            None => answer.to_string(),
        };
        return Ok(DecodedReply::text_only(text));
    }

    // Anything else: stringify uniformly and sniff for an audio locator.
    let text = match &value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let audio = if text.starts_with("data:audio")
        || text.starts_with("http://")
        || text.starts_with("https://")
    {
        Some(AudioSource::Url(text.clone()))
    } else {
        value
            .as_object()
            .and_then(|o| {
                ["audio_url", "url", "audioUrl"]
                    .iter()
                    .find_map(|k| o.get(*k).and_then(Value::as_str))
            })
            .map(|u| AudioSource::Url(u.to_string()))
    };

    Ok(DecodedReply { text, audio })
}

fn failure_message(resp: &HttpResponse) -> String {
    serde_json::from_slice::<Value>(&resp.body)
        .ok()
        .as_ref()
        .and_then(|v| v.get("detail"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP error {}", resp.status))
}
