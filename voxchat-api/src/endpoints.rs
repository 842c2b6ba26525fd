use crate::request::{Body, HttpRequest};
use voxchat_core::{Capture, Language};

pub const TEXT_ASK_PATH: &str = "/ask";
pub const VOICE_ASK_PATH: &str = "/speak-ai";

// The backend keys the upload on this filename regardless of the actual
// container the capture uses.
pub const RECORDING_FILENAME: &str = "recording.webm";

/// Form-encoded text question for the `/ask` endpoint.
pub fn build_text_ask_request(base_url: &str, query: &str) -> HttpRequest {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("query", query)
        .finish();

    HttpRequest {
        method: "POST".into(),
        url: join_url(base_url, TEXT_ASK_PATH),
        headers: vec![(
            "Content-Type".into(),
            "application/x-www-form-urlencoded".into(),
        )],
        body: Body::Form(body),
    }
}

/// Multipart voice question for the `/speak-ai` endpoint: the finalized
/// capture plus the selected spoken-language code.
pub fn build_voice_ask_request(
    base_url: &str,
    capture: &Capture,
    language: Language,
) -> HttpRequest {
    let boundary = format!("Boundary-{}", uuid::Uuid::new_v4());

    let mut body: Vec<u8> = Vec::new();
    append_file(
        &mut body,
        &boundary,
        "audio_file",
        RECORDING_FILENAME,
        &capture.mime,
        &capture.bytes,
    );
    append_field(&mut body, &boundary, "language", language.code());
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    HttpRequest {
        method: "POST".into(),
        url: join_url(base_url, VOICE_ASK_PATH),
        headers: vec![(
            "Content-Type".into(),
            format!("multipart/form-data; boundary={}", boundary),
        )],
        body: Body::MultipartFormData {
            boundary,
            bytes: body,
        },
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

fn append_field(body: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
    );
    body.extend_from_slice(value.as_bytes());
    body.extend_from_slice(b"\r\n");
}

fn append_file(
    body: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    filename: &str,
    mime_type: &str,
    bytes: &[u8],
) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            name, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
}
