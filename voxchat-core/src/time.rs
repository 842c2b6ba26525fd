use std::time::{SystemTime, UNIX_EPOCH};

/// Creation timestamp for new messages, unix milliseconds.
pub fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
