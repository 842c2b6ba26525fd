pub mod controller;
pub mod player;
pub mod resample;
pub mod wav;

// Microphone capture is implemented behind the `audio-io` feature.
#[cfg(feature = "audio-io")]
pub mod capture;

pub use controller::{CaptureBackend, CaptureError, RecordingController, RecordingState};
pub use player::{PlaybackError, PlaybackSession, PlaybackSink, PlaybackState};

#[cfg(feature = "audio-io")]
pub use capture::CpalCapture;
