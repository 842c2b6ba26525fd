#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("audio failed to start: {0}")]
    Start(String),

    #[error("audio failed to decode: {0}")]
    Decode(String),
}

/// The one underlying audio handle a playback session drives. Pausing and
/// halting are synchronous and cannot fail; only starting can.
pub trait PlaybackSink {
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);

    /// Stops any in-progress playback and releases the handle. Must be safe
    /// to call at any time, including mid-load.
    fn halt(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Ended,
    Error,
}

/// Per-voice-message playback state machine.
///
/// Owns exclusive access to its sink; dropping the session halts playback on
/// every exit path. Duration is unknown until the sink's metadata resolves
/// and a later, more authoritative report may overwrite it.
pub struct PlaybackSession<S: PlaybackSink> {
    sink: S,
    state: PlaybackState,
    position_seconds: f64,
    duration_seconds: Option<f64>,
}

impl<S: PlaybackSink> PlaybackSession<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: PlaybackState::Idle,
            position_seconds: 0.0,
            duration_seconds: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn position_seconds(&self) -> f64 {
        self.position_seconds
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration_seconds
    }

    /// Playback fraction in [0, 1]; zero until the duration is known.
    pub fn progress(&self) -> f64 {
        match self.duration_seconds {
            Some(d) if d > 0.0 => (self.position_seconds / d).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// Play/pause entry point. From `Playing` this pauses (synchronous,
    /// cannot fail). From `Idle`, `Paused` or `Ended` it requests playback;
    /// `Ended` restarts from position zero. From `Error` it is a no-op.
    pub fn toggle(&mut self) {
        match self.state {
            PlaybackState::Playing => {
                self.sink.pause();
                self.state = PlaybackState::Paused;
            }
            PlaybackState::Idle | PlaybackState::Paused | PlaybackState::Ended => {
                if self.state == PlaybackState::Ended {
                    self.position_seconds = 0.0;
                }
                match self.sink.play() {
                    Ok(()) => self.state = PlaybackState::Playing,
                    Err(e) => {
                        log::warn!("playback failed to start: {e}");
                        self.state = PlaybackState::Error;
                    }
                }
            }
            PlaybackState::Error => {}
        }
    }

    /// Position report from the sink; tracked only while playing.
    pub fn on_position(&mut self, seconds: f64) {
        if self.state == PlaybackState::Playing && seconds.is_finite() && seconds >= 0.0 {
            self.position_seconds = seconds;
        }
    }

    /// Duration report from the sink. Later reports win: metadata often
    /// resolves with an estimate first and the exact value afterwards.
    pub fn on_duration(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            self.duration_seconds = Some(seconds);
        }
    }

    pub fn on_ended(&mut self) {
        self.state = PlaybackState::Ended;
    }

    /// Sink fault; reachable from any state.
    pub fn on_error(&mut self) {
        self.state = PlaybackState::Error;
    }
}

impl<S: PlaybackSink> Drop for PlaybackSession<S> {
    fn drop(&mut self) {
        self.sink.halt();
    }
}

/// Format seconds as m:ss for display next to a voice message.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
