use std::sync::Arc;

use voxchat_core::Capture;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("no input device found")]
    NoInputDevice,

    #[error("audio capture backend failed: {0}")]
    Backend(String),

    #[error("audio worker startup timeout")]
    WorkerTimeout,

    #[error("recording stop timed out")]
    StopTimeout,

    #[error("internal channel error")]
    Channel,
}

/// Source of raw recorded audio. `start` begins accumulating, `stop`
/// finalizes everything accumulated since the start into one capture.
/// The buffer belongs to the backend until `stop` hands it off.
pub trait CaptureBackend: Send {
    fn start(&mut self) -> Result<(), CaptureError>;
    fn stop(&mut self) -> Result<Capture, CaptureError>;
}

impl CaptureBackend for Box<dyn CaptureBackend> {
    fn start(&mut self) -> Result<(), CaptureError> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<Capture, CaptureError> {
        (**self).stop()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
}

/// Push-to-talk state machine.
///
/// The UI layer maps every press-down/touch-start to `request_start` and
/// every press-up/pointer-leave/touch-end to `request_stop`. One physical
/// gesture can fire several of those (a leave and a release both arrive for
/// the same lift), so the state guard here, not the event wiring, is what
/// guarantees exactly one started and one finalized capture per gesture.
pub struct RecordingController<B> {
    backend: B,
    state: RecordingState,
    elapsed_seconds: u32,
    start_gate: Option<Arc<dyn Fn() -> bool + Send + Sync>>,
}

impl<B: CaptureBackend> RecordingController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: RecordingState::Idle,
            elapsed_seconds: 0,
            start_gate: None,
        }
    }

    /// Installs a probe consulted on every start request. While it returns
    /// true (a previous capture is still being turned into a reply), start
    /// requests are ignored.
    pub fn set_start_gate<F>(&mut self, gate: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.start_gate = Some(Arc::new(gate));
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecordingState::Recording
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    /// Advances the elapsed counter. Driven once per second by the owner
    /// while recording; a no-op otherwise.
    pub fn tick(&mut self) {
        if self.state == RecordingState::Recording {
            self.elapsed_seconds += 1;
        }
    }

    /// Semantic start trigger. Returns `Ok(true)` when a recording actually
    /// began, `Ok(false)` for an ignored (duplicate or gated) trigger. On a
    /// backend failure the controller stays `Idle`, never half-open.
    pub fn request_start(&mut self) -> Result<bool, CaptureError> {
        if self.state != RecordingState::Idle {
            return Ok(false);
        }
        if let Some(gate) = &self.start_gate {
            if gate() {
                log::debug!("start ignored: reply processing still pending");
                return Ok(false);
            }
        }

        self.backend.start()?;
        self.state = RecordingState::Recording;
        self.elapsed_seconds = 0;
        Ok(true)
    }

    /// Semantic stop trigger. Returns the finalized capture, or `Ok(None)`
    /// for an ignored (duplicate) trigger. The controller returns to `Idle`
    /// even when finalization fails.
    pub fn request_stop(&mut self) -> Result<Option<Capture>, CaptureError> {
        if self.state != RecordingState::Recording {
            return Ok(None);
        }

        self.state = RecordingState::Idle;
        self.elapsed_seconds = 0;

        let capture = self.backend.stop()?;
        Ok(Some(capture))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct FakeBackend {
        starts: u32,
        stops: u32,
        fail_start: bool,
        fail_stop: bool,
    }

    impl CaptureBackend for FakeBackend {
        fn start(&mut self) -> Result<(), CaptureError> {
            if self.fail_start {
                return Err(CaptureError::NoInputDevice);
            }
            self.starts += 1;
            Ok(())
        }

        fn stop(&mut self) -> Result<Capture, CaptureError> {
            if self.fail_stop {
                return Err(CaptureError::StopTimeout);
            }
            self.stops += 1;
            Ok(Capture {
                mime: "audio/wav".into(),
                bytes: vec![self.stops as u8],
            })
        }
    }

    #[test]
    fn one_capture_per_gesture_despite_overlapping_triggers() {
        let mut c = RecordingController::new(FakeBackend::default());

        // Press-down and touch-start both fire for one gesture.
        assert!(c.request_start().unwrap());
        assert!(!c.request_start().unwrap());
        assert!(c.is_recording());

        // Pointer-leave-while-down and release both fire on the way out.
        let first = c.request_stop().unwrap();
        let second = c.request_stop().unwrap();
        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(c.state(), RecordingState::Idle);

        assert_eq!(c.backend.starts, 1);
        assert_eq!(c.backend.stops, 1);
    }

    #[test]
    fn every_cycle_yields_exactly_one_capture() {
        let mut c = RecordingController::new(FakeBackend::default());
        let mut captures = 0;

        for _ in 0..5 {
            c.request_start().unwrap();
            c.request_start().unwrap();
            if c.request_stop().unwrap().is_some() {
                captures += 1;
            }
            c.request_stop().unwrap();
        }

        assert_eq!(captures, 5);
        assert_eq!(c.backend.starts, 5);
        assert_eq!(c.backend.stops, 5);
    }

    #[test]
    fn stop_without_start_is_a_no_op() {
        let mut c = RecordingController::new(FakeBackend::default());
        assert!(c.request_stop().unwrap().is_none());
        assert_eq!(c.backend.stops, 0);
    }

    #[test]
    fn gated_start_is_ignored() {
        let mut c = RecordingController::new(FakeBackend::default());
        let pending = Arc::new(AtomicBool::new(true));
        let probe = pending.clone();
        c.set_start_gate(move || probe.load(Ordering::SeqCst));

        assert!(!c.request_start().unwrap());
        assert_eq!(c.state(), RecordingState::Idle);

        pending.store(false, Ordering::SeqCst);
        assert!(c.request_start().unwrap());
    }

    #[test]
    fn failed_start_leaves_controller_idle() {
        let mut c = RecordingController::new(FakeBackend {
            fail_start: true,
            ..Default::default()
        });
        assert!(c.request_start().is_err());
        assert_eq!(c.state(), RecordingState::Idle);
        assert_eq!(c.elapsed_seconds(), 0);
    }

    #[test]
    fn failed_stop_still_returns_to_idle() {
        let mut c = RecordingController::new(FakeBackend {
            fail_stop: true,
            ..Default::default()
        });
        c.request_start().unwrap();
        assert!(c.request_stop().is_err());
        assert_eq!(c.state(), RecordingState::Idle);
    }

    #[test]
    fn elapsed_counts_only_while_recording_and_resets() {
        let mut c = RecordingController::new(FakeBackend::default());

        c.tick();
        assert_eq!(c.elapsed_seconds(), 0);

        c.request_start().unwrap();
        c.tick();
        c.tick();
        c.tick();
        assert_eq!(c.elapsed_seconds(), 3);

        c.request_stop().unwrap();
        assert_eq!(c.elapsed_seconds(), 0);

        // A fresh gesture starts counting from zero again.
        c.request_start().unwrap();
        c.tick();
        assert_eq!(c.elapsed_seconds(), 1);
    }
}
