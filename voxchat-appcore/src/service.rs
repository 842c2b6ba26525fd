use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use voxchat_audio::CaptureError;
use voxchat_core::{AppConfig, Capture, Language, Message};
use voxchat_engine::client::{ClientError, ConversationClient};
use voxchat_engine::traits::Notifier;

use crate::backend::HttpChatBackend;
use crate::config_store::ConfigStore;

#[cfg(feature = "audio-io")]
use voxchat_audio::{CaptureBackend, CpalCapture, RecordingController};

/// Maps capture failures to short, actionable wording. Details stay in the
/// logs.
pub fn user_facing_capture_error(e: &CaptureError) -> String {
    let raw = e.to_string().to_lowercase();

    if matches!(e, CaptureError::NoInputDevice) || raw.contains("no input device") {
        return "No microphone detected. Check your mic and pick a device in settings.".into();
    }

    if raw.contains("permission") || raw.contains("access") {
        return "Microphone access appears blocked. Check your system's microphone privacy settings.".into();
    }

    "Audio recording failed. Check logs for details.".into()
}

/// Application glue: one conversation client, one recording controller, one
/// config store. The host UI talks to this and renders `messages()`.
pub struct AppService {
    config_store: ConfigStore,
    config: Mutex<AppConfig>,
    client: Arc<ConversationClient>,

    #[cfg(feature = "audio-io")]
    recorder: Arc<tokio::sync::Mutex<Option<RecordingController<Box<dyn CaptureBackend>>>>>,
}

impl AppService {
    pub fn new(config_path: PathBuf, notifier: Arc<dyn Notifier>) -> Self {
        let config_store = ConfigStore::at_path(config_path);
        let config = config_store.load_or_default();

        let backend = Arc::new(HttpChatBackend::new(config.base_url.clone()));
        let client = Arc::new(ConversationClient::new(backend, notifier));

        Self {
            config_store,
            config: Mutex::new(config),
            client,
            #[cfg(feature = "audio-io")]
            recorder: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    pub fn client(&self) -> Arc<ConversationClient> {
        self.client.clone()
    }

    pub fn config(&self) -> AppConfig {
        self.config.lock().unwrap().clone()
    }

    pub fn language(&self) -> Language {
        self.config.lock().unwrap().language
    }

    /// Persists the selected spoken language for subsequent voice flows.
    pub fn set_language(&self, language: Language) -> anyhow::Result<()> {
        let cfg = {
            let mut guard = self.config.lock().unwrap();
            guard.language = language;
            guard.clone()
        };
        self.config_store.save(&cfg)
    }

    pub fn messages(&self) -> Vec<Message> {
        self.client.messages()
    }

    pub fn is_busy(&self) -> bool {
        self.client.is_busy()
    }

    pub async fn submit_text(&self, input: &str) -> Result<(), ClientError> {
        self.client.send_text(input).await
    }

    /// Runs the voice flow for an already-finalized capture with the
    /// configured language.
    pub async fn submit_capture(&self, capture: Capture) -> Result<(), ClientError> {
        self.client.send_voice(capture, self.language()).await
    }

    /// Clears the loading state; the in-flight request, if any, completes in
    /// the background and still appends its reply.
    pub fn cancel(&self) {
        self.client.cancel();
    }

    #[cfg(feature = "audio-io")]
    pub async fn start_recording(&self) -> Result<bool, CaptureError> {
        let mut recorder = self.recorder.lock().await;
        if recorder.is_none() {
            let device = self.config.lock().unwrap().microphone_device.clone();
            let backend: Box<dyn CaptureBackend> =
                Box::new(CpalCapture::open_named(device.as_deref())?);

            let mut controller = RecordingController::new(backend);
            // A pending text flow does not block the gesture; only a capture
            // still being turned into a reply does. The engine still
            // serializes the flows at hand-off time.
            let client = self.client.clone();
            controller.set_start_gate(move || {
                client.in_flight() == Some(voxchat_engine::FlowKind::Voice)
            });
            *recorder = Some(controller);
        }

        let started = recorder
            .as_mut()
            .ok_or(CaptureError::NoInputDevice)?
            .request_start()?;

        if started {
            self.spawn_ticker();
        }
        Ok(started)
    }

    /// Stops the gesture and hands the finalized capture to the voice flow
    /// asynchronously. A duplicate stop trigger is a no-op.
    #[cfg(feature = "audio-io")]
    pub async fn stop_recording(&self) -> Result<(), CaptureError> {
        let capture = {
            let mut recorder = self.recorder.lock().await;
            match recorder.as_mut() {
                Some(c) => c.request_stop()?,
                None => None,
            }
        };

        if let Some(capture) = capture {
            let client = self.client.clone();
            let language = self.language();
            tokio::spawn(async move {
                if let Err(e) = client.send_voice(capture, language).await {
                    // send_voice already notified for request failures.
                    log::warn!("voice flow did not run: {e}");
                }
            });
        }
        Ok(())
    }

    /// Best-effort: stop and discard the captured audio.
    #[cfg(feature = "audio-io")]
    pub async fn cancel_recording(&self) -> Result<(), CaptureError> {
        let mut recorder = self.recorder.lock().await;
        if let Some(c) = recorder.as_mut() {
            let _ = c.request_stop();
        }
        Ok(())
    }

    #[cfg(feature = "audio-io")]
    pub async fn is_recording(&self) -> bool {
        self.recorder
            .lock()
            .await
            .as_ref()
            .is_some_and(|c| c.is_recording())
    }

    #[cfg(feature = "audio-io")]
    pub async fn recording_elapsed(&self) -> u32 {
        self.recorder
            .lock()
            .await
            .as_ref()
            .map(|c| c.elapsed_seconds())
            .unwrap_or(0)
    }

    #[cfg(feature = "audio-io")]
    fn spawn_ticker(&self) {
        let recorder = self.recorder.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                let mut guard = recorder.lock().await;
                match guard.as_mut() {
                    Some(c) if c.is_recording() => c.tick(),
                    _ => break,
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::LogNotifier;
    use voxchat_core::{MessageKind, Sender};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn service_round_trips_config_and_runs_a_text_flow() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"answer":"rotate your crops"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let cfg = AppConfig {
            base_url: server.uri(),
            language: Language::Igbo,
            microphone_device: None,
        };
        ConfigStore::at_path(config_path.clone()).save(&cfg).unwrap();

        let svc = AppService::new(config_path, Arc::new(LogNotifier));
        assert_eq!(svc.language(), Language::Igbo);

        svc.submit_text("how do I keep soil healthy").await.unwrap();

        let messages = svc.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(
            messages[1].kind,
            MessageKind::Text {
                content: "rotate your crops".into()
            }
        );
        assert!(!svc.is_busy());
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let svc = AppService::new(dir.path().join("config.json"), Arc::new(LogNotifier));

        let err = svc.submit_text("   ").await.unwrap_err();
        assert!(matches!(err, ClientError::EmptyInput));
        assert!(svc.messages().is_empty());
    }

    #[tokio::test]
    async fn set_language_persists() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        let svc = AppService::new(config_path.clone(), Arc::new(LogNotifier));
        svc.set_language(Language::Hausa).unwrap();

        let reloaded = ConfigStore::at_path(config_path).load().unwrap();
        assert_eq!(reloaded.language, Language::Hausa);
    }

    #[test]
    fn capture_errors_map_to_actionable_wording() {
        let msg = user_facing_capture_error(&CaptureError::NoInputDevice);
        assert!(msg.contains("No microphone"));

        let msg =
            user_facing_capture_error(&CaptureError::Backend("Permission denied by OS".into()));
        assert!(msg.contains("access"));

        let msg = user_facing_capture_error(&CaptureError::StopTimeout);
        assert!(msg.contains("recording failed"));
    }
}
