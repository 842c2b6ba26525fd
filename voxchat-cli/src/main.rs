use std::io::{BufRead, Write};
use std::sync::Arc;

use voxchat_api::decode::{ApiError, AudioSource, DecodedReply};
use voxchat_appcore::HttpChatBackend;
use voxchat_core::{AudioRef, Capture, DEFAULT_BASE_URL, Language, MessageKind, Sender};
use voxchat_engine::client::ConversationClient;
use voxchat_engine::traits::{ChatBackend, Notifier};

struct EchoBackend;

#[async_trait::async_trait]
impl ChatBackend for EchoBackend {
    async fn ask_text(&self, query: &str) -> Result<DecodedReply, ApiError> {
        Ok(DecodedReply::text_only(format!("(mock) you asked: {query}")))
    }

    async fn ask_voice(
        &self,
        capture: &Capture,
        language: Language,
    ) -> Result<DecodedReply, ApiError> {
        Ok(DecodedReply {
            text: format!("(mock) {} bytes of {} audio", capture.bytes.len(), language),
            audio: Some(AudioSource::Inline {
                mime: capture.mime.clone(),
                bytes: capture.bytes.clone(),
            }),
        })
    }
}

struct PrintNotifier;

#[async_trait::async_trait]
impl Notifier for PrintNotifier {
    async fn notify_error(&self, summary: &str, detail: &str) {
        eprintln!("! {summary}: {detail}");
    }
}

fn render(client: &ConversationClient) {
    for message in client.messages() {
        let who = match message.sender {
            Sender::User => "you",
            Sender::Assistant => "assistant",
        };
        match &message.kind {
            MessageKind::Text { content } => println!("[{who}] {content}"),
            MessageKind::Voice { audio } => match audio {
                AudioRef::Remote(url) => println!("[{who}] (voice) {url}"),
                AudioRef::Local(_) => {
                    let size = client
                        .media()
                        .resolve(audio)
                        .map(|b| b.bytes.len())
                        .unwrap_or(0);
                    println!("[{who}] (voice, {size} bytes)");
                }
            },
        }
    }
}

fn mime_for(path: &str) -> &'static str {
    if path.ends_with(".webm") {
        "audio/webm"
    } else {
        "audio/wav"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Demo REPL: plain lines go through the text flow, `:voice <file>` sends
    // a prerecorded capture through the voice flow. Set VOXCHAT_MOCK=1 to
    // skip network calls entirely.
    let base_url =
        std::env::var("VOXCHAT_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let mut language: Language = std::env::var("VOXCHAT_LANGUAGE")
        .unwrap_or_else(|_| "en".into())
        .parse()?;

    let backend: Arc<dyn ChatBackend> = if std::env::var("VOXCHAT_MOCK").is_ok() {
        Arc::new(EchoBackend)
    } else {
        Arc::new(HttpChatBackend::new(base_url.clone()))
    };

    let client = Arc::new(ConversationClient::new(backend, Arc::new(PrintNotifier)));

    println!("voxchat ({base_url}, language {language})");
    println!("commands: :voice <file>  :lang <en|ig|yo|ha>  :cancel  :clear  :quit");

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        if line == ":quit" {
            break;
        } else if line == ":cancel" {
            client.cancel();
            println!("cancelled");
        } else if line == ":clear" {
            client.clear();
            println!("cleared");
        } else if let Some(code) = line.strip_prefix(":lang ") {
            match code.parse::<Language>() {
                Ok(lang) => {
                    language = lang;
                    println!("language set to {language}");
                }
                Err(e) => eprintln!("! {e}"),
            }
        } else if let Some(path) = line.strip_prefix(":voice ") {
            let path = path.trim();
            match std::fs::read(path) {
                Ok(bytes) => {
                    let capture = Capture {
                        mime: mime_for(path).into(),
                        bytes,
                    };
                    if client.send_voice(capture, language).await.is_ok() {
                        render(&client);
                    }
                }
                Err(e) => eprintln!("! read {path}: {e}"),
            }
        } else if !line.is_empty() {
            if client.send_text(line).await.is_ok() {
                render(&client);
            }
        }
    }

    Ok(())
}
