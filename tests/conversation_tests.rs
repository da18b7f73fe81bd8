//! End-to-end conversation tests
//!
//! These drive a `ChatSession` against in-process transports and check the
//! resulting conversation log.

use async_trait::async_trait;
use hookchat::audio::{CaptureSource, CaptureStream, RecordingController};
use hookchat::chat::{ChatSession, ClientConfig, ReplySource, DEMO_REPLY};
use hookchat::messages::{Artifact, Role, PENDING_CONTENT};
use hookchat::settings::{MemoryStore, Settings, WEBHOOK_URL_KEY};
use hookchat::webhook::{Payload, PayloadKind, RawResponse, Transport};
use hookchat::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Answers every post with a fixed response and remembers what it was sent
struct ScriptedTransport {
    response: RawResponse,
    sent: Mutex<Vec<Payload>>,
}

impl ScriptedTransport {
    fn new(content_type: Option<&str>, body: &str) -> Arc<Self> {
        Arc::new(Self {
            response: RawResponse::new(200, content_type, body),
            sent: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, _url: &str, payload: Payload) -> Result<RawResponse> {
        self.sent.lock().push(payload);
        Ok(self.response.clone())
    }
}

/// Holds each request until the test releases the reply for its text
#[derive(Default)]
struct GatedTransport {
    gates: Mutex<HashMap<String, oneshot::Receiver<String>>>,
}

impl GatedTransport {
    fn gate(&self, text: &str) -> oneshot::Sender<String> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(text.to_string(), rx);
        tx
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn post(&self, _url: &str, payload: Payload) -> Result<RawResponse> {
        let gate = self.gates.lock().remove(&payload.text);
        let reply = match gate {
            Some(rx) => rx.await.unwrap_or_default(),
            None => String::new(),
        };
        let body = format!(r#"{{"reply":"{}"}}"#, reply);
        Ok(RawResponse::new(200, Some("application/json"), body))
    }
}

struct SilentMic;

struct SilentStream;

impl CaptureStream for SilentStream {
    fn sample_rate(&self) -> u32 {
        48000
    }

    fn finish(self: Box<Self>) -> Vec<f32> {
        Vec::new()
    }
}

impl CaptureSource for SilentMic {
    fn open(&mut self) -> Result<Box<dyn CaptureStream>> {
        Ok(Box::new(SilentStream))
    }
}

fn session(url: &str, transport: Arc<dyn Transport>) -> ChatSession {
    let store = MemoryStore::new().with_entry(WEBHOOK_URL_KEY, url);
    ChatSession::new(&ClientConfig::default(), Settings::load(Box::new(store)), transport)
}

#[tokio::test]
async fn test_no_webhook_gets_demo_reply() {
    let mut session = session("", ScriptedTransport::new(None, "unused"));
    session.set_text("Book a room for Tuesday");

    let result = session.send().await.unwrap();
    assert_eq!(result.source, ReplySource::Unconfigured);

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "Book a room for Tuesday");
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, DEMO_REPLY);
}

#[tokio::test]
async fn test_json_reply_resolves_placeholder() {
    let transport = ScriptedTransport::new(
        Some("application/json"),
        r#"{"reply":"Room 4 is yours on Tuesday"}"#,
    );
    let mut session = session("https://hooks.example.com/chat", transport.clone());
    session.set_text("Book a room for Tuesday");

    session.send().await.unwrap();

    let last = session.messages().pop().unwrap();
    assert_eq!(last.content, "Room 4 is yours on Tuesday");
    assert!(!last.is_pending());

    let sent = transport.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, PayloadKind::Text);
    assert_eq!(sent[0].chat_id, session.session_id());
    assert_eq!(sent[0].metadata.chat_id, session.session_id());
}

#[tokio::test]
async fn test_html_iframe_reply() {
    let transport = ScriptedTransport::new(
        Some("text/html; charset=utf-8"),
        r#"<iframe srcdoc="&lt;p&gt;Room booked&lt;/p&gt;" sandbox></iframe>"#,
    );
    let mut session = session("https://hooks.example.com/chat", transport);
    session.set_text("Book it");

    let result = session.send().await.unwrap();
    assert_eq!(result.content, "Room booked");
}

#[tokio::test]
async fn test_overlapping_turns_resolve_out_of_order() {
    let transport = Arc::new(GatedTransport::default());
    let first_gate = transport.gate("first");
    let second_gate = transport.gate("second");
    let mut session = session("https://hooks.example.com/chat", transport.clone());

    session.set_text("first");
    let first = session.spawn_send().unwrap();
    session.set_text("second");
    let second = session.spawn_send().unwrap();

    let store = session.store();
    assert_eq!(store.len(), 4);
    assert_eq!(store.pending_count(), 2);

    // The later turn answers first
    second_gate.send("reply to second".to_string()).unwrap();
    let second_result = second.await.unwrap();
    assert!(second_result.applied);

    let messages = session.messages();
    assert_eq!(messages[1].content, PENDING_CONTENT);
    assert_eq!(messages[3].content, "reply to second");

    first_gate.send("reply to first".to_string()).unwrap();
    first.await.unwrap();

    let messages = session.messages();
    let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(
        contents,
        vec!["first", "reply to first", "second", "reply to second"]
    );
    assert_eq!(store.pending_count(), 0);
}

#[tokio::test]
async fn test_draft_is_free_while_reply_is_pending() {
    let transport = Arc::new(GatedTransport::default());
    let gate = transport.gate("slow");
    let mut session = session("https://hooks.example.com/chat", transport.clone());

    session.set_text("slow");
    let pending = session.spawn_send().unwrap();

    assert!(session.draft().is_empty());
    session.set_text("next thought");
    assert_eq!(session.draft().text, "next thought");

    gate.send("done".to_string()).unwrap();
    pending.await.unwrap();
    assert_eq!(session.draft().text, "next thought");
}

#[tokio::test]
async fn test_empty_recording_is_still_sent() {
    let transport = ScriptedTransport::new(Some("text/plain"), "Got your voice note");
    let mut session = session("https://hooks.example.com/chat", transport.clone());
    let mut recorder = RecordingController::new(Box::new(SilentMic));

    recorder.start().unwrap();
    let audio = recorder.stop().unwrap().expect("stop while active yields an artifact");
    assert!(audio.is_empty());
    assert!(!recorder.is_recording());

    session.attach_audio(audio);
    let result = session.send().await.unwrap();
    assert_eq!(result.content, "Got your voice note");

    let messages = session.messages();
    assert_eq!(messages[0].content, "[voice message]");

    let sent = transport.sent.lock();
    assert_eq!(sent[0].kind, PayloadKind::Audio);
    assert_eq!(sent[0].text, "");
    assert_eq!(sent[0].audio.as_ref().map(Artifact::len), Some(0));
}

#[tokio::test]
async fn test_image_with_caption() {
    let transport = ScriptedTransport::new(None, "\"Nice photo\"");
    let mut session = session("https://hooks.example.com/chat", transport.clone());

    session.attach_image(Artifact::new(vec![1, 2, 3], "image/png", "room.png"));
    session.set_text("Is this room free?");
    let result = session.send().await.unwrap();

    assert_eq!(result.content, "Nice photo");
    let sent = transport.sent.lock();
    assert_eq!(sent[0].kind, PayloadKind::Image);
    assert_eq!(sent[0].text, "Is this room free?");
    assert!(sent[0].image.is_some());
}

#[tokio::test]
async fn test_unknown_json_shape_is_preserved() {
    let transport =
        ScriptedTransport::new(Some("application/json"), r#"{"status":"queued","id":7}"#);
    let mut session = session("https://hooks.example.com/chat", transport);
    session.set_text("hello");

    let result = session.send().await.unwrap();
    assert!(result.content.starts_with('\n'));
    let value: serde_json::Value = serde_json::from_str(result.content.trim()).unwrap();
    assert_eq!(value, serde_json::json!({"status": "queued", "id": 7}));
}
