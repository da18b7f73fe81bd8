//! Builds the multipart payload sent to the webhook for each turn

use crate::messages::{Artifact, Draft};
use crate::Result;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    Text,
    Image,
    Audio,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::Text => "text",
            PayloadKind::Image => "image",
            PayloadKind::Audio => "audio",
        }
    }
}

/// JSON blob sent in the `metadata` field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadMetadata {
    pub ts: DateTime<Utc>,
    pub client: String,
    #[serde(rename = "chatId")]
    pub chat_id: String,
}

/// Wire-level request body for one turn
#[derive(Debug, Clone)]
pub struct Payload {
    pub kind: PayloadKind,
    pub text: String,
    pub source: String,
    pub chat_id: String,
    pub metadata: PayloadMetadata,
    pub image: Option<Artifact>,
    pub audio: Option<Artifact>,
}

impl Payload {
    pub fn metadata_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.metadata)?)
    }

    /// The plain-text form fields, in the order they are sent
    pub fn text_fields(&self) -> Result<Vec<(&'static str, String)>> {
        Ok(vec![
            ("type", self.kind.as_str().to_string()),
            ("text", self.text.clone()),
            ("source", self.source.clone()),
            ("chatId", self.chat_id.clone()),
            ("metadata", self.metadata_json()?),
        ])
    }

    /// Total size of attached binary parts
    pub fn attachment_bytes(&self) -> usize {
        self.image.as_ref().map_or(0, Artifact::len) + self.audio.as_ref().map_or(0, Artifact::len)
    }

    pub fn into_form(self) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in self.text_fields()? {
            form = form.text(name, value);
        }

        if let Some(image) = self.image {
            form = form.part("image", artifact_part(image)?);
        }
        if let Some(audio) = self.audio {
            form = form.part("audio", artifact_part(audio)?);
        }

        Ok(form)
    }
}

fn artifact_part(artifact: Artifact) -> Result<Part> {
    Ok(Part::bytes(artifact.bytes)
        .file_name(artifact.file_name)
        .mime_str(&artifact.mime_type)?)
}

/// Turns drafts into payloads, stamping them with this client's tags
#[derive(Debug, Clone)]
pub struct RequestComposer {
    source: String,
    client: String,
}

impl RequestComposer {
    pub fn new(source: impl Into<String>, client: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            client: client.into(),
        }
    }

    /// Compose a payload. Audio wins over image when choosing `type`.
    pub fn compose(
        &self,
        text: impl Into<String>,
        image: Option<Artifact>,
        audio: Option<Artifact>,
        session_id: &str,
    ) -> Payload {
        let kind = if audio.is_some() {
            PayloadKind::Audio
        } else if image.is_some() {
            PayloadKind::Image
        } else {
            PayloadKind::Text
        };

        Payload {
            kind,
            text: text.into(),
            source: self.source.clone(),
            chat_id: session_id.to_string(),
            metadata: PayloadMetadata {
                ts: Utc::now(),
                client: self.client.clone(),
                chat_id: session_id.to_string(),
            },
            image,
            audio,
        }
    }

    pub fn compose_draft(&self, draft: Draft, session_id: &str) -> Payload {
        self.compose(draft.text, draft.image, draft.audio, session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn composer() -> RequestComposer {
        RequestComposer::new("hookchat", "hookchat-test")
    }

    fn wav() -> Artifact {
        Artifact::new(vec![0u8; 8], "audio/wav", "recording.wav")
    }

    fn png() -> Artifact {
        Artifact::new(vec![137, 80, 78, 71], "image/png", "photo.png")
    }

    #[test]
    fn test_kind_precedence() {
        let c = composer();
        assert_eq!(c.compose("hi", None, None, "s").kind, PayloadKind::Text);
        assert_eq!(c.compose("", Some(png()), None, "s").kind, PayloadKind::Image);
        assert_eq!(c.compose("", None, Some(wav()), "s").kind, PayloadKind::Audio);
        assert_eq!(c.compose("", Some(png()), Some(wav()), "s").kind, PayloadKind::Audio);
    }

    #[test]
    fn test_text_always_present() {
        let payload = composer().compose("", Some(png()), None, "chat-1");
        let fields = payload.text_fields().unwrap();
        let text = fields.iter().find(|(name, _)| *name == "text").unwrap();
        assert_eq!(text.1, "");
    }

    #[test]
    fn test_session_id_top_level_and_in_metadata() {
        let payload = composer().compose("hello", None, None, "chat-42");
        assert_eq!(payload.chat_id, "chat-42");

        let metadata: Value = serde_json::from_str(&payload.metadata_json().unwrap()).unwrap();
        assert_eq!(metadata["chatId"], "chat-42");
        assert_eq!(metadata["client"], "hookchat-test");
        assert!(metadata["ts"].as_str().is_some());
    }

    #[test]
    fn test_field_names() {
        let payload = composer().compose("hello", None, None, "chat-1");
        let names: Vec<_> = payload
            .text_fields()
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["type", "text", "source", "chatId", "metadata"]);
    }

    #[test]
    fn test_empty_audio_is_not_rejected() {
        let empty = Artifact::new(Vec::new(), "audio/wav", "recording.wav");
        let payload = composer().compose("", None, Some(empty), "chat-1");
        assert_eq!(payload.kind, PayloadKind::Audio);
        assert_eq!(payload.attachment_bytes(), 0);
        assert!(payload.into_form().is_ok());
    }

    #[test]
    fn test_compose_draft() {
        let draft = Draft {
            text: "look".to_string(),
            image: Some(png()),
            audio: None,
        };
        let payload = composer().compose_draft(draft, "chat-1");
        assert_eq!(payload.kind, PayloadKind::Image);
        assert_eq!(payload.text, "look");
        assert_eq!(payload.attachment_bytes(), 4);
    }
}
