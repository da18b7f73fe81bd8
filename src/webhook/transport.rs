//! HTTP transport for webhook turns

use super::composer::Payload;
use crate::chat::config::ClientConfig;
use crate::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

/// Raw webhook answer, before decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }
}

/// Sends one payload to a webhook and hands back the raw response.
///
/// Status codes are not interpreted here; only failing to get a response at
/// all is an error.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, url: &str, payload: Payload) -> Result<RawResponse>;
}

/// [`Transport`] backed by `reqwest`, posting multipart forms
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, payload: Payload) -> Result<RawResponse> {
        debug!(
            "POST {} type={} text_len={} attachment_bytes={}",
            url,
            payload.kind.as_str(),
            payload.text.len(),
            payload.attachment_bytes()
        );

        let form = payload.into_form()?;
        let response = self.client.post(url).multipart(form).send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        debug!(
            "Webhook answered {} ({}, {} bytes)",
            status,
            content_type.as_deref().unwrap_or("no content type"),
            body.len()
        );

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}
