//! Normalizes webhook response bodies into display text
//!
//! Endpoints answer with whatever their automation produces: JSON objects,
//! chat-completion shaped JSON, bare JSON strings, HTML snippets or plain
//! text. Decoding never fails; every body maps to some string.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;

/// Returned when the response carries no text at all
pub const EMPTY_BODY: &str = "(No response body)";

/// How a body is interpreted, decided from the trimmed text and content type
#[derive(Debug)]
enum BodyKind<'a> {
    Json(Value),
    Html(&'a str),
    Plain(&'a str),
    Empty,
}

/// Object shapes, in the order they are tried
#[derive(Debug, PartialEq)]
enum ReplyShape<'a> {
    /// `{"reply": "..."}`
    Reply(&'a str),
    /// `{"data": {"reply": "..."}}`
    DataReply(&'a str),
    /// `{"choices": [{"message": {"content": "..."}}]}`
    ChatCompletion(&'a str),
    Unknown,
}

/// Decode a raw response body into display text.
pub fn decode(raw: &str, content_type: Option<&str>) -> String {
    match classify(raw.trim(), content_type) {
        BodyKind::Json(value) => decode_json(value),
        BodyKind::Html(html) => decode_html(html),
        BodyKind::Plain(text) => text.to_string(),
        BodyKind::Empty => EMPTY_BODY.to_string(),
    }
}

fn classify<'a>(trimmed: &'a str, content_type: Option<&str>) -> BodyKind<'a> {
    if trimmed.is_empty() {
        return BodyKind::Empty;
    }

    let declared_json = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("json"))
        .unwrap_or(false);
    let looks_json = trimmed.starts_with(['[', '{', '"']);

    if declared_json || looks_json {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => return BodyKind::Json(value),
            Err(e) => debug!("Body looked like JSON but failed to parse: {}", e),
        }
    }

    if trimmed.starts_with('<') {
        BodyKind::Html(trimmed)
    } else {
        BodyKind::Plain(trimmed)
    }
}

fn decode_json(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Object(_) => match match_object(&value) {
            ReplyShape::Reply(text)
            | ReplyShape::DataReply(text)
            | ReplyShape::ChatCompletion(text) => text.to_string(),
            ReplyShape::Unknown => {
                let pretty =
                    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
                format!("\n{}", pretty)
            }
        },
        other => other.to_string(),
    }
}

fn match_object(value: &Value) -> ReplyShape<'_> {
    if let Some(text) = value.get("reply").and_then(Value::as_str) {
        return ReplyShape::Reply(text);
    }

    if let Some(text) = value
        .get("data")
        .and_then(|data| data.get("reply"))
        .and_then(Value::as_str)
    {
        return ReplyShape::DataReply(text);
    }

    if let Some(text) = value
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
    {
        return ReplyShape::ChatCompletion(text);
    }

    ReplyShape::Unknown
}

fn decode_html(html: &str) -> String {
    let lower = html.to_ascii_lowercase();

    // Sandboxed-iframe wrappers: the reply lives in the srcdoc attribute.
    // Without a matching iframe element this yields "" and does not fall
    // back to the outer document's text.
    if lower.contains("<iframe") && lower.contains("srcdoc") {
        let outer = Html::parse_document(html);
        return select_first(&outer, "iframe[srcdoc]")
            .and_then(|iframe| iframe.value().attr("srcdoc"))
            .map(|srcdoc| document_text(&Html::parse_document(srcdoc)))
            .unwrap_or_default();
    }

    let text = document_text(&Html::parse_document(html));
    if text.is_empty() {
        html.to_string()
    } else {
        text
    }
}

fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}

/// Elements whose text never renders
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Visible text content of the document body, trimmed
fn document_text(document: &Html) -> String {
    let root = select_first(document, "body").unwrap_or_else(|| document.root_element());

    root.descendants()
        .filter_map(|node| node.value().as_text().map(|text| (node, text)))
        .filter(|(node, _)| {
            !node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|element| HIDDEN_ELEMENTS.contains(&element.name()))
            })
        })
        .map(|(_, text)| &**text)
        .collect::<String>()
        .trim()
        .to_string()
}
