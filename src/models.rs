// Wire types for the relay endpoint and the upstream request body

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// Message Role Enum
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
    /// Any other role (`developer`, `function`, ...), relayed as sent
    #[serde(untagged)]
    Other(String),
}

/// One typed part of a multi-part message.
///
/// Only `text` parts are ever rewritten. Every other field (image URLs,
/// cache hints, provider extensions) is kept verbatim in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
            extra: Map::new(),
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind == "text"
    }
}

// Message Content Variants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// The text portion of the content: the whole string, or the first text part.
    pub fn text(&self) -> &str {
        match self {
            MessageContent::Text(text) => text,
            MessageContent::Parts(parts) => parts
                .iter()
                .find(|p| p.is_text())
                .and_then(|p| p.text.as_deref())
                .unwrap_or(""),
        }
    }

    /// Whether the content carries anything besides text (images, files, ...).
    pub fn has_non_text_parts(&self) -> bool {
        match self {
            MessageContent::Text(_) => false,
            MessageContent::Parts(parts) => parts.iter().any(|p| !p.is_text()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text().trim().is_empty() && !self.has_non_text_parts()
    }
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

// Chat Message Struct
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: MessageRole,
    #[serde(default)]
    pub content: MessageContent,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(text.into()),
            extra: Map::new(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Text(text.into()),
            extra: Map::new(),
        }
    }
}

/// Attachment as sent by the browser UI. `data` is base64.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachmentPayload {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

// Request Types
#[derive(Debug, Clone, Deserialize)]
pub struct RelayRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub attachments: Option<Vec<AttachmentPayload>>,
    /// Pass-through parameters (`model`, `temperature`, `max_tokens`, ...).
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl RelayRequest {
    pub fn attachments(&self) -> &[AttachmentPayload] {
        self.attachments.as_deref().unwrap_or(&[])
    }
}

/// Body POSTed to the upstream LLM endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamRequest {
    #[serde(flatten)]
    pub params: Map<String, Value>,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

impl UpstreamRequest {
    /// Client parameters minus the relay-owned keys, with streaming forced on.
    ///
    /// `default_model` fills `model` only when the client did not send one.
    pub fn new(
        mut params: Map<String, Value>,
        messages: Vec<ChatMessage>,
        default_model: Option<&str>,
    ) -> Self {
        params.remove("attachments");
        params.remove("messages");
        params.remove("stream");

        let has_model = params
            .get("model")
            .and_then(Value::as_str)
            .is_some_and(|m| !m.trim().is_empty());
        if !has_model {
            if let Some(model) = default_model.filter(|m| !m.trim().is_empty()) {
                params.insert("model".to_string(), Value::String(model.to_string()));
            }
        }

        Self {
            params,
            messages,
            stream: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_role_serialization() {
        assert_eq!(serde_json::to_string(&MessageRole::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&MessageRole::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_unknown_role_round_trips() {
        let raw = json!({"role": "developer", "content": "be brief"});
        let msg: ChatMessage = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(msg.role, MessageRole::Other("developer".to_string()));
        assert_eq!(serde_json::to_value(&msg).unwrap(), raw);
    }

    #[test]
    fn test_string_content_deserialization() {
        let msg: ChatMessage =
            serde_json::from_value(json!({"role": "user", "content": "hello"})).unwrap();
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.content, MessageContent::Text("hello".to_string()));
        assert_eq!(msg.content.text(), "hello");
    }

    #[test]
    fn test_parts_content_preserves_unknown_fields() {
        let raw = json!({
            "role": "user",
            "content": [
                {"type": "text", "text": "describe this"},
                {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
            ]
        });
        let msg: ChatMessage = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(msg.content.text(), "describe this");
        assert!(msg.content.has_non_text_parts());
        assert_eq!(serde_json::to_value(&msg).unwrap(), raw);
    }

    #[test]
    fn test_missing_content_is_empty() {
        let msg: ChatMessage = serde_json::from_value(json!({"role": "user"})).unwrap();
        assert!(msg.content.is_empty());
    }

    #[test]
    fn test_relay_request_splits_params() {
        let req: RelayRequest = serde_json::from_value(json!({
            "model": "gpt-4o",
            "temperature": 0.2,
            "messages": [{"role": "user", "content": "hi"}],
            "attachments": [{"filename": "a.csv", "mime_type": "text/csv", "data": "YSxi"}]
        }))
        .unwrap();

        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.attachments().len(), 1);
        assert_eq!(req.params["model"], "gpt-4o");
        assert!(!req.params.contains_key("attachments"));
        assert!(!req.params.contains_key("messages"));
    }

    #[test]
    fn test_upstream_request_forces_stream_and_drops_attachments() {
        let mut params = Map::new();
        params.insert("model".into(), json!("m"));
        params.insert("stream".into(), json!(false));
        params.insert("attachments".into(), json!([]));
        params.insert("max_tokens".into(), json!(256));

        let body = UpstreamRequest::new(params, vec![ChatMessage::user("hi")], Some("other"));
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["stream"], true);
        assert_eq!(value["model"], "m");
        assert_eq!(value["max_tokens"], 256);
        assert!(value.get("attachments").is_none());
        assert_eq!(value["messages"], json!([{"role": "user", "content": "hi"}]));
    }

    #[test]
    fn test_upstream_request_defaults_model() {
        let body = UpstreamRequest::new(Map::new(), vec![], Some("deepseek-chat"));
        assert_eq!(body.params["model"], "deepseek-chat");

        let body = UpstreamRequest::new(Map::new(), vec![], None);
        assert!(!body.params.contains_key("model"));
    }
}
