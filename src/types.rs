use serde::{Deserialize, Serialize};

pub const PLACEHOLDER_CONTENT: &str = "...";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Model "thinking" text delivered next to `content` by some backends.
    #[serde(
        default,
        alias = "reasoning_content",
        skip_serializing_if = "Option::is_none"
    )]
    pub reasoning: Option<String>,
    /// Optimistic placeholder awaiting server confirmation.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub temp: bool,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            reasoning: None,
            temp: false,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            reasoning: None,
            temp: false,
        }
    }

    pub fn placeholder() -> Self {
        Self {
            temp: true,
            ..Self::assistant(PLACEHOLDER_CONTENT)
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self.role, Role::Assistant)
    }
}

/// A chat as kept in local storage, keyed by the id the backend assigned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Creation time in epoch milliseconds.
    pub created: i64,
    pub model: String,
    #[serde(default, rename = "apiKeyRef", skip_serializing_if = "Option::is_none")]
    pub api_key_ref: Option<String>,
}

impl ChatRecord {
    pub fn new(model: impl Into<String>, created: i64) -> Self {
        Self {
            messages: Vec::new(),
            created,
            model: model.into(),
            api_key_ref: None,
        }
    }
}

pub fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_reasoning_content_alias() {
        let json = r#"{"role":"assistant","content":"hi","reasoning_content":"hmm"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.reasoning.as_deref(), Some("hmm"));
        assert!(!msg.temp);
    }

    #[test]
    fn temp_flag_is_omitted_when_false() {
        let json = serde_json::to_string(&ChatMessage::user("hello")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hello"}"#);

        let json = serde_json::to_string(&ChatMessage::placeholder()).unwrap();
        assert!(json.contains(r#""temp":true"#));
    }

    #[test]
    fn ignores_unknown_backend_fields() {
        let json = r#"{"role":"user","content":"x","timestamp":"2025-01-01T00:00:00Z","reasoning_content":null}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg, ChatMessage::user("x"));
    }
}
