use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::types::ChatMessage;

// ============================================
// Error Types
// ============================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid base url: {0}")]
    Url(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("chat api error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

// ============================================
// Wire Types
// ============================================

#[derive(Debug, Clone, Serialize)]
pub struct CreateChatRequest<'a> {
    pub api_key: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub user_message: String,
    pub api_key: String,
    pub model_name: String,
}

/// A chat as returned by the backend on creation or listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteChat {
    pub id: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
}

/// Request/response boundary to the chat backend.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn create_chat(&self, api_key: &str) -> ApiResult<RemoteChat>;

    async fn list_chats(&self) -> ApiResult<Vec<RemoteChat>>;

    async fn send_message(
        &self,
        chat_id: &str,
        request: &SendMessageRequest,
    ) -> ApiResult<ChatResponse>;
}

// ============================================
// HTTP Client
// ============================================

#[derive(Clone, Debug)]
pub struct HttpChatApi {
    base: Url,
    http: reqwest::Client,
}

impl HttpChatApi {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        // Url::join drops the last path segment unless it ends in a slash.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base = Url::parse(&normalized).map_err(|e| ApiError::Url(e.to_string()))?;
        Ok(Self {
            base,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .map_err(|e| ApiError::Http(e.to_string()))?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base
            .join(path)
            .map_err(|e| ApiError::Url(e.to_string()))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> ApiResult<T> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn create_chat(&self, api_key: &str) -> ApiResult<RemoteChat> {
        let url = self.endpoint("chats")?;
        tracing::debug!("POST {url}");
        let resp = self
            .http
            .post(url)
            .json(&CreateChatRequest { api_key })
            .send()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;
        Self::read_json(resp).await
    }

    async fn list_chats(&self) -> ApiResult<Vec<RemoteChat>> {
        let url = self.endpoint("chats")?;
        tracing::debug!("GET {url}");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;
        Self::read_json(resp).await
    }

    async fn send_message(
        &self,
        chat_id: &str,
        request: &SendMessageRequest,
    ) -> ApiResult<ChatResponse> {
        let url = self.endpoint(&format!("chats/{chat_id}/messages"))?;
        tracing::debug!("POST {url}");
        let resp = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;
        Self::read_json(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_keeps_path_prefix() {
        let api = HttpChatApi::new("http://localhost:3000/api/v1").unwrap();
        assert_eq!(
            api.endpoint("chats").unwrap().as_str(),
            "http://localhost:3000/api/v1/chats"
        );
        let api = HttpChatApi::new("http://localhost:3000/api/v1/").unwrap();
        assert_eq!(
            api.endpoint("chats/abc/messages").unwrap().as_str(),
            "http://localhost:3000/api/v1/chats/abc/messages"
        );
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(matches!(HttpChatApi::new("not a url"), Err(ApiError::Url(_))));
    }

    #[test]
    fn decodes_backend_chat() {
        let json = r#"{
            "id": "5f0c",
            "created_at": "2025-01-01T00:00:00Z",
            "last_updated": "2025-01-01T00:00:00Z",
            "api_key": "sk",
            "messages": []
        }"#;
        let chat: RemoteChat = serde_json::from_str(json).unwrap();
        assert_eq!(chat.id, "5f0c");
        assert!(chat.messages.is_empty());
    }
}
