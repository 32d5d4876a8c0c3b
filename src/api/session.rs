use crate::store::{ChatPersistence, ChatStore, StoreError};
use crate::types::{ChatMessage, ChatRecord, now_millis};

use super::client::{ApiError, ApiResult, ChatApi, ChatResponse, SendMessageRequest};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("enter an API key before creating a chat")]
    MissingApiKey,

    #[error("no chat selected")]
    NoChatSelected,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// A send that has been applied optimistically and awaits the server.
#[derive(Clone, Debug)]
pub struct PendingSend {
    pub chat_id: String,
    pub request: SendMessageRequest,
}

/// Drives the create/send flow against a backend and a local store.
pub struct ChatSession<A, P> {
    api: A,
    store: ChatStore<P>,
    default_model: String,
}

impl<A: ChatApi, P: ChatPersistence> ChatSession<A, P> {
    pub fn new(api: A, store: ChatStore<P>, default_model: impl Into<String>) -> Self {
        Self {
            api,
            store,
            default_model: default_model.into(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &ChatStore<P> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ChatStore<P> {
        &mut self.store
    }

    /// Saved model name, falling back to the configured default.
    pub fn model(&self) -> &str {
        self.store.model_name().unwrap_or(self.default_model.as_str())
    }

    fn api_key(&self) -> SessionResult<String> {
        self.store
            .api_key()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .ok_or(SessionError::MissingApiKey)
    }

    /// Messages of the selected chat, if any.
    pub fn current_messages(&self) -> Option<&[ChatMessage]> {
        self.store.selected().and_then(|id| self.store.get(id))
    }

    pub async fn new_chat(&mut self) -> SessionResult<String> {
        let api_key = self.api_key()?;
        let remote = self.api.create_chat(&api_key).await?;
        tracing::info!("created chat {}", remote.id);

        let mut record = ChatRecord::new(self.model().to_string(), now_millis());
        record.messages = remote.messages;
        self.store.insert_chat(remote.id.clone(), record)?;
        self.store.select(&remote.id)?;
        Ok(remote.id)
    }

    /// Adds chats the backend knows about but the store does not.
    pub async fn import_remote_chats(&mut self) -> SessionResult<Vec<String>> {
        let remote = self.api.list_chats().await?;
        let model = self.model().to_string();
        let mut imported = Vec::new();
        for chat in remote {
            if self.store.record(&chat.id).is_some() {
                continue;
            }
            let mut record = ChatRecord::new(model.clone(), now_millis());
            record.messages = chat.messages;
            self.store.insert_chat(chat.id.clone(), record)?;
            imported.push(chat.id);
        }
        Ok(imported)
    }

    /// Applies the optimistic append for `text` in the selected chat.
    ///
    /// Returns `None` for blank input.
    pub fn prepare_send(&mut self, text: &str) -> SessionResult<Option<PendingSend>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let chat_id = self
            .store
            .selected()
            .map(str::to_string)
            .ok_or(SessionError::NoChatSelected)?;
        let request = SendMessageRequest {
            user_message: text.to_string(),
            api_key: self.api_key()?,
            model_name: self.model().to_string(),
        };

        self.store.begin_send(&chat_id, text)?;
        Ok(Some(PendingSend { chat_id, request }))
    }

    /// Commits the server's list or rolls back the placeholder.
    ///
    /// Responses overwrite whatever is stored, so when several sends are in
    /// flight the one that finishes last decides the final list.
    pub fn finish_send(
        &mut self,
        pending: &PendingSend,
        result: ApiResult<ChatResponse>,
    ) -> SessionResult<()> {
        match result {
            Ok(response) => {
                let messages = attach_reasoning(response);
                self.store.commit_send(&pending.chat_id, messages)?;
                Ok(())
            }
            Err(err) => {
                tracing::warn!("send to chat {} failed: {err}", pending.chat_id);
                self.store.rollback_send(&pending.chat_id)?;
                Err(err.into())
            }
        }
    }

    pub async fn send(&mut self, text: &str) -> SessionResult<()> {
        let Some(pending) = self.prepare_send(text)? else {
            return Ok(());
        };
        let result = self
            .api
            .send_message(&pending.chat_id, &pending.request)
            .await;
        self.finish_send(&pending, result)
    }
}

/// Moves a top-level `reasoning_content` onto the last assistant message
/// when that message has no reasoning of its own.
fn attach_reasoning(response: ChatResponse) -> Vec<ChatMessage> {
    let ChatResponse {
        mut messages,
        reasoning_content,
    } = response;
    let Some(reasoning) = reasoning_content.filter(|r| !r.trim().is_empty()) else {
        return messages;
    };
    if let Some(last) = messages.iter_mut().rev().find(|m| m.is_assistant())
        && last.reasoning.is_none()
    {
        last.reasoning = Some(reasoning);
    }
    messages
}
