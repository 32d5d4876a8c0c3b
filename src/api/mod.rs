/// Chat backend access
///
/// - `client` - the `ChatApi` boundary and its reqwest implementation
/// - `session` - create/send flow with optimistic updates against the store
mod client;
mod session;

pub use client::{
    ApiError, ApiResult, ChatApi, ChatResponse, CreateChatRequest, HttpChatApi, RemoteChat,
    SendMessageRequest,
};
pub use session::{ChatSession, PendingSend, SessionError, SessionResult};
