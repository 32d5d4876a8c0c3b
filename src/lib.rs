//! deepchat - terminal client for a chat backend with reasoning-aware formatting
//!
//! - `format` - turns raw message text into prose, code and reasoning segments
//! - `store` - persisted conversation state with age/size eviction
//! - `api` - backend client and the optimistic send flow
//! - `clipboard` - copy action for code blocks

pub mod api;
pub mod clipboard;
pub mod config;
pub mod format;
pub mod store;
pub mod types;
