//! Copy-to-clipboard action for rendered code blocks.

use std::time::{Duration, Instant};

pub const COPY_LABEL: &str = "Copy";
pub const COPIED_LABEL: &str = "Copied!";
pub const CONFIRM_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard write failed: {0}")]
    Write(String),
}

/// Destination for copied text.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The system clipboard via `arboard`.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        let inner =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.inner
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

/// Copy button state for one code block.
///
/// After a successful copy the label reads "Copied!" and the button ignores
/// further presses until [`CONFIRM_DURATION`] has elapsed.
#[derive(Clone, Debug)]
pub struct CopyButton {
    code: String,
    copied_at: Option<Instant>,
}

impl CopyButton {
    /// `code` is the original, unescaped block body.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            copied_at: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn is_enabled(&self, now: Instant) -> bool {
        self.copied_at
            .is_none_or(|at| now.saturating_duration_since(at) >= CONFIRM_DURATION)
    }

    pub fn label(&self, now: Instant) -> &'static str {
        if self.is_enabled(now) {
            COPY_LABEL
        } else {
            COPIED_LABEL
        }
    }

    /// Returns `Ok(false)` when pressed during the confirmation window.
    pub fn trigger(
        &mut self,
        sink: &mut dyn ClipboardSink,
        now: Instant,
    ) -> Result<bool, ClipboardError> {
        if !self.is_enabled(now) {
            return Ok(false);
        }
        sink.set_text(&self.code)?;
        self.copied_at = Some(now);
        tracing::debug!("copied {} bytes of code", self.code.len());
        Ok(true)
    }
}
