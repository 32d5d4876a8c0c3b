//! Message content formatting
//!
//! Turns a raw assistant or user message into render-ready segments:
//!
//! - `fence` - triple-backtick code block segmentation and inline code spans
//! - `reasoning` - `<think>` block extraction and sentence re-flow
//! - `noise` - optional heuristic removal of hedging lines
//! - `escape` / `render` - HTML output for the segments
//!
//! The formatter never fails. Malformed fences or markers degrade to prose.

mod escape;
mod fence;
mod noise;
mod reasoning;
mod render;

use std::sync::Arc;

use crate::types::{ChatMessage, Role};
use noise::filter_prose;

pub use escape::escape_html;
pub use fence::{Inline, Language, inline_spans, segment_fences};
pub use noise::{NoisePolicy, PhraseNoisePolicy, filter_noise};
pub use reasoning::{THINK_CLOSE, THINK_OPEN, extract_reasoning, reasoning_paragraphs};
pub use render::{HtmlRenderer, render_plain};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeBlock {
    /// Lower-cased tag from the opening fence, if one was given.
    pub language: Option<String>,
    pub code: String,
}

impl CodeBlock {
    /// Grammar used for highlighting, falling back to the default.
    pub fn highlight_language(&self) -> Language {
        Language::resolve(self.language.as_deref())
    }

    /// Tag shown above the block, only when the fence carried one.
    pub fn label(&self) -> Option<&str> {
        self.language.as_deref().filter(|tag| !tag.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReasoningBlock {
    pub thought: String,
}

impl ReasoningBlock {
    pub fn paragraphs(&self) -> Vec<String> {
        reasoning_paragraphs(&self.thought)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Text { value: String },
    Code(CodeBlock),
    Reasoning(ReasoningBlock),
}

impl Segment {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Segment::Text { value } => Some(value),
            _ => None,
        }
    }

    pub fn as_code(&self) -> Option<&CodeBlock> {
        match self {
            Segment::Code(block) => Some(block),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Strip hedging lines from the prose segments of assistant messages.
    pub filter_noise: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormattedMessage {
    pub role: Role,
    pub segments: Vec<Segment>,
    /// The message's separate `reasoning` field, passed through for the UI.
    pub side_reasoning: Option<String>,
}

/// Stateless content formatter; cheap to clone and safe to share.
#[derive(Clone)]
pub struct Formatter {
    options: FormatOptions,
    policy: Arc<dyn NoisePolicy>,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(FormatOptions::default())
    }
}

impl std::fmt::Debug for Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Formatter")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Formatter {
    pub fn new(options: FormatOptions) -> Self {
        Self {
            options,
            policy: Arc::new(PhraseNoisePolicy::default()),
        }
    }

    /// Replaces the line heuristic used when noise filtering is on.
    pub fn with_policy(mut self, policy: impl NoisePolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    pub fn options(&self) -> FormatOptions {
        self.options
    }

    /// Formats content without noise filtering, whatever the options say.
    pub fn format_content(&self, content: &str) -> Vec<Segment> {
        self.format_with(content, false)
    }

    /// Formats content as assistant output, filtering noise when enabled.
    pub fn format_assistant_content(&self, content: &str) -> Vec<Segment> {
        self.format_with(content, self.options.filter_noise)
    }

    pub fn format_message(&self, message: &ChatMessage) -> FormattedMessage {
        let segments = match message.role {
            Role::Assistant => self.format_assistant_content(&message.content),
            Role::User => self.format_content(&message.content),
        };
        FormattedMessage {
            role: message.role,
            segments,
            side_reasoning: message
                .reasoning
                .as_ref()
                .filter(|r| !r.trim().is_empty())
                .cloned(),
        }
    }

    fn format_with(&self, content: &str, filter: bool) -> Vec<Segment> {
        let (thought, rest) = extract_reasoning(content);

        let mut segments = Vec::new();
        if let Some(thought) = thought {
            segments.push(Segment::Reasoning(ReasoningBlock { thought }));
        }
        for segment in segment_fences(&rest) {
            match segment {
                Segment::Text { value } if filter => {
                    let value = filter_prose(&value, self.policy.as_ref());
                    if !value.is_empty() {
                        segments.push(Segment::Text { value });
                    }
                }
                other => segments.push(other),
            }
        }
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasoning_comes_first() {
        let segments = Formatter::default().format_content("<think>T</think>REST");
        assert_eq!(
            segments,
            vec![
                Segment::Reasoning(ReasoningBlock {
                    thought: "T".into()
                }),
                Segment::Text {
                    value: "REST".into()
                },
            ]
        );
    }

    #[test]
    fn user_messages_are_never_filtered() {
        let formatter = Formatter::new(FormatOptions { filter_noise: true });
        let user = formatter.format_message(&ChatMessage::user("Let me ask.\nWhy?"));
        assert_eq!(user.segments[0].as_text(), Some("Let me ask.\nWhy?"));

        let assistant = formatter.format_message(&ChatMessage::assistant("Let me see.\nBecause."));
        assert_eq!(assistant.segments[0].as_text(), Some("Because."));
    }

    #[test]
    fn filter_leaves_code_opened_mid_line() {
        let formatter = Formatter::new(FormatOptions { filter_noise: true });
        let out = formatter.format_message(&ChatMessage::assistant(
            "Run this: ```python\nnow()\nx = 1\n```\nOkay, that is it.\nResult.",
        ));
        assert_eq!(
            out.segments,
            vec![
                Segment::Text {
                    value: "Run this:".into()
                },
                Segment::Code(CodeBlock {
                    language: Some("python".into()),
                    code: "now()\nx = 1".into(),
                }),
                Segment::Text {
                    value: "Result.".into()
                },
            ]
        );
    }

    #[test]
    fn filter_disabled_by_default() {
        let formatter = Formatter::default();
        let out = formatter.format_message(&ChatMessage::assistant("Okay.\nDone."));
        assert_eq!(out.segments[0].as_text(), Some("Okay.\nDone."));
    }

    #[test]
    fn side_reasoning_passes_through() {
        let msg = ChatMessage::assistant("Answer").with_reasoning("Because.");
        let out = Formatter::default().format_message(&msg);
        assert_eq!(out.side_reasoning.as_deref(), Some("Because."));
        assert_eq!(out.segments.len(), 1);
    }

    #[test]
    fn label_and_fallback() {
        let block = CodeBlock {
            language: Some("brainfuck".into()),
            code: "+".into(),
        };
        assert_eq!(block.highlight_language(), Language::JavaScript);
        assert_eq!(block.label(), Some("brainfuck"));
    }
}
