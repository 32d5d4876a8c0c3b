use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{CodeBlock, Segment};

/// Opening fence, optional tag on the same line, newline, lazy body, closing fence.
static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```([^\n`]*)\n(.*?)```").expect("fence pattern"));

static INLINE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([^`\n]+)`").expect("inline code pattern"));

/// Highlighting grammars known to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    Cpp,
    C,
    Rust,
    JavaScript,
    Nasm,
}

impl Language {
    pub const DEFAULT: Language = Language::JavaScript;

    /// Case-insensitive lookup against the allow-list.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "python" => Some(Self::Python),
            "cpp" => Some(Self::Cpp),
            "c" => Some(Self::C),
            "rust" => Some(Self::Rust),
            "javascript" => Some(Self::JavaScript),
            "nasm" | "asm" | "assembly" => Some(Self::Nasm),
            _ => None,
        }
    }

    /// Like [`Language::from_tag`] but never fails.
    pub fn resolve(tag: Option<&str>) -> Self {
        tag.and_then(Self::from_tag).unwrap_or(Self::DEFAULT)
    }

    /// Name used in `language-*` CSS classes.
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Cpp => "cpp",
            Self::C => "c",
            Self::Rust => "rust",
            Self::JavaScript => "javascript",
            Self::Nasm => "nasm",
        }
    }

    /// Token understood by syntect's syntax lookup.
    pub fn syntax_token(self) -> &'static str {
        match self {
            Self::Python => "py",
            Self::Cpp => "cpp",
            Self::C => "c",
            Self::Rust => "rs",
            Self::JavaScript => "js",
            Self::Nasm => "asm",
        }
    }
}

/// Inline run inside a prose segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inline<'a> {
    Plain(&'a str),
    Code(&'a str),
}

/// Splits raw message text into prose and fenced code segments.
///
/// Anything the fence pattern does not match stays prose, so an unterminated
/// fence is kept verbatim in the trailing text segment.
pub fn segment_fences(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in FENCE_RE.captures_iter(content) {
        let (Some(whole), Some(tag), Some(body)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        push_text(&mut segments, &content[last..whole.start()]);

        let tag = tag.as_str().trim().to_lowercase();
        let code = body.as_str();
        let code = code.strip_suffix('\n').unwrap_or(code);
        let code = code.strip_suffix('\r').unwrap_or(code);
        segments.push(Segment::Code(CodeBlock {
            language: (!tag.is_empty()).then_some(tag),
            code: code.to_string(),
        }));

        last = whole.end();
    }

    push_text(&mut segments, &content[last..]);
    segments
}

/// Byte ranges of the complete fences `segment_fences` would turn into code.
pub(super) fn fence_ranges(content: &str) -> Vec<Range<usize>> {
    FENCE_RE.find_iter(content).map(|m| m.range()).collect()
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        segments.push(Segment::Text {
            value: text.to_string(),
        });
    }
}

/// Single-backtick spans become code runs; nothing else is interpreted.
pub fn inline_spans(text: &str) -> Vec<Inline<'_>> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in INLINE_CODE_RE.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            spans.push(Inline::Plain(&text[last..whole.start()]));
        }
        spans.push(Inline::Code(inner.as_str()));
        last = whole.end();
    }

    if last < text.len() {
        spans.push(Inline::Plain(&text[last..]));
    }
    spans
}
