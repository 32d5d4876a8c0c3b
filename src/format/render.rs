use comrak::adapters::SyntaxHighlighterAdapter;
use comrak::plugins::syntect::SyntectAdapter;
use once_cell::sync::Lazy;

use super::{CodeBlock, Inline, ReasoningBlock, Segment, escape_html, inline_spans};
use crate::clipboard::COPY_LABEL;

static HIGHLIGHTER: Lazy<SyntectAdapter> =
    Lazy::new(|| SyntectAdapter::new(Some("base16-ocean.dark")));

/// Renders formatted segments to an HTML fragment.
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlRenderer {
    /// Run code through syntect; otherwise the body is only escaped.
    pub highlight: bool,
}

impl HtmlRenderer {
    pub fn new(highlight: bool) -> Self {
        Self { highlight }
    }

    pub fn render(&self, segments: &[Segment]) -> String {
        let mut html = String::new();
        for segment in segments {
            match segment {
                Segment::Reasoning(block) => render_reasoning(&mut html, block),
                Segment::Text { value } => render_prose(&mut html, value),
                Segment::Code(block) => self.render_code(&mut html, block),
            }
        }
        html
    }

    fn render_code(&self, html: &mut String, block: &CodeBlock) {
        let language = block.highlight_language();

        html.push_str("<div class=\"code-block\">");
        if let Some(label) = block.label() {
            html.push_str("<span class=\"code-label\">");
            html.push_str(&escape_html(label));
            html.push_str("</span>");
        }
        html.push_str("<button class=\"copy-button\" data-code=\"");
        html.push_str(&escape_html(&block.code));
        html.push_str("\">");
        html.push_str(COPY_LABEL);
        html.push_str("</button>");

        html.push_str("<pre class=\"language-");
        html.push_str(language.class_name());
        html.push_str("\"><code>");
        match self.highlight.then(|| highlight(language.syntax_token(), &block.code)).flatten() {
            Some(highlighted) => html.push_str(&highlighted),
            None => html.push_str(&escape_html(&block.code)),
        }
        html.push_str("</code></pre></div>");
    }
}

fn highlight(token: &str, code: &str) -> Option<String> {
    let mut out = Vec::new();
    match HIGHLIGHTER.write_highlighted(&mut out, Some(token), code) {
        Ok(()) => String::from_utf8(out).ok(),
        Err(err) => {
            tracing::warn!("syntax highlighting failed for {token}: {err}");
            None
        }
    }
}

fn render_reasoning(html: &mut String, block: &ReasoningBlock) {
    html.push_str("<details class=\"reasoning\"><summary>Reasoning</summary>");
    for paragraph in block.paragraphs() {
        html.push_str("<p>");
        html.push_str(&escape_html(&paragraph));
        html.push_str("</p>");
    }
    html.push_str("</details>");
}

fn render_prose(html: &mut String, value: &str) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return;
    }
    html.push_str("<p>");
    for span in inline_spans(trimmed) {
        match span {
            Inline::Plain(text) => html.push_str(&escape_html(text)),
            Inline::Code(code) => {
                html.push_str("<code>");
                html.push_str(&escape_html(code));
                html.push_str("</code>");
            }
        }
    }
    html.push_str("</p>");
}

/// Terminal-friendly rendering: reasoning quoted, code re-fenced with its label.
pub fn render_plain(segments: &[Segment]) -> String {
    let mut blocks: Vec<String> = Vec::new();
    for segment in segments {
        match segment {
            Segment::Reasoning(block) => {
                let quoted = block
                    .paragraphs()
                    .iter()
                    .map(|p| format!("> {p}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                if !quoted.is_empty() {
                    blocks.push(quoted);
                }
            }
            Segment::Text { value } => {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    blocks.push(trimmed.to_string());
                }
            }
            Segment::Code(block) => {
                blocks.push(format!(
                    "```{}\n{}\n```",
                    block.label().unwrap_or_default(),
                    block.code
                ));
            }
        }
    }
    blocks.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::segment_fences;

    #[test]
    fn prose_is_trimmed_and_escaped() {
        let html = HtmlRenderer::default().render(&segment_fences("  a < b and `x&y`  "));
        assert_eq!(html, "<p>a &lt; b and <code>x&amp;y</code></p>");
    }

    #[test]
    fn plain_code_block_markup() {
        let html = HtmlRenderer::default().render(&segment_fences("```Python\nif a<b: pass\n```"));
        assert_eq!(
            html,
            "<div class=\"code-block\"><span class=\"code-label\">python</span>\
             <button class=\"copy-button\" data-code=\"if a&lt;b: pass\">Copy</button>\
             <pre class=\"language-python\"><code>if a&lt;b: pass</code></pre></div>"
        );
    }

    #[test]
    fn unknown_language_uses_default_class() {
        let html = HtmlRenderer::default().render(&segment_fences("```brainfuck\n+++\n```"));
        assert!(html.contains("language-javascript"));
        assert!(html.contains("<span class=\"code-label\">brainfuck</span>"));
    }

    #[test]
    fn untagged_block_has_no_label() {
        let html = HtmlRenderer::default().render(&segment_fences("```\nx\n```"));
        assert!(!html.contains("code-label"));
    }

    #[test]
    fn highlighted_output_is_not_double_escaped() {
        let html = HtmlRenderer::new(true).render(&segment_fences("```rust\nlet a = 1 < 2;\n```"));
        assert!(html.contains("&lt;"));
        assert!(!html.contains("&amp;lt;"));
    }

    #[test]
    fn reasoning_rendered_as_details() {
        let segments = vec![Segment::Reasoning(ReasoningBlock {
            thought: "One. Two.".into(),
        })];
        assert_eq!(
            HtmlRenderer::default().render(&segments),
            "<details class=\"reasoning\"><summary>Reasoning</summary><p>One.</p><p>Two.</p></details>"
        );
    }

    #[test]
    fn plain_rendering() {
        let segments = segment_fences("Sure.\n```python\nprint(1)\n```\nDone.");
        assert_eq!(render_plain(&segments), "Sure.\n\n```python\nprint(1)\n```\n\nDone.");
    }
}
