use super::fence::fence_ranges;

pub const THINK_OPEN: &str = "<think>";
pub const THINK_CLOSE: &str = "</think>";

/// Pulls the first `<think>...</think>` pair out of `content`.
///
/// Returns the trimmed thought (if a complete pair was found) and the content
/// with that pair removed. An opening tag without a close is left alone, and
/// markers inside fenced code are part of the code.
pub fn extract_reasoning(content: &str) -> (Option<String>, String) {
    let fences = fence_ranges(content);
    let outside_code = |idx: &usize| !fences.iter().any(|fence| fence.contains(idx));

    let Some(start) = content
        .match_indices(THINK_OPEN)
        .map(|(idx, _)| idx)
        .find(outside_code)
    else {
        return (None, content.to_string());
    };
    let inner_start = start + THINK_OPEN.len();
    let Some(inner_end) = content[inner_start..]
        .match_indices(THINK_CLOSE)
        .map(|(idx, _)| inner_start + idx)
        .find(outside_code)
    else {
        return (None, content.to_string());
    };

    let thought = content[inner_start..inner_end].trim().to_string();
    let mut rest = String::with_capacity(content.len() - (inner_end - start));
    rest.push_str(&content[..start]);
    rest.push_str(&content[inner_end + THINK_CLOSE.len()..]);

    (Some(thought), rest)
}

/// Re-flows reasoning text into one entry per sentence.
///
/// Sentences end at `.`, `!` or `?` followed by whitespace. Empty fragments are dropped.
pub fn reasoning_paragraphs(thought: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = thought.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        let Some(&(next_idx, next)) = chars.peek() else {
            break;
        };
        if next.is_whitespace() {
            push_sentence(&mut out, &thought[start..next_idx]);
            start = idx + ch.len_utf8();
        }
    }

    push_sentence(&mut out, &thought[start..]);
    out
}

fn push_sentence(out: &mut Vec<String>, fragment: &str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}
