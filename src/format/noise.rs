use super::fence::fence_ranges;

/// Decides whether a prose line is conversational filler.
pub trait NoisePolicy: Send + Sync {
    fn is_noise(&self, line: &str) -> bool;
}

impl<F> NoisePolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_noise(&self, line: &str) -> bool {
        self(line)
    }
}

const HEDGE_PHRASES: &[&str] = &[
    "i can",
    "i could",
    "i should",
    "i would",
    "i will",
    "i think",
    "let me",
    "alternatively",
    "we can",
    "we could",
    "looks like",
    "seems like",
    "might be",
    "reasoning",
    "checking",
    "verifying",
];

const OPENER_WORDS: &[&str] = &[
    "okay", "alright", "now", "here", "well", "so", "first", "next", "then", "finally",
];

/// Phrase and opener heuristic for hedging or meta commentary.
#[derive(Clone, Debug)]
pub struct PhraseNoisePolicy {
    phrases: Vec<String>,
    openers: Vec<String>,
}

impl Default for PhraseNoisePolicy {
    fn default() -> Self {
        Self::new(HEDGE_PHRASES.iter().copied(), OPENER_WORDS.iter().copied())
    }
}

impl PhraseNoisePolicy {
    pub fn new<P, O>(phrases: P, openers: O) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        O: IntoIterator,
        O::Item: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
            openers: openers
                .into_iter()
                .map(|o| o.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Openers match a whole leading word, not a bare prefix: "so," and
    /// "now the" are openers, "sorting" and "nowhere" are not.
    fn starts_with_opener(&self, lower: &str) -> bool {
        self.openers.iter().any(|opener| {
            lower.strip_prefix(opener.as_str()).is_some_and(|rest| {
                rest.chars()
                    .next()
                    .is_none_or(|c| !c.is_alphanumeric() && c != '\'')
            })
        })
    }
}

impl NoisePolicy for PhraseNoisePolicy {
    fn is_noise(&self, line: &str) -> bool {
        let lower = line.trim().to_lowercase();
        self.phrases.iter().any(|p| lower.contains(p.as_str())) || self.starts_with_opener(&lower)
    }
}

/// Drops blank and noisy prose lines, leaving fenced code untouched.
///
/// Fences are found the same way `segment_fences` finds them, so a fence
/// opening mid-line is still code and an unterminated one is still prose.
/// Complete fences are copied verbatim, delimiters included.
pub fn filter_noise(text: &str, policy: &dyn NoisePolicy) -> String {
    let mut out = String::new();
    let mut last = 0;

    for fence in fence_ranges(text) {
        push_block(&mut out, &filter_prose(&text[last..fence.start], policy));
        push_block(&mut out, &text[fence.start..fence.end]);
        last = fence.end;
    }
    push_block(&mut out, &filter_prose(&text[last..], policy));

    out
}

/// Line filter for text already known to hold no complete fence.
pub(super) fn filter_prose(text: &str, policy: &dyn NoisePolicy) -> String {
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !policy.is_noise(trimmed)
        })
        .collect();

    kept.join("\n").trim().to_string()
}

fn push_block(out: &mut String, block: &str) {
    if block.is_empty() {
        return;
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(block);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_hedging_line() {
        let policy = PhraseNoisePolicy::default();
        assert_eq!(
            filter_noise("Let me think about this.\nThe answer is 42.", &policy),
            "The answer is 42."
        );
    }

    #[test]
    fn drops_openers_by_word() {
        let policy = PhraseNoisePolicy::default();
        assert!(policy.is_noise("Okay, the user wants a list."));
        assert!(policy.is_noise("  so"));
        assert!(policy.is_noise("Then: compile it"));
        assert!(!policy.is_noise("Sorting runs in n log n."));
        assert!(!policy.is_noise("Nowhere is safe."));
    }

    #[test]
    fn drops_blank_lines_and_trims() {
        let policy = PhraseNoisePolicy::default();
        assert_eq!(filter_noise("\n\nA\n   \nB\n\n", &policy), "A\nB");
    }

    #[test]
    fn code_lines_survive() {
        let policy = PhraseNoisePolicy::default();
        let input = "Here is code:\n```python\nnow()\n\nso_far = 1\n```\nResult.";
        assert_eq!(
            filter_noise(input, &policy),
            "```python\nnow()\n\nso_far = 1\n```\nResult."
        );
    }

    #[test]
    fn fence_opened_mid_line_is_code() {
        let policy = PhraseNoisePolicy::default();
        let input = "Run this: ```python\nnow()\nx = 1\n```\nOkay, that is it.\nResult.";
        assert_eq!(
            filter_noise(input, &policy),
            "Run this:\n```python\nnow()\nx = 1\n```\nResult."
        );
    }

    #[test]
    fn unterminated_fence_is_filtered_as_prose() {
        let policy = PhraseNoisePolicy::default();
        assert_eq!(
            filter_noise("Result:\n```\nLet me think again.\nAnswer.", &policy),
            "Result:\n```\nAnswer."
        );
    }

    #[test]
    fn closure_policy() {
        let policy = |line: &str| line.starts_with('#');
        assert_eq!(filter_noise("# note\nkeep", &policy), "keep");
    }

    #[test]
    fn custom_phrase_list() {
        let policy = PhraseNoisePolicy::new(["hmm"], Vec::<String>::new());
        assert_eq!(filter_noise("Hmm, odd.\nLet me see.", &policy), "Let me see.");
    }
}
