/// Escapes text for embedding in HTML element content or quoted attributes.
///
/// Each literal character is escaped exactly once, so `&amp;` in the source
/// becomes `&amp;amp;`.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 8);
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_html;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn ampersand_entities_escape_once() {
        assert_eq!(escape_html("a &amp; b"), "a &amp;amp; b");
        assert_eq!(escape_html("&&"), "&amp;&amp;");
    }

    #[test]
    fn plain_text_untouched() {
        assert_eq!(escape_html("fn main() {}"), "fn main() {}");
    }
}
