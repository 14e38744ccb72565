//! Fenced code block detection and extraction
//!
//! Model replies arrive as a growing markdown string. The functions in this
//! module are called on every update with whatever has arrived so far, so
//! none of them require a closing fence to be present.

/// Markdown fence delimiter
pub const FENCE: &str = "```";

/// Result of extracting the first fenced block from a reply
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extraction {
    /// Text inside the first fence, without the language line and without
    /// one trailing newline
    pub content: String,
    /// True when the whole reply is that single block with no prose around it
    pub is_pure_code: bool,
}

impl Extraction {
    fn none() -> Self {
        Self::default()
    }

    /// Returns true when nothing was extracted
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Extracts the content of the first fenced code block in `text`
///
/// `text` may be a prefix of a reply that is still streaming in. When no
/// closing fence has arrived yet, everything after the opener (and its
/// language line) is returned.
///
/// # Arguments
///
/// * `text` - Reply text, complete or partial
///
/// # Returns
///
/// The extracted block. Text without a fence yields an empty extraction
/// with `is_pure_code` set to false.
///
/// # Examples
///
/// ```
/// use shellq::code_block::extract_first_code_block;
///
/// let extraction = extract_first_code_block("```bash\necho hi\n```");
/// assert_eq!(extraction.content, "echo hi");
/// assert!(extraction.is_pure_code);
///
/// let extraction = extract_first_code_block("Run:\n```\nls -la\n```\nDone.");
/// assert_eq!(extraction.content, "ls -la");
/// assert!(!extraction.is_pure_code);
/// ```
pub fn extract_first_code_block(text: &str) -> Extraction {
    let text = text.trim();
    // Also covers a fence opener that is still arriving
    if text.len() <= FENCE.len() {
        return Extraction::none();
    }

    let Some(start) = text.find(FENCE) else {
        return Extraction::none();
    };
    let after_open = &text[start + FENCE.len()..];

    let body = match strip_language_line(after_open) {
        Some(body) => body,
        None => return Extraction::none(),
    };

    let (content, trailing) = match body.find(FENCE) {
        Some(end) => (&body[..end], &body[end + FENCE.len()..]),
        None => (body, ""),
    };

    let content = strip_one_newline(content);
    if content.is_empty() {
        return Extraction::none();
    }

    Extraction {
        content: content.to_string(),
        is_pure_code: start == 0 && trailing.trim().is_empty(),
    }
}

/// Returns the block body that follows the opener, or `None` when only a
/// language hint has arrived so far
fn strip_language_line(after_open: &str) -> Option<&str> {
    let first_line_end = after_open.find('\n').unwrap_or(after_open.len());
    let first_line = &after_open[..first_line_end];

    // Single-line block such as ```ls -la```
    if first_line.contains(FENCE) {
        return Some(after_open);
    }

    let is_hint = !first_line.trim().contains(char::is_whitespace);
    match (is_hint, after_open.get(first_line_end + 1..)) {
        (true, Some(rest)) => Some(rest),
        (true, None) => None,
        (false, _) => Some(after_open),
    }
}

fn strip_one_newline(content: &str) -> &str {
    match content.strip_suffix('\n') {
        Some(stripped) => stripped.strip_suffix('\r').unwrap_or(stripped),
        None => content,
    }
}

/// Returns true when `text` begins with a fence, or could still become one
///
/// One to three backticks count as a fence opener that is still arriving,
/// so callers can treat the reply as code before the delimiter completes.
///
/// # Examples
///
/// ```
/// use shellq::code_block::starts_with_code_block;
///
/// assert!(starts_with_code_block("```bash\nls"));
/// assert!(starts_with_code_block("``"));
/// assert!(!starts_with_code_block("Sure, ```ls```"));
/// ```
pub fn starts_with_code_block(text: &str) -> bool {
    let text = text.trim();
    if text.len() <= FENCE.len() {
        return !text.is_empty() && text.chars().all(|c| c == '`');
    }
    text.starts_with(FENCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> (String, bool) {
        let e = extract_first_code_block(text);
        (e.content, e.is_pure_code)
    }

    #[test]
    fn test_no_fence_yields_empty() {
        for text in ["", "hello", "ls -la", "a `tick` or two ``", "just\nsome\nprose"] {
            assert_eq!(extract(text), (String::new(), false), "input: {text:?}");
        }
    }

    #[test]
    fn test_plain_fence() {
        assert_eq!(extract("```\nHELLO\n```"), ("HELLO".to_string(), true));
    }

    #[test]
    fn test_language_hint_is_stripped() {
        assert_eq!(
            extract("```bash\necho hi\n```"),
            ("echo hi".to_string(), true)
        );
    }

    #[test]
    fn test_first_line_with_spaces_is_content() {
        assert_eq!(
            extract("```echo hi there\nsecond\n```"),
            ("echo hi there\nsecond".to_string(), true)
        );
    }

    #[test]
    fn test_prose_around_fence_is_not_pure() {
        assert_eq!(
            extract("Sure, here:\n```\nls -la\n```\nThat lists files."),
            ("ls -la".to_string(), false)
        );
    }

    #[test]
    fn test_prose_only_before_fence_is_not_pure() {
        assert_eq!(
            extract("Try this:\n```sh\nls\n```"),
            ("ls".to_string(), false)
        );
    }

    #[test]
    fn test_trailing_whitespace_after_close_is_still_pure() {
        assert_eq!(
            extract("```sh\nls\n```\n\n  "),
            ("ls".to_string(), true)
        );
    }

    #[test]
    fn test_short_backtick_prefixes() {
        for text in ["`", "``", "```", " ``` "] {
            assert_eq!(extract(text), (String::new(), false), "input: {text:?}");
        }
    }

    #[test]
    fn test_streaming_prefixes() {
        assert_eq!(extract("```ba"), (String::new(), false));
        assert_eq!(extract("```bash\n"), (String::new(), false));
        assert_eq!(extract("```bash\nls -"), ("ls -".to_string(), true));
        assert_eq!(extract("```bash\nls -la\n"), ("ls -la".to_string(), true));
        assert_eq!(extract("```bash\nls -la\n``"), ("ls -la\n``".to_string(), true));
        assert_eq!(extract("```bash\nls -la\n```"), ("ls -la".to_string(), true));
    }

    #[test]
    fn test_streaming_extraction_grows_with_input() {
        let full = "```bash\nfind . -name '*.rs' | xargs wc -l\n```";
        let mut previous = String::new();
        for end in 0..=full.len() {
            let e = extract_first_code_block(&full[..end]);
            if !e.content.is_empty() && !previous.is_empty() && !e.content.contains(FENCE) {
                assert!(
                    e.content.starts_with(previous.trim_end_matches('`')),
                    "{:?} does not extend {:?}",
                    e.content,
                    previous
                );
            }
            if !e.content.contains('`') {
                previous = e.content;
            }
        }
        assert_eq!(previous, "find . -name '*.rs' | xargs wc -l");
    }

    #[test]
    fn test_single_line_fence() {
        assert_eq!(extract("```ls -la```"), ("ls -la".to_string(), true));
        assert_eq!(extract("```ls```"), ("ls".to_string(), true));
    }

    #[test]
    fn test_only_first_block_is_extracted() {
        let text = "```\nfirst\n```\nand\n```\nsecond\n```";
        assert_eq!(extract(text), ("first".to_string(), false));
    }

    #[test]
    fn test_empty_block_yields_empty() {
        assert_eq!(extract("```\n```"), (String::new(), false));
        assert_eq!(extract("```bash\n\n```"), (String::new(), false));
    }

    #[test]
    fn test_only_one_trailing_newline_is_stripped() {
        assert_eq!(extract("```\nfoo\n\n```"), ("foo\n".to_string(), true));
    }

    #[test]
    fn test_crlf_line_endings() {
        assert_eq!(extract("```\r\ndir\r\n```"), ("dir".to_string(), true));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        for text in [
            "```bash\necho hi\n```",
            "```\nfoo\n\n```",
            "Sure:\n```\nls\n-la\n```\nok",
            "```\n\nindented\n```",
        ] {
            let once = extract_first_code_block(text).content;
            let rewrapped = format!("```\n{once}\n```");
            let twice = extract_first_code_block(&rewrapped).content;
            assert_eq!(once, twice, "input: {text:?}");
        }
    }

    #[test]
    fn test_starts_with_code_block() {
        assert!(starts_with_code_block("```"));
        assert!(starts_with_code_block("`"));
        assert!(starts_with_code_block("``"));
        assert!(starts_with_code_block("  ```bash\nls"));
        assert!(!starts_with_code_block(""));
        assert!(!starts_with_code_block("ls"));
        assert!(!starts_with_code_block("`a"));
        assert!(!starts_with_code_block("Here is ```ls```"));
    }
}
