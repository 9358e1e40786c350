//! Removes markdown code fences that models like to wrap around JSON payloads.

const FENCE: &str = "```";

/// Strips surrounding code fences from a raw completion.
///
/// When the trimmed text starts with a fence, the opening line (including any
/// language tag such as ```` ```json ````) is dropped, and so is the last line
/// if it is a closing fence. This repeats while the remainder still starts
/// with a fence, so `clean(clean(x)) == clean(x)` holds for any input.
/// Text without a leading fence is only trimmed.
///
/// # Examples
///
/// ```
/// use moodline::cleaner::clean;
///
/// assert_eq!(clean("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(clean("  {\"a\": 1}  "), "{\"a\": 1}");
/// ```
pub fn clean(raw: &str) -> String {
    let mut text = raw.trim();
    while text.starts_with(FENCE) {
        text = strip_fence_lines(text);
    }
    text.to_string()
}

fn strip_fence_lines(text: &str) -> &str {
    // Drop the opening fence line.
    let body = match text.find('\n') {
        Some(idx) => &text[idx + 1..],
        None => return "",
    };

    let body = body.trim_end();
    let body = match body.rfind('\n') {
        Some(idx) if is_fence_line(&body[idx + 1..]) => &body[..idx],
        None if is_fence_line(body) => "",
        _ => body,
    };
    body.trim()
}

fn is_fence_line(line: &str) -> bool {
    line.trim().starts_with(FENCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_annotated_fence() {
        let raw = "```json\n{\"finalMessage\": \"hi\"}\n```";
        assert_eq!(clean(raw), "{\"finalMessage\": \"hi\"}");
    }

    #[test]
    fn strips_bare_fence_with_surrounding_whitespace() {
        let raw = "\n\n```\n{\"a\": 1}\n```\n  ";
        assert_eq!(clean(raw), "{\"a\": 1}");
    }

    #[test]
    fn keeps_body_when_closing_fence_missing() {
        let raw = "```json\n{\"a\": 1}";
        assert_eq!(clean(raw), "{\"a\": 1}");
    }

    #[test]
    fn leaves_unfenced_text_alone_apart_from_trim() {
        assert_eq!(clean("  plain {\"a\": 1} ``` "), "plain {\"a\": 1} ```");
    }

    #[test]
    fn lone_fence_cleans_to_empty() {
        assert_eq!(clean("```"), "");
        assert_eq!(clean("```json\n```"), "");
    }

    #[test]
    fn multiline_body_is_preserved() {
        let raw = "```\n{\n  \"a\": 1,\n  \"b\": 2\n}\n```";
        assert_eq!(clean(raw), "{\n  \"a\": 1,\n  \"b\": 2\n}");
    }

    #[test]
    fn idempotent_on_awkward_inputs() {
        let inputs = [
            "",
            "   ",
            "{}",
            "```",
            "```\n```json\n{}\n```",
            "```json\n```\n{}\n```\n```",
            "``` \n  ```\n",
            "text\n```\nmore\n```",
            "```json\n{\"a\": \"```\"}\n```",
            "\t```yaml\nkey: value",
        ];
        for input in inputs {
            let once = clean(input);
            assert_eq!(clean(&once), once, "not idempotent for {input:?}");
        }
    }
}
