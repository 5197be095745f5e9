use crate::parser::{last_fence_end, parse};
use crate::segment::Segment;

/// Re-renders a growing message without re-parsing settled text.
///
/// Everything up to the end of the last closed fence can no longer change as
/// more text is appended, so its segments are cached. `update` always returns
/// exactly what [`parse`] would return for the same text.
#[derive(Debug, Default)]
pub struct StreamRenderer {
    settled_text: String,
    settled: Vec<Segment>,
}

impl StreamRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, text: &str) -> Vec<Segment> {
        if !text.starts_with(self.settled_text.as_str()) {
            // Replaced rather than extended (failure notice, new chat)
            self.reset();
        }

        let mut tail = &text[self.settled_text.len()..];

        if let Some(end) = last_fence_end(tail) {
            self.settled.extend(parse(&tail[..end]));
            self.settled_text.push_str(&tail[..end]);
            tail = &tail[end..];
        }

        let mut segments = self.settled.clone();
        segments.extend(parse(tail));
        segments
    }

    pub fn reset(&mut self) {
        self.settled_text.clear();
        self.settled.clear();
    }

    /// Length in bytes of the prefix that is no longer re-parsed
    pub fn settled_len(&self) -> usize {
        self.settled_text.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = "Sure! Here is a **quick** example:\n\n1. Install it\n2. Run *this*:\n```bash\ncargo run\n```\nThen compare with:\n```python\nprint('hi')\n```\n- done\n- *really* done";

    fn char_prefixes(text: &str) -> impl Iterator<Item = &str> {
        text.char_indices()
            .map(|(i, c)| &text[..i + c.len_utf8()])
    }

    #[test]
    fn test_matches_full_parse_for_every_prefix() {
        let mut renderer = StreamRenderer::new();
        for prefix in char_prefixes(REPLY) {
            assert_eq!(renderer.update(prefix), parse(prefix), "prefix: {prefix:?}");
        }
        assert!(renderer.settled_len() > 0);
    }

    #[test]
    fn test_matches_full_parse_for_token_chunks() {
        let mut renderer = StreamRenderer::new();
        let mut accumulated = String::new();
        for chunk in REPLY.split_inclusive(' ') {
            accumulated.push_str(chunk);
            assert_eq!(renderer.update(&accumulated), parse(&accumulated));
        }
    }

    #[test]
    fn test_resets_when_text_is_replaced() {
        let mut renderer = StreamRenderer::new();
        renderer.update("```a```\npartial");
        assert_eq!(renderer.settled_len(), 7);

        let notice = "Sorry, something went wrong: boom";
        assert_eq!(renderer.update(notice), parse(notice));
        assert_eq!(renderer.settled_len(), 0);
    }
}
