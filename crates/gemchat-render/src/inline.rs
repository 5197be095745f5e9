use crate::segment::Span;
use once_cell::sync::Lazy;
use regex::Regex;

// Leftmost-first, lazy: the first closing delimiter wins and bold is tried
// before italic at each position.
static EMPHASIS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*(?P<bold>.+?)\*\*|\*(?P<italic>.+?)\*").expect("valid emphasis pattern")
});

/// Split a line into plain, bold and italic spans.
///
/// Delimiters do not nest and must enclose at least one character; anything
/// unmatched, including a dangling `*` or `**`, stays in a plain span.
pub fn parse_inline(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in EMPHASIS.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };

        push_plain(&mut spans, &text[last..whole.start()]);

        if let Some(bold) = caps.name("bold") {
            spans.push(Span::Bold(bold.as_str().to_string()));
        } else if let Some(italic) = caps.name("italic") {
            spans.push(Span::Italic(italic.as_str().to_string()));
        }

        last = whole.end();
    }

    push_plain(&mut spans, &text[last..]);
    spans
}

fn push_plain(spans: &mut Vec<Span>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Span::Plain(existing)) = spans.last_mut() {
        existing.push_str(text);
    } else {
        spans.push(Span::Plain(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> Span {
        Span::Plain(text.to_string())
    }

    fn bold(text: &str) -> Span {
        Span::Bold(text.to_string())
    }

    fn italic(text: &str) -> Span {
        Span::Italic(text.to_string())
    }

    #[test]
    fn test_bold_and_italic() {
        assert_eq!(
            parse_inline("**bold** and *italic*"),
            vec![bold("bold"), plain(" and "), italic("italic")]
        );
    }

    #[test]
    fn test_plain_only() {
        assert_eq!(parse_inline("just text"), vec![plain("just text")]);
        assert!(parse_inline("").is_empty());
    }

    #[test]
    fn test_first_close_wins() {
        assert_eq!(
            parse_inline("*a* b *c*"),
            vec![italic("a"), plain(" b "), italic("c")]
        );
        assert_eq!(
            parse_inline("**a** **b**"),
            vec![bold("a"), plain(" "), bold("b")]
        );
    }

    #[test]
    fn test_single_asterisk_inside_bold() {
        assert_eq!(parse_inline("**a*b**"), vec![bold("a*b")]);
    }

    #[test]
    fn test_unclosed_delimiters_stay_literal() {
        assert_eq!(parse_inline("**bo"), vec![plain("**bo")]);
        assert_eq!(parse_inline("2 * 3 = 6"), vec![plain("2 * 3 = 6")]);
        assert_eq!(parse_inline("**"), vec![plain("**")]);
    }

    #[test]
    fn test_streaming_prefixes_settle() {
        // As the closing delimiter streams in the span switches from literal to bold
        assert_eq!(parse_inline("say **hi*"), vec![plain("say "), italic("*hi")]);
        assert_eq!(parse_inline("say **hi**"), vec![plain("say "), bold("hi")]);
    }
}
