use crate::inline::parse_inline;
use crate::segment::Segment;
use once_cell::sync::Lazy;
use regex::Regex;

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?P<body>.*?)```").expect("valid fence pattern"));

static ORDERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\s(?P<rest>.*)$").expect("valid ordered item pattern"));

static UNORDERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-*]\s(?P<rest>.*)$").expect("valid unordered item pattern"));

/// Parse the full text of a message into segments.
///
/// Total over any input: malformed markup is rendered as literal text.
pub fn parse(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in FENCE.captures_iter(text) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.name("body")) else {
            continue;
        };

        parse_prose(&text[last..whole.start()], &mut segments);
        segments.push(code_block(body.as_str()));
        last = whole.end();
    }

    parse_prose(&text[last..], &mut segments);
    segments
}

/// Byte offset just past the last closed fence, if any
pub(crate) fn last_fence_end(text: &str) -> Option<usize> {
    FENCE.find_iter(text).last().map(|m| m.end())
}

fn code_block(body: &str) -> Segment {
    if let Some((first, rest)) = body.split_once('\n') {
        let tag = first.trim();
        if !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphabetic()) {
            return Segment::CodeBlock {
                language: Some(tag.to_string()),
                code: rest.trim_end_matches(['\n', '\r']).to_string(),
            };
        }
    }

    Segment::CodeBlock {
        language: None,
        code: body.to_string(),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Ordered,
    Unordered,
}

enum Line<'a> {
    Blank,
    Item(ListKind, &'a str),
    Paragraph(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    if line.trim().is_empty() {
        return Line::Blank;
    }
    if let Some(rest) = ORDERED_ITEM.captures(line).and_then(|c| c.name("rest")) {
        return Line::Item(ListKind::Ordered, rest.as_str());
    }
    if let Some(rest) = UNORDERED_ITEM.captures(line).and_then(|c| c.name("rest")) {
        return Line::Item(ListKind::Unordered, rest.as_str());
    }
    Line::Paragraph(line)
}

struct OpenList {
    kind: ListKind,
    items: Vec<Vec<crate::Span>>,
}

impl OpenList {
    fn close(self) -> Segment {
        Segment::List {
            ordered: self.kind == ListKind::Ordered,
            items: self.items,
        }
    }
}

fn parse_prose(prose: &str, segments: &mut Vec<Segment>) {
    if prose.is_empty() {
        return;
    }

    let mut open: Option<OpenList> = None;

    for line in prose.split('\n') {
        match classify(line) {
            Line::Blank => {
                if let Some(list) = open.take() {
                    segments.push(list.close());
                }
            }
            Line::Item(kind, rest) => {
                if let Some(list) = open.take_if(|list| list.kind != kind) {
                    segments.push(list.close());
                }
                open.get_or_insert_with(|| OpenList {
                    kind,
                    items: Vec::new(),
                })
                .items
                .push(parse_inline(rest));
            }
            Line::Paragraph(text) => {
                if let Some(list) = open.take() {
                    segments.push(list.close());
                }
                segments.push(Segment::Paragraph(parse_inline(text)));
            }
        }
    }

    if let Some(list) = open.take() {
        segments.push(list.close());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Span;

    fn plain(text: &str) -> Vec<Span> {
        vec![Span::Plain(text.to_string())]
    }

    #[test]
    fn test_empty_text() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n  \n").is_empty());
    }

    #[test]
    fn test_paragraph_per_line() {
        assert_eq!(
            parse("first line\nsecond line"),
            vec![
                Segment::Paragraph(plain("first line")),
                Segment::Paragraph(plain("second line")),
            ]
        );
    }

    #[test]
    fn test_ordered_list() {
        assert_eq!(
            parse("1. one\n2. two"),
            vec![Segment::List {
                ordered: true,
                items: vec![plain("one"), plain("two")],
            }]
        );
    }

    #[test]
    fn test_unordered_list() {
        assert_eq!(
            parse("- a\n- b"),
            vec![Segment::List {
                ordered: false,
                items: vec![plain("a"), plain("b")],
            }]
        );
        assert_eq!(
            parse("* a\n* b"),
            vec![Segment::List {
                ordered: false,
                items: vec![plain("a"), plain("b")],
            }]
        );
    }

    #[test]
    fn test_mixed_list_kinds_split() {
        assert_eq!(
            parse("1. one\n- a\n2. two"),
            vec![
                Segment::List {
                    ordered: true,
                    items: vec![plain("one")],
                },
                Segment::List {
                    ordered: false,
                    items: vec![plain("a")],
                },
                Segment::List {
                    ordered: true,
                    items: vec![plain("two")],
                },
            ]
        );
    }

    #[test]
    fn test_blank_line_closes_list() {
        assert_eq!(
            parse("- a\n\n- b"),
            vec![
                Segment::List {
                    ordered: false,
                    items: vec![plain("a")],
                },
                Segment::List {
                    ordered: false,
                    items: vec![plain("b")],
                },
            ]
        );
    }

    #[test]
    fn test_list_item_inline_formatting() {
        assert_eq!(
            parse("- **key**: value"),
            vec![Segment::List {
                ordered: false,
                items: vec![vec![
                    Span::Bold("key".to_string()),
                    Span::Plain(": value".to_string()),
                ]],
            }]
        );
    }

    #[test]
    fn test_marker_needs_whitespace() {
        assert_eq!(parse("-a"), vec![Segment::Paragraph(plain("-a"))]);
        assert_eq!(parse("3.14 is pi"), vec![Segment::Paragraph(plain("3.14 is pi"))]);
    }

    #[test]
    fn test_code_block_with_language() {
        assert_eq!(
            parse("Here:\n```rust\nfn main() {}\n```\nDone"),
            vec![
                Segment::Paragraph(plain("Here:")),
                Segment::CodeBlock {
                    language: Some("rust".to_string()),
                    code: "fn main() {}".to_string(),
                },
                Segment::Paragraph(plain("Done")),
            ]
        );
    }

    #[test]
    fn test_code_block_without_language() {
        assert_eq!(
            parse("```let x = 1;```"),
            vec![Segment::CodeBlock {
                language: None,
                code: "let x = 1;".to_string(),
            }]
        );
        // A first line that is not a bare word is code, not a tag
        assert_eq!(
            parse("```c++\nint x;\n```"),
            vec![Segment::CodeBlock {
                language: None,
                code: "c++\nint x;\n".to_string(),
            }]
        );
    }

    #[test]
    fn test_code_block_keeps_markup_literal() {
        assert_eq!(
            parse("```md\n- **not** a list\n```"),
            vec![Segment::CodeBlock {
                language: Some("md".to_string()),
                code: "- **not** a list".to_string(),
            }]
        );
    }

    #[test]
    fn test_unclosed_fence_is_literal() {
        assert_eq!(
            parse("see:\n```python\nprint(1)"),
            vec![
                Segment::Paragraph(plain("see:")),
                Segment::Paragraph(plain("```python")),
                Segment::Paragraph(plain("print(1)")),
            ]
        );
    }

    #[test]
    fn test_code_block_count_matches_fences() {
        let text = "a\n```\nx\n```\nb\n```js\ny\n```\n``````";
        let markers = text.matches("```").count();
        let blocks = parse(text)
            .iter()
            .filter(|s| matches!(s, Segment::CodeBlock { .. }))
            .count();
        assert_eq!(markers, 6);
        assert_eq!(blocks, markers / 2);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = "# Title\n1. **one**\n2. *two*\n```sh\nls -la\n```\n- tail *x";
        assert_eq!(parse(text), parse(text));
    }

    #[test]
    fn test_prose_survives_without_markers() {
        let text = "Intro with **bold** text\n- item *one*\n2. item two";
        let visible: Vec<String> = parse(text).iter().map(Segment::plain_text).collect();
        assert_eq!(
            visible,
            vec!["Intro with bold text", "item one", "item two"]
        );
    }

    #[test]
    fn test_last_fence_end() {
        assert_eq!(last_fence_end("no fences"), None);
        assert_eq!(last_fence_end("```a``` x ```b``` tail"), Some(17));
        assert_eq!(last_fence_end("```a``` x ```open"), Some(7));
    }
}
