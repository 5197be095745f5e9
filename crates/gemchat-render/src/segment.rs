use serde::Serialize;

/// A block of rendered content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum Segment {
    Paragraph(Vec<Span>),
    List {
        ordered: bool,
        items: Vec<Vec<Span>>,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
}

/// Inline run of text within a paragraph or list item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "style", content = "text", rename_all = "snake_case")]
pub enum Span {
    Plain(String),
    Bold(String),
    Italic(String),
}

impl Span {
    pub fn text(&self) -> &str {
        match self {
            Span::Plain(text) | Span::Bold(text) | Span::Italic(text) => text,
        }
    }
}

impl Segment {
    /// Visible text of the segment with all markup removed
    pub fn plain_text(&self) -> String {
        match self {
            Segment::Paragraph(spans) => spans.iter().map(Span::text).collect(),
            Segment::List { items, .. } => items
                .iter()
                .map(|item| item.iter().map(Span::text).collect::<String>())
                .collect::<Vec<_>>()
                .join("\n"),
            Segment::CodeBlock { code, .. } => code.clone(),
        }
    }
}
