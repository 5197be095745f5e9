//! Terminal formatting for parsed segments

use crate::segment::{Segment, Span};
use crossterm::style::{StyledContent, Stylize};
use std::fmt;
use unicode_width::UnicodeWidthStr;

/// One output line built from styled pieces
#[derive(Debug, Clone, Default)]
pub struct StyledLine {
    pieces: Vec<StyledContent<String>>,
}

impl StyledLine {
    pub fn new(pieces: Vec<StyledContent<String>>) -> Self {
        Self { pieces }
    }

    fn push(&mut self, piece: StyledContent<String>) {
        self.pieces.push(piece);
    }

    /// Display width in terminal columns, ignoring styling
    pub fn width(&self) -> usize {
        self.pieces
            .iter()
            .map(|piece| piece.content().width())
            .sum()
    }

    /// Screen rows the line takes once wrapped at `columns`
    pub fn rows(&self, columns: u16) -> usize {
        let columns = usize::from(columns.max(1));
        self.width().div_ceil(columns).max(1)
    }
}

impl fmt::Display for StyledLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for piece in &self.pieces {
            write!(f, "{}", piece)?;
        }
        Ok(())
    }
}

/// Total screen rows for `lines` at `columns`
pub fn screen_rows(lines: &[StyledLine], columns: u16) -> usize {
    lines.iter().map(|line| line.rows(columns)).sum()
}

/// Lay segments out as terminal lines.
///
/// Bold and italic keep their emphasis, lists get `N. ` or `• ` markers, and
/// code blocks are framed by a header naming the language.
pub fn render_lines(segments: &[Segment]) -> Vec<StyledLine> {
    let mut lines = Vec::new();

    for segment in segments {
        match segment {
            Segment::Paragraph(spans) => {
                let mut line = StyledLine::default();
                push_spans(&mut line, spans);
                lines.push(line);
            }
            Segment::List { ordered, items } => {
                for (index, item) in items.iter().enumerate() {
                    let marker = if *ordered {
                        format!("  {}. ", index + 1)
                    } else {
                        "  • ".to_string()
                    };
                    let mut line = StyledLine::new(vec![marker.stylize()]);
                    push_spans(&mut line, item);
                    lines.push(line);
                }
            }
            Segment::CodeBlock { language, code } => {
                let label = language.as_deref().unwrap_or("code");
                lines.push(StyledLine::new(vec![format!("┌─ {}", label).dim()]));
                for code_line in code.lines() {
                    lines.push(StyledLine::new(vec![
                        "│".to_string().dim(),
                        format!(" {}", code_line).stylize(),
                    ]));
                }
                lines.push(StyledLine::new(vec!["└─".to_string().dim()]));
            }
        }
    }

    lines
}

fn push_spans(line: &mut StyledLine, spans: &[Span]) {
    for span in spans {
        let piece = match span {
            Span::Plain(text) => text.clone().stylize(),
            Span::Bold(text) => text.clone().bold(),
            Span::Italic(text) => text.clone().italic(),
        };
        line.push(piece);
    }
}
