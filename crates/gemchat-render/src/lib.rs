//! # gemchat Render
//!
//! Turns model text into renderable structure: fenced code blocks, ordered and
//! unordered lists, paragraphs, and bold/italic spans inside them.
//!
//! The parser is a pure function over the whole accumulated text, so it can be
//! re-run on every streamed chunk. Partial markup degrades to literal text:
//! an unclosed fence or a dangling `*` simply shows up as written until the
//! closing delimiter arrives.
//!
//! ```
//! use gemchat_render::{parse, Segment};
//!
//! let segments = parse("**Note:** see below\n- one\n- two");
//! assert_eq!(segments.len(), 2);
//! assert!(matches!(&segments[1], Segment::List { ordered: false, items } if items.len() == 2));
//! ```

mod incremental;
mod inline;
mod parser;
mod segment;
pub mod terminal;

pub use incremental::StreamRenderer;
pub use inline::parse_inline;
pub use parser::parse;
pub use segment::{Segment, Span};
pub use terminal::{StyledLine, render_lines, screen_rows};
