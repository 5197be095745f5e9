//! Terminal presentation of the conversation

use crossterm::cursor::MoveToPreviousLine;
use crossterm::queue;
use crossterm::style::Stylize;
use crossterm::terminal::{self, Clear, ClearType};
use gemchat_core::{Message, Role};
use gemchat_render::{Segment, StreamRenderer, StyledLine, parse, render_lines, screen_rows};
use gemchat_session::ConversationState;
use std::io::{self, IsTerminal, Write};

/// Used when the terminal size cannot be queried
const FALLBACK_COLUMNS: u16 = 80;

/// Redraws the streaming model message on every state change.
///
/// On a terminal the message is drawn in place; otherwise only the settled
/// message is printed, without markup.
pub struct LiveView {
    renderer: StreamRenderer,
    message_id: Option<String>,
    /// Screen rows taken by the frame currently on screen
    drawn_rows: usize,
    interactive: bool,
}

impl Default for LiveView {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveView {
    pub fn new() -> Self {
        Self {
            renderer: StreamRenderer::new(),
            message_id: None,
            drawn_rows: 0,
            interactive: io::stdout().is_terminal(),
        }
    }

    /// Redraw the latest model message
    pub fn draw(&mut self, state: &ConversationState) -> io::Result<()> {
        if !self.interactive {
            return Ok(());
        }
        let columns = terminal::size()
            .map(|(columns, _)| columns)
            .unwrap_or(FALLBACK_COLUMNS);
        let mut out = io::stdout().lock();
        self.redraw(&mut out, state, columns)
    }

    /// Final draw once the turn settled, followed by the error banner if any
    pub fn finish(&mut self, state: &ConversationState) -> io::Result<()> {
        if self.interactive {
            self.draw(state)?;
        } else if let Some(message) = latest_model(state) {
            let plain: Vec<String> = parse(message.text()).iter().map(Segment::plain_text).collect();
            println!("{}", plain.join("\n"));
        }

        if let Some(error) = &state.error {
            print_banner(error);
        }

        self.message_id = None;
        self.drawn_rows = 0;
        self.renderer.reset();
        io::stdout().flush()
    }

    fn redraw<W: Write>(&mut self, out: &mut W, state: &ConversationState, columns: u16) -> io::Result<()> {
        let Some(lines) = self.frame(state) else {
            return Ok(());
        };

        if self.drawn_rows > 0 {
            // Back to the first row of the previous frame, then clear below
            let rows = u16::try_from(self.drawn_rows).unwrap_or(u16::MAX);
            queue!(out, MoveToPreviousLine(rows), Clear(ClearType::FromCursorDown))?;
        }
        for line in &lines {
            writeln!(out, "{}", line)?;
        }
        out.flush()?;

        self.drawn_rows = screen_rows(&lines, columns);
        Ok(())
    }

    fn frame(&mut self, state: &ConversationState) -> Option<Vec<StyledLine>> {
        let message = latest_model(state)?;

        if self.message_id.as_deref() != Some(message.id.as_str()) {
            self.renderer.reset();
            self.drawn_rows = 0;
            self.message_id = Some(message.id.clone());
        }

        if message.text().is_empty() && state.is_loading {
            return Some(vec![StyledLine::new(vec!["Thinking...".to_string().dim()])]);
        }
        Some(render_lines(&self.renderer.update(message.text())))
    }
}

fn latest_model(state: &ConversationState) -> Option<&Message> {
    state.messages().last().filter(|m| m.role == Role::Model)
}

pub fn print_banner(error: &str) {
    println!("{}", "An Error Occurred".red().bold());
    println!("{}", error.red());
}

/// Title and starter prompts for an empty conversation
pub fn print_welcome(suggestions: &[(&str, &str)]) {
    println!("{}", "Gemini Chat".bold());
    println!("How can I help you today?\n");
    for (index, (title, prompt)) in suggestions.iter().enumerate() {
        println!("  {}", format!("{}. {}", index + 1, title).bold());
        println!("     {}", prompt.dim());
    }
    println!("\n{}", "Type a message, or /help for commands.".dim());
}

/// Label printed above each model reply
pub fn print_model_label() {
    println!("{}", "Gemini".bold());
}
