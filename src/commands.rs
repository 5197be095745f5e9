//! Prompt input parsing

use std::path::PathBuf;

/// Starter prompts offered while the conversation is empty
pub const SUGGESTIONS: [(&str, &str); 4] = [
    (
        "Create a story",
        "Tell me a short story about a brave knight and a friendly dragon.",
    ),
    (
        "Debug my code",
        "I have a Javascript function that is not working. Here is the code: `function example() { return 1 + \"1\" }`. What is wrong with it?",
    ),
    (
        "Brainstorm ideas",
        "Brainstorm three creative and catchy names for a new coffee shop.",
    ),
    (
        "Design a color palette",
        "Create a color palette for a website with a calm and professional feel.",
    ),
];

pub const HELP: &str = "\
Commands:
  /new            start a new chat
  /image <path>   attach an image to the next message
  /remove         drop the attached image
  /suggest <n>    send starter prompt n (1-4)
  /help           show this help
  /quit           exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    NewChat,
    Attach(PathBuf),
    RemoveAttachment,
    Suggest(usize),
    Help,
    Quit,
    /// Blank input
    Nothing,
}

/// Parse one line of input; `Err` carries a message for the user
pub fn parse_command(line: &str) -> Result<Command, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Command::Nothing);
    }

    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(Command::Send(line.trim_end_matches(['\r', '\n']).to_string()));
    };

    let (name, argument) = match rest.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (rest, ""),
    };

    match name {
        "new" => Ok(Command::NewChat),
        "remove" => Ok(Command::RemoveAttachment),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "image" if argument.is_empty() => Err("Usage: /image <path>".to_string()),
        "image" => Ok(Command::Attach(PathBuf::from(argument))),
        "suggest" => match argument.parse::<usize>() {
            Ok(n) if (1..=SUGGESTIONS.len()).contains(&n) => Ok(Command::Suggest(n)),
            _ => Err(format!("Usage: /suggest <1-{}>", SUGGESTIONS.len())),
        },
        other => Err(format!("Unknown command: /{}. Type /help for commands.", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_sent() {
        assert_eq!(
            parse_command("  hello there\n").unwrap(),
            Command::Send("  hello there".to_string())
        );
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(parse_command("   ").unwrap(), Command::Nothing);
    }

    #[test]
    fn test_commands() {
        assert_eq!(parse_command("/new").unwrap(), Command::NewChat);
        assert_eq!(parse_command("/quit").unwrap(), Command::Quit);
        assert_eq!(parse_command("/remove").unwrap(), Command::RemoveAttachment);
        assert_eq!(
            parse_command("/image ./cat photo.png").unwrap(),
            Command::Attach(PathBuf::from("./cat photo.png"))
        );
        assert_eq!(parse_command("/suggest 2").unwrap(), Command::Suggest(2));
    }

    #[test]
    fn test_invalid_commands() {
        assert!(parse_command("/image").is_err());
        assert!(parse_command("/suggest 9").is_err());
        assert!(parse_command("/suggest x").is_err());
        assert!(parse_command("/bogus").unwrap_err().contains("/bogus"));
    }
}
