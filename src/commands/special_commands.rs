//! Special commands parser for interactive chat mode
//!
//! Commands are prefixed with `/` and are case-insensitive. Anything else
//! (except the bare words `exit` and `quit`) is a message for the backend.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an argument it does not take
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Edit the system prompt; with text, set it directly
    Prompt(Option<String>),

    /// Clear the session's history on the backend
    Reset,

    /// Re-fetch and print the thread
    History,

    /// Show the current session id
    ShowSession,

    /// Display help information
    Help,

    /// Leave the chat
    Exit,

    /// Not a special command
    None,
}

/// Parse a user input string into a special command
///
/// # Examples
///
/// ```
/// use chatline::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/reset").unwrap(), SpecialCommand::Reset);
/// assert_eq!(
///     parse_special_command("/prompt Be terse.").unwrap(),
///     SpecialCommand::Prompt(Some("Be terse.".to_string()))
/// );
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    let no_args = |cmd: SpecialCommand| {
        if rest.is_empty() {
            Ok(cmd)
        } else {
            Err(CommandError::UnsupportedArgument {
                command: command.clone(),
                arg: rest.to_string(),
            })
        }
    };

    match command.as_str() {
        "/prompt" | "/system" => Ok(SpecialCommand::Prompt(
            (!rest.is_empty()).then(|| rest.to_string()),
        )),
        "/reset" | "/clear" => no_args(SpecialCommand::Reset),
        "/history" => no_args(SpecialCommand::History),
        "/session" | "/status" => no_args(SpecialCommand::ShowSession),
        "/help" | "/?" => no_args(SpecialCommand::Help),
        "/exit" | "/quit" | "exit" | "quit" => no_args(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print chat help
pub fn print_help() {
    println!(
        r#"
Chat Commands
=============

  /prompt [TEXT]   Edit the session's system prompt (or set it to TEXT)
  /reset           Clear this session's message history
  /history         Re-fetch and print the conversation
  /session         Show the current session id
  /help            Show this help
  /exit, exit      Leave the chat

Anything else is sent to the assistant.
"#
    );
}
