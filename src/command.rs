//! # Commands written to the server's console.
//!
//! A command is either a raw text line or an ordered list of tokens. Tokens
//! are JSON values: scalars render as their plain text form, while objects
//! and arrays render via compact JSON serialization (the form the server's
//! own command syntax expects for structured arguments such as `title`
//! payloads). Tokens are joined with exactly one space.

use serde_json::Value;

/// Platform line terminator appended to every rendered command before it is
/// written to the child's input stream.
pub const LINE_ENDING: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// A console command, before rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A pre-rendered line, written as-is.
    Raw(String),
    /// An ordered token list, rendered and joined with single spaces.
    Args(Vec<Value>),
}

impl Command {
    /// Renders the command to the text line written to the server console.
    ///
    /// The line terminator is not included; the write channel appends it.
    pub fn render(&self) -> String {
        match self {
            Command::Raw(line) => line.clone(),
            Command::Args(args) => args
                .iter()
                .map(render_token)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn render_token(token: &Value) -> String {
    match token {
        Value::String(s) => s.clone(),
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string(token).unwrap_or_default()
        }
        scalar => scalar.to_string(),
    }
}

impl From<&str> for Command {
    fn from(line: &str) -> Self {
        Command::Raw(line.to_string())
    }
}

impl From<String> for Command {
    fn from(line: String) -> Self {
        Command::Raw(line)
    }
}

impl From<Vec<Value>> for Command {
    fn from(args: Vec<Value>) -> Self {
        Command::Args(args)
    }
}
