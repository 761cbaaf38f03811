//! Console command parsing

use std::str::FromStr;

use thiserror::Error;

/// A line typed on the control console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Volume(i32),
    Latency(i32),
    Start,
    Stop,
    Status,
    Clear,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),

    #[error("`{0}` needs a number")]
    MissingArgument(&'static str),

    #[error("not a number: {0}")]
    InvalidNumber(String),
}

pub const HELP: &str = "\
commands:
  volume <0-100>    set monitoring volume
  latency <5-100>   set latency in ms (restarts a running stream)
  start | stop      toggle monitoring
  status            show engine state
  clear             clear the last error
  quit              stop monitoring and exit";

impl FromStr for ConsoleCommand {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(ParseCommandError::Empty)?;

        let command = match verb.to_ascii_lowercase().as_str() {
            "v" | "vol" | "volume" => ConsoleCommand::Volume(number(words.next(), "volume")?),
            "l" | "lat" | "latency" => ConsoleCommand::Latency(number(words.next(), "latency")?),
            "start" | "on" => ConsoleCommand::Start,
            "stop" | "off" => ConsoleCommand::Stop,
            "s" | "status" => ConsoleCommand::Status,
            "clear" => ConsoleCommand::Clear,
            "h" | "?" | "help" => ConsoleCommand::Help,
            "q" | "quit" | "exit" => ConsoleCommand::Quit,
            other => return Err(ParseCommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn number(word: Option<&str>, verb: &'static str) -> Result<i32, ParseCommandError> {
    let word = word.ok_or(ParseCommandError::MissingArgument(verb))?;
    word.parse()
        .map_err(|_| ParseCommandError::InvalidNumber(word.to_string()))
}
