//! Line-oriented command parsing for the interactive front end.

use std::str::FromStr;

use thiserror::Error;

use crate::monitor::{Command, ThresholdSpec};

/// Help text listing the accepted commands.
pub const HELP: &str = "\
commands:
  target <host|name>        probe a different host
  thresholds <preset|g w>   tight, normal, relaxed, or e.g. \"80 150\"
  autostart on|off          launch at login
  start | stop              control the probe loop
  status                    show the latest result
  settings                  show current settings
  targets                   list named targets
  help                      show this help
  quit                      exit";

/// Console parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("invalid argument for '{command}': {reason}")]
    InvalidArgument {
        command: &'static str,
        reason: String,
    },
}

/// One line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    /// A change forwarded to the monitor.
    Monitor(Command),
    ShowStatus,
    ShowSettings,
    ListTargets,
    Help,
    Quit,
    /// Blank input.
    Empty,
}

impl FromStr for ConsoleLine {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let parsed = match word.to_ascii_lowercase().as_str() {
            "" => Self::Empty,
            "target" => {
                if rest.is_empty() {
                    return Err(ConsoleError::MissingArgument("target"));
                }
                Self::Monitor(Command::SetTarget(rest.to_string()))
            }
            "thresholds" => {
                if rest.is_empty() {
                    return Err(ConsoleError::MissingArgument("thresholds"));
                }
                let spec = rest.parse::<ThresholdSpec>().map_err(|e| {
                    ConsoleError::InvalidArgument {
                        command: "thresholds",
                        reason: e.to_string(),
                    }
                })?;
                Self::Monitor(Command::SetThresholds(spec))
            }
            "autostart" => Self::Monitor(Command::SetAutostart(parse_switch(rest)?)),
            "start" => Self::Monitor(Command::Start),
            "stop" => Self::Monitor(Command::Stop),
            "status" => Self::ShowStatus,
            "settings" => Self::ShowSettings,
            "targets" => Self::ListTargets,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(ConsoleError::UnknownCommand(other.to_string())),
        };
        Ok(parsed)
    }
}

fn parse_switch(arg: &str) -> Result<bool, ConsoleError> {
    match arg.to_ascii_lowercase().as_str() {
        "" => Err(ConsoleError::MissingArgument("autostart")),
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(ConsoleError::InvalidArgument {
            command: "autostart",
            reason: format!("expected on or off, got '{other}'"),
        }),
    }
}
