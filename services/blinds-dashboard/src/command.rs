//! Blinds commands and the classification of control replies

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A command accepted by the blinds controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Open,
    Close,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Open => "open",
            Command::Close => "close",
        }
    }

    /// Label of the dashboard button bound to this command
    pub fn button_label(&self) -> &'static str {
        match self {
            Command::Open => "Open Blinds",
            Command::Close => "Close Blinds",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = crate::DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Command::Open),
            "close" => Ok(Command::Close),
            other => Err(crate::DashboardError::Command(format!(
                "Unknown command '{}'",
                other
            ))),
        }
    }
}

/// Body of a `POST /control` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: Command,
}

/// Reply from `/control`. Only the echoed command is inspected.
#[derive(Debug, Clone, Default, Deserialize)]
struct ControlReply {
    #[serde(default)]
    command: Option<serde_json::Value>,
}

/// How a control reply relates to the command that was sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// The device echoed the command that was sent
    Confirmed,
    /// The reply decoded but did not echo the command
    Mismatched { echoed: Option<String> },
    /// Transport failure or undecodable reply
    Failed { reason: String },
}

impl CommandOutcome {
    /// Classify a decoded-or-not `/control` reply body against the sent command
    pub fn classify(sent: Command, body: &str) -> Self {
        let reply: ControlReply = match serde_json::from_str(body) {
            Ok(reply) => reply,
            Err(e) => {
                return CommandOutcome::Failed {
                    reason: format!("Undecodable control reply: {}", e),
                }
            }
        };

        let echoed = reply.command.map(|value| match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });

        match echoed {
            Some(ref echoed) if echoed == sent.as_str() => CommandOutcome::Confirmed,
            echoed => CommandOutcome::Mismatched { echoed },
        }
    }
}

/// The command the device server currently holds for the controller.
///
/// The server reports `"none"` before any command has been issued; that and
/// any unrecognised token map to `None`.
pub fn parse_device_command(body: &str) -> crate::Result<Option<Command>> {
    let reply: ControlReply = serde_json::from_str(body)?;
    Ok(reply
        .command
        .and_then(|value| value.as_str().and_then(|s| s.parse().ok())))
}
