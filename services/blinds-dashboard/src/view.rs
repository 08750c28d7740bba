//! Read-only projection of dashboard state for rendering

use serde::{Deserialize, Serialize};

use crate::chart::ChartModel;
use crate::command::Command;
use crate::notifier::Notification;
use crate::state::{CommandRecord, PollStatus, SharedState};

/// A command button as it should be drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonView {
    pub command: Command,
    pub label: String,
    pub disabled: bool,
}

/// Everything the dashboard page shows, derived from the shared state
/// and the dispatcher's in-flight flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub chart: ChartModel,
    pub buttons: Vec<ButtonView>,
    pub in_flight: bool,
    pub poll: PollStatus,
    pub device_command: Option<Command>,
    pub notifications: Vec<Notification>,
    pub commands: Vec<CommandRecord>,
}

impl DashboardView {
    pub fn project(state: &SharedState, in_flight: bool) -> Self {
        let buttons = [Command::Open, Command::Close]
            .into_iter()
            .map(|command| ButtonView {
                command,
                label: command.button_label().to_string(),
                disabled: in_flight,
            })
            .collect();

        Self {
            chart: ChartModel::from_samples(&state.samples),
            buttons,
            in_flight,
            poll: state.poll.clone(),
            device_command: state.device_command,
            // Newest first
            notifications: state.notifications.iter().rev().cloned().collect(),
            commands: state.commands.iter().rev().cloned().collect(),
        }
    }
}
