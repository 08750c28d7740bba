//! Shared view state: latest samples, poll status, and user-facing history

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::command::{Command, CommandOutcome};
use crate::notifier::Notification;
use crate::sample::SensorSample;

/// Outcome bookkeeping for the poller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PollStatus {
    pub last_attempt_epoch_ms: u64,
    pub last_success_epoch_ms: Option<u64>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

/// Record of a completed command dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub command: Command,
    pub outcome: CommandOutcome,
    pub timestamp_epoch_ms: u64,
}

/// Shared state accessible by the poller, the dispatcher, and the dashboard
#[derive(Debug)]
pub struct SharedState {
    pub samples: Vec<SensorSample>,
    pub poll: PollStatus,
    pub device_command: Option<Command>,
    pub notifications: VecDeque<Notification>,
    pub commands: VecDeque<CommandRecord>,
    pub history_max_size: usize,
    pub started_at: Instant,
}

impl SharedState {
    pub fn new(history_max_size: usize) -> Self {
        Self {
            samples: Vec::new(),
            poll: PollStatus::default(),
            device_command: None,
            notifications: VecDeque::with_capacity(history_max_size),
            commands: VecDeque::with_capacity(history_max_size),
            history_max_size,
            started_at: Instant::now(),
        }
    }

    /// Replace the sample sequence wholesale after a successful poll
    pub fn replace_samples(&mut self, samples: Vec<SensorSample>, now_ms: u64) {
        self.samples = samples;
        self.poll.last_attempt_epoch_ms = now_ms;
        self.poll.last_success_epoch_ms = Some(now_ms);
        self.poll.consecutive_failures = 0;
        self.poll.last_error = None;
    }

    /// Record a failed poll, leaving the samples untouched. Returns the failure streak.
    pub fn record_poll_failure(&mut self, error: String, now_ms: u64) -> u32 {
        self.poll.last_attempt_epoch_ms = now_ms;
        self.poll.consecutive_failures += 1;
        self.poll.last_error = Some(error);
        self.poll.consecutive_failures
    }

    pub fn add_notification(&mut self, notification: Notification) {
        push_bounded(&mut self.notifications, notification, self.history_max_size);
    }

    pub fn add_command_record(&mut self, record: CommandRecord) {
        push_bounded(&mut self.commands, record, self.history_max_size);
    }
}

fn push_bounded<T>(queue: &mut VecDeque<T>, item: T, max: usize) {
    if max == 0 {
        return;
    }
    while queue.len() >= max {
        queue.pop_front();
    }
    queue.push_back(item);
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<SharedState>>;

pub fn new_state_handle(history_max_size: usize) -> StateHandle {
    Arc::new(RwLock::new(SharedState::new(history_max_size)))
}
