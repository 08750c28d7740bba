//! Command dispatcher: one command at a time, outcome surfaced to notifiers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::client::BlindsClient;
use crate::command::{Command, CommandOutcome};
use crate::current_epoch_ms;
use crate::notifier::{Notification, Notifier};
use crate::state::{CommandRecord, StateHandle};

/// Result of asking the dispatcher to send a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    /// Another dispatch was in flight; no request was issued
    Rejected,
    /// The dashboard was torn down before the reply arrived
    Abandoned,
    /// The request completed with the given outcome
    Completed(CommandOutcome),
}

/// Sends blinds commands, gating both buttons behind a single in-flight flag
pub struct CommandDispatcher {
    client: Arc<BlindsClient>,
    notifiers: Vec<Arc<dyn Notifier>>,
    state: StateHandle,
    in_flight: AtomicBool,
    cancel: CancellationToken,
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("client", &self.client)
            .field("notifiers", &self.notifiers)
            .field("in_flight", &self.is_in_flight())
            .finish()
    }
}

/// Clears the in-flight flag when the dispatch ends, however it ends
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl CommandDispatcher {
    pub fn new(
        client: Arc<BlindsClient>,
        notifiers: Vec<Arc<dyn Notifier>>,
        state: StateHandle,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            notifiers,
            state,
            in_flight: AtomicBool::new(false),
            cancel,
        }
    }

    /// Whether a dispatch is currently awaiting its reply
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Send a command unless another one is in flight
    pub async fn dispatch(&self, command: Command) -> DispatchResult {
        if self.cancel.is_cancelled() {
            tracing::debug!("Dashboard is shut down, dropping '{}' command", command);
            return DispatchResult::Abandoned;
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("Command in flight, dropping '{}' command", command);
            return DispatchResult::Rejected;
        };

        tracing::info!("Sending '{}' command", command);

        let outcome = tokio::select! {
            outcome = self.client.send_command(command) => outcome,
            _ = self.cancel.cancelled() => {
                tracing::debug!("Dashboard shut down while '{}' command was pending", command);
                return DispatchResult::Abandoned;
            }
        };
        if self.cancel.is_cancelled() {
            return DispatchResult::Abandoned;
        }

        let now_ms = current_epoch_ms();
        match &outcome {
            CommandOutcome::Confirmed => {
                self.notify(&Notification::success(
                    format!("Successfully sent {} command!", command),
                    now_ms,
                ))
                .await;
            }
            CommandOutcome::Mismatched { echoed } => {
                // Neither confirmed nor failed: logged and recorded, not surfaced.
                tracing::warn!(
                    "Device did not confirm '{}' command (echoed {:?})",
                    command,
                    echoed
                );
            }
            CommandOutcome::Failed { reason } => {
                tracing::warn!("Sending '{}' command failed: {}", command, reason);
                self.notify(&Notification::failure("Failed to send command", now_ms))
                    .await;
            }
        }

        self.state.write().await.add_command_record(CommandRecord {
            command,
            outcome: outcome.clone(),
            timestamp_epoch_ms: now_ms,
        });

        DispatchResult::Completed(outcome)
    }

    async fn notify(&self, notification: &Notification) {
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(notification).await {
                tracing::warn!("Notifier '{}' failed: {}", notifier.type_name(), e);
            }
        }
    }
}
