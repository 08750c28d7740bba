//! Poller: periodic sensor reads bound to the dashboard's lifetime

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::client::BlindsClient;
use crate::current_epoch_ms;
use crate::state::StateHandle;

/// Failure streak at which the poller raises its log level
const FAILURE_STREAK_WARNING: u32 = 5;

/// Reads `/data` immediately and then on every tick until cancelled
pub struct Poller {
    client: Arc<BlindsClient>,
    state: StateHandle,
    interval: Duration,
    track_device_command: bool,
    cancel: CancellationToken,
}

impl Poller {
    pub fn new(
        client: Arc<BlindsClient>,
        state: StateHandle,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            state,
            interval,
            track_device_command: false,
            cancel,
        }
    }

    /// Also refresh the device server's held command after each sample read
    pub fn with_device_command_tracking(mut self, enabled: bool) -> Self {
        self.track_device_command = enabled;
        self
    }

    /// Run one poll tick, applying its result to the shared state.
    ///
    /// A read still pending when the poller is cancelled is dropped and
    /// writes nothing.
    pub async fn poll_once(&self) {
        let result = tokio::select! {
            result = self.client.fetch_samples() => result,
            _ = self.cancel.cancelled() => return,
        };

        {
            let mut state = self.state.write().await;
            if self.cancel.is_cancelled() {
                return;
            }
            let now_ms = current_epoch_ms();
            match result {
                Ok(samples) => {
                    tracing::debug!("Poll returned {} samples", samples.len());
                    state.replace_samples(samples, now_ms);
                }
                Err(e) => {
                    let streak = state.record_poll_failure(e.to_string(), now_ms);
                    if streak == FAILURE_STREAK_WARNING {
                        tracing::error!("Sensor poll has failed {} times in a row: {}", streak, e);
                    } else {
                        tracing::warn!("Error fetching sensor data: {}", e);
                    }
                }
            }
        }

        if self.track_device_command {
            self.refresh_device_command().await;
        }
    }

    async fn refresh_device_command(&self) {
        let result = tokio::select! {
            result = self.client.device_command() => result,
            _ = self.cancel.cancelled() => return,
        };

        match result {
            Ok(command) => {
                let mut state = self.state.write().await;
                if !self.cancel.is_cancelled() {
                    state.device_command = command;
                }
            }
            Err(e) => tracing::debug!("Error fetching device command: {}", e),
        }
    }

    /// Poll until the cancellation token is triggered
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::debug!("Poller cancelled");
                    break;
                }
                _ = ticker.tick() => {}
            }
            self.poll_once().await;
        }
    }

    /// Start polling on a background task
    pub fn spawn(self) -> PollerHandle {
        let cancel = self.cancel.clone();
        tracing::debug!("Starting poller every {:?}", self.interval);
        let join = tokio::spawn(self.run());
        PollerHandle {
            cancel,
            join: Some(join),
        }
    }
}

/// Owner of a running poller task. Dropping the handle cancels the poller.
#[derive(Debug)]
pub struct PollerHandle {
    cancel: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|join| !join.is_finished())
    }

    /// Cancel the poller and wait for its task to end. Later calls do nothing.
    pub async fn stop(&mut self) {
        let Some(join) = self.join.take() else {
            return;
        };
        self.cancel.cancel();
        if let Err(e) = join.await {
            tracing::warn!("Poller task ended abnormally: {}", e);
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
