//! Blinds Dashboard - smart blinds sensor dashboard and command service
//!
//! Polls a blinds device server for temperature, humidity and light readings,
//! charts them on a web page, and forwards open/close commands to the device.

pub mod chart;
pub mod client;
pub mod command;
pub mod config;
pub mod dashboard;
pub mod dispatcher;
pub mod error;
pub mod io;
pub mod notifier;
pub mod poller;
pub mod sample;
pub mod state;
pub mod view;

pub use command::{Command, CommandOutcome};
pub use config::{load_config, Config};
pub use dispatcher::{CommandDispatcher, DispatchResult};
pub use error::{DashboardError, Result};
pub use sample::SensorSample;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::client::BlindsClient;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::notifier::{HistoryNotifier, Notifier, TracingNotifier};
use crate::poller::{Poller, PollerHandle};
use crate::state::StateHandle;

/// Builder for a [`BlindsDashboard`].
///
/// Defaults to a reqwest HTTP client and the tracing and history notifiers.
pub struct DashboardBuilder {
    config: Config,
    http: Option<Arc<dyn HttpClient>>,
    notifiers: Option<Vec<Arc<dyn Notifier>>>,
    cancel: Option<CancellationToken>,
}

impl DashboardBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            notifiers: None,
            cancel: None,
        }
    }

    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Replace the default notification sinks
    pub fn with_notifiers(mut self, notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        self.notifiers = Some(notifiers);
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn build(self) -> Result<BlindsDashboard> {
        self.config.validate()?;

        let http = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestHttpClient::with_timeout(
                self.config.device.request_timeout(),
            )?),
        };
        let cancel = self.cancel.unwrap_or_default();
        let state = state::new_state_handle(self.config.dashboard.history_size);

        let notifiers = self.notifiers.unwrap_or_else(|| {
            vec![
                Arc::new(TracingNotifier) as Arc<dyn Notifier>,
                Arc::new(HistoryNotifier::new(Arc::clone(&state))),
            ]
        });

        let client = Arc::new(BlindsClient::new(&self.config.device, http));
        let dispatcher = Arc::new(CommandDispatcher::new(
            Arc::clone(&client),
            notifiers,
            Arc::clone(&state),
            cancel.clone(),
        ));

        Ok(BlindsDashboard {
            config: self.config,
            client,
            state,
            dispatcher,
            poller: None,
            cancel,
        })
    }
}

/// A dashboard instance: shared state, dispatcher, and the poller bound to its lifetime.
///
/// Dropping the dashboard tears it down as [`BlindsDashboard::deactivate`] does,
/// without waiting for the poller task to finish.
#[derive(Debug)]
pub struct BlindsDashboard {
    config: Config,
    client: Arc<BlindsClient>,
    state: StateHandle,
    dispatcher: Arc<CommandDispatcher>,
    poller: Option<PollerHandle>,
    cancel: CancellationToken,
}

impl BlindsDashboard {
    pub fn state(&self) -> StateHandle {
        Arc::clone(&self.state)
    }

    pub fn dispatcher(&self) -> Arc<CommandDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_active(&self) -> bool {
        self.poller.as_ref().is_some_and(PollerHandle::is_running)
    }

    /// Start polling. Does nothing if already active or already torn down.
    pub fn activate(&mut self) {
        if self.poller.is_some() || self.cancel.is_cancelled() {
            return;
        }
        self.poller = Some(self.make_poller().spawn());
        tracing::info!(
            "Polling {} every {}s",
            self.config.device.base_url,
            self.config.device.poll_interval_seconds
        );
    }

    /// Run a single poll tick outside the timer
    pub async fn poll_once(&self) {
        self.make_poller().poll_once().await;
    }

    fn make_poller(&self) -> Poller {
        Poller::new(
            Arc::clone(&self.client),
            Arc::clone(&self.state),
            self.config.device.poll_interval(),
            self.cancel.clone(),
        )
        .with_device_command_tracking(self.config.device.track_device_command)
    }

    /// Tear down: stop polling and abandon any pending command
    pub async fn deactivate(&mut self) {
        self.cancel.cancel();
        if let Some(poller) = self.poller.as_mut() {
            poller.stop().await;
        }
        tracing::debug!("Dashboard deactivated");
    }

    /// Build the dashboard web router
    pub fn router(&self) -> Router {
        dashboard::build_router(
            Arc::clone(&self.state),
            Arc::clone(&self.dispatcher),
            self.config.device.poll_interval_seconds,
        )
    }

    /// Activate, serve the web dashboard if enabled, and run until cancelled
    pub async fn start(mut self) -> Result<()> {
        self.activate();

        if self.config.dashboard.enabled {
            let addr = SocketAddr::from(([0, 0, 0, 0], self.config.dashboard.port));
            let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                DashboardError::Dashboard(format!("Failed to bind dashboard to {}: {}", addr, e))
            })?;
            tracing::info!("Dashboard listening on http://{}", addr);

            let router = self.router();
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        cancel.cancelled().await;
                    })
                    .await
                    .ok();
                tracing::debug!("Dashboard server stopped");
            });
        }

        tracing::info!("Blinds dashboard started");
        self.cancel.cancelled().await;

        self.deactivate().await;
        tracing::info!("Blinds dashboard stopped");
        Ok(())
    }
}

impl Drop for BlindsDashboard {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Run the dashboard with the given configuration until ctrl-c
pub async fn run(config: Config) -> Result<()> {
    let dashboard = DashboardBuilder::new(config).build()?;

    let cancel = dashboard.cancellation_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        cancel.cancel();
    });

    dashboard.start().await
}

pub(crate) fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
