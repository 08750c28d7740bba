//! Client for the blinds device server

use std::sync::Arc;

use crate::command::{parse_device_command, Command, CommandOutcome, CommandRequest};
use crate::config::DeviceConfig;
use crate::io::HttpClient;
use crate::sample::{parse_samples, SensorSample};

/// Client for the device server's `/data` and `/control` endpoints
pub struct BlindsClient {
    data_url: String,
    control_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for BlindsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlindsClient")
            .field("data_url", &self.data_url)
            .field("control_url", &self.control_url)
            .finish()
    }
}

impl BlindsClient {
    pub fn new(config: &DeviceConfig, http: Arc<dyn HttpClient>) -> Self {
        let data_url = config.endpoint("/data");
        let control_url = config.endpoint("/control");

        tracing::debug!("Created BlindsClient for {}", config.base_url);

        Self {
            data_url,
            control_url,
            http,
        }
    }

    /// Read the current sample sequence
    pub async fn fetch_samples(&self) -> crate::Result<Vec<SensorSample>> {
        let response = self.http.get(&self.data_url).await?;
        if !response.is_success() {
            return Err(crate::DashboardError::Poll(format!(
                "GET {} returned status {}: {}",
                self.data_url, response.status, response.body
            )));
        }
        parse_samples(&response.body)
    }

    /// Send a command and classify the reply
    pub async fn send_command(&self, command: Command) -> CommandOutcome {
        let body = match serde_json::to_value(CommandRequest { command }) {
            Ok(body) => body,
            Err(e) => {
                return CommandOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        match self.http.post_json(&self.control_url, &body).await {
            Ok(response) => {
                tracing::debug!(
                    "Control reply for '{}': status={} body={}",
                    command,
                    response.status,
                    response.body
                );
                CommandOutcome::classify(command, &response.body)
            }
            Err(e) => CommandOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    /// Read the command the device server currently holds
    pub async fn device_command(&self) -> crate::Result<Option<Command>> {
        let response = self.http.get(&self.control_url).await?;
        if !response.is_success() {
            return Err(crate::DashboardError::Http(format!(
                "GET {} returned status {}",
                self.control_url, response.status
            )));
        }
        parse_device_command(&response.body)
    }
}
