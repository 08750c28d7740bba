//! BDD test world for the blinds dashboard

use std::sync::Arc;
use std::time::Duration;

use cucumber::World;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use blinds_dashboard::config::{Config, DashboardConfig, DeviceConfig};
use blinds_dashboard::io::{HttpClient, HttpResponse};
use blinds_dashboard::{
    BlindsDashboard, DashboardBuilder, DashboardError, DispatchResult, SensorSample,
};

// --- Test doubles ---

/// A recorded HTTP request
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: Option<serde_json::Value>,
}

/// What the fake device server does for one endpoint
#[derive(Debug, Clone)]
pub enum Scripted {
    Reply { status: u16, body: String },
    /// Reply `{"command": <sent command>}`
    Echo,
    Unreachable,
}

impl Default for Scripted {
    fn default() -> Self {
        Scripted::Reply {
            status: 200,
            body: "[]".to_string(),
        }
    }
}

/// An HTTP client standing in for the blinds device server
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    pub requests: RwLock<Vec<RecordedRequest>>,
    pub data: RwLock<Scripted>,
    pub control: RwLock<Scripted>,
    pub control_delay: RwLock<Duration>,
}

impl ScriptedHttpClient {
    pub async fn count(&self, method: &str, suffix: &str) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.method == method && r.url.ends_with(suffix))
            .count()
    }
}

fn respond(
    scripted: &Scripted,
    url: &str,
    body: Option<&serde_json::Value>,
) -> blinds_dashboard::Result<HttpResponse> {
    match scripted {
        Scripted::Reply { status, body } => Ok(HttpResponse {
            status: *status,
            body: body.clone(),
        }),
        Scripted::Echo => Ok(HttpResponse {
            status: 200,
            body: serde_json::json!({
                "command": body.and_then(|b| b.get("command")).cloned(),
                "status": "success"
            })
            .to_string(),
        }),
        Scripted::Unreachable => Err(DashboardError::Http(format!(
            "{} failed: connection refused",
            url
        ))),
    }
}

#[async_trait::async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn get(&self, url: &str) -> blinds_dashboard::Result<HttpResponse> {
        self.requests.write().await.push(RecordedRequest {
            method: "GET".to_string(),
            url: url.to_string(),
            body: None,
        });
        if url.ends_with("/data") {
            respond(&*self.data.read().await, url, None)
        } else {
            Ok(HttpResponse {
                status: 200,
                body: r#"{"command": "none"}"#.to_string(),
            })
        }
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> blinds_dashboard::Result<HttpResponse> {
        self.requests.write().await.push(RecordedRequest {
            method: "POST".to_string(),
            url: url.to_string(),
            body: Some(body.clone()),
        });
        let delay = *self.control_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        respond(&*self.control.read().await, url, Some(body))
    }
}

#[derive(Debug, Default, World)]
pub struct BlindsWorld {
    pub http: Arc<ScriptedHttpClient>,
    pub dashboard: Option<BlindsDashboard>,

    // Polling
    pub samples_before: Option<Vec<SensorSample>>,

    // Commands
    pub dispatch_results: Vec<DispatchResult>,
    pub pending_dispatch: Option<JoinHandle<DispatchResult>>,

    // Dashboard HTTP
    pub response_status: Option<u16>,
    pub response_body: Option<String>,

    // Lifecycle
    pub data_requests_at_teardown: Option<usize>,
}

impl BlindsWorld {
    /// The dashboard under test, built on first use against the scripted device server
    pub fn dashboard(&mut self) -> &mut BlindsDashboard {
        let http = Arc::clone(&self.http);
        self.dashboard.get_or_insert_with(|| {
            let config = Config {
                device: DeviceConfig {
                    base_url: "http://blinds.test:5000".to_string(),
                    poll_interval_seconds: 1,
                    ..DeviceConfig::default()
                },
                dashboard: DashboardConfig {
                    enabled: false,
                    ..DashboardConfig::default()
                },
            };
            DashboardBuilder::new(config)
                .with_http_client(http as Arc<dyn HttpClient>)
                .build()
                .expect("dashboard should build")
        })
    }
}
