//! Web dashboard: HTML page with the sensor chart and command buttons, plus JSON API

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::chart::{escape, ChartModel};
use crate::command::{Command, CommandRequest};
use crate::dispatcher::{CommandDispatcher, DispatchResult};
use crate::notifier::NotificationLevel;
use crate::state::{PollStatus, StateHandle};
use crate::view::DashboardView;

const CHART_WIDTH: u32 = 960;
const CHART_HEIGHT: u32 = 500;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub state: StateHandle,
    pub dispatcher: Arc<CommandDispatcher>,
    pub refresh_seconds: u64,
}

/// Body of `/api/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub poll: PollStatus,
    pub in_flight: bool,
    pub device_command: Option<Command>,
    pub sample_count: usize,
    pub uptime_seconds: u64,
}

/// Build the dashboard axum router
pub fn build_router(
    state: StateHandle,
    dispatcher: Arc<CommandDispatcher>,
    refresh_seconds: u64,
) -> Router {
    let dashboard_state = DashboardState {
        state,
        dispatcher,
        refresh_seconds,
    };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/samples", get(samples_handler))
        .route("/api/chart", get(chart_handler))
        .route("/api/status", get(status_handler))
        .route("/api/notifications", get(notifications_handler))
        .route("/api/command", post(command_handler))
        .route("/api/command/{command}", post(command_form_handler))
        .route("/health", get(health_handler))
        .with_state(dashboard_state)
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let in_flight = dashboard.dispatcher.is_in_flight();
    let view = {
        let state = dashboard.state.read().await;
        DashboardView::project(&state, in_flight)
    };
    Html(render_page(&view, dashboard.refresh_seconds))
}

async fn samples_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    Json(state.samples.clone())
}

async fn chart_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    Json(ChartModel::from_samples(&state.samples))
}

async fn status_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let in_flight = dashboard.dispatcher.is_in_flight();
    let state = dashboard.state.read().await;
    Json(StatusResponse {
        poll: state.poll.clone(),
        in_flight,
        device_command: state.device_command,
        sample_count: state.samples.len(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

async fn notifications_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    Json(state.notifications.iter().cloned().collect::<Vec<_>>())
}

async fn command_handler(
    State(dashboard): State<DashboardState>,
    Json(request): Json<CommandRequest>,
) -> Response {
    let result = dashboard.dispatcher.dispatch(request.command).await;
    dispatch_response(result)
}

async fn command_form_handler(
    State(dashboard): State<DashboardState>,
    Path(command): Path<String>,
) -> Response {
    let command: Command = match command.parse() {
        Ok(command) => command,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let result = dashboard.dispatcher.dispatch(command).await;
    tracing::debug!("Form dispatch of '{}': {:?}", command, result);
    Redirect::to("/").into_response()
}

async fn health_handler() -> &'static str {
    "OK"
}

fn dispatch_response(result: DispatchResult) -> Response {
    match result {
        DispatchResult::Completed(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        DispatchResult::Rejected => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "outcome": "rejected" })),
        )
            .into_response(),
        DispatchResult::Abandoned => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "outcome": "abandoned" })),
        )
            .into_response(),
    }
}

/// Render the full dashboard page
pub fn render_page(view: &DashboardView, refresh_seconds: u64) -> String {
    let chart = if view.chart.is_empty() {
        r#"<p class="empty">Waiting for sensor data…</p>"#.to_string()
    } else {
        view.chart.render_svg(CHART_WIDTH, CHART_HEIGHT)
    };

    let buttons: String = view
        .buttons
        .iter()
        .map(|b| {
            let color = match b.command {
                Command::Open => "#4caf50",
                Command::Close => "#f44336",
            };
            let disabled = b.disabled;
            format!(
                r#"<form method="post" action="/api/command/{cmd}" style="display: inline;">
                    <button type="submit" data-command="{cmd}"{dis} style="padding: 0.5rem 1.5rem; margin: 0 0.5rem; border: none; border-radius: 0.5rem; color: white; font-weight: 600; background-color: {color}; opacity: {opacity}; cursor: {cursor};">{label}</button>
                </form>"#,
                cmd = b.command,
                dis = if disabled { " disabled" } else { "" },
                color = color,
                opacity = if disabled { "0.5" } else { "1" },
                cursor = if disabled { "not-allowed" } else { "pointer" },
                label = escape(&b.label)
            )
        })
        .collect();

    let notifications: String = view
        .notifications
        .iter()
        .map(|n| {
            let (color, bg) = match n.level {
                NotificationLevel::Success => ("#155724", "#d4edda"),
                NotificationLevel::Failure => ("#721c24", "#f8d7da"),
            };
            format!(
                r#"<li style="padding: 0.5rem; margin-bottom: 0.25rem; border-radius: 0.25rem; color: {}; background-color: {};">{}</li>"#,
                color,
                bg,
                escape(&n.message)
            )
        })
        .collect();

    let poll_status = match (&view.poll.last_error, view.poll.last_success_epoch_ms) {
        (Some(error), _) => format!(
            "Last poll failed ({} in a row): {}",
            view.poll.consecutive_failures,
            escape(error)
        ),
        (None, Some(_)) => format!("{} samples", view.chart.categories.len()),
        (None, None) => "No data yet".to_string(),
    };

    let device_command = view
        .device_command
        .map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string());

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta http-equiv="refresh" content="{refresh}">
    <title>Smart Blinds Dashboard</title>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 1000px; margin: 0 auto; padding: 1rem;">
    <h1 style="text-align: center;">Smart Blinds Dashboard</h1>
    <section id="chart">{chart}</section>
    <section id="controls" style="text-align: center; margin: 1.5rem 0;">{buttons}</section>
    <section id="status" style="color: #666; font-size: 0.9em;">
        <p>Poll: {poll_status}</p>
        <p>Device command: {device_command}</p>
    </section>
    <section>
        <h2>Notifications</h2>
        <ul id="notifications" style="list-style: none; padding: 0;">{notifications}</ul>
    </section>
</body>
</html>"#,
        refresh = refresh_seconds,
        chart = chart,
        buttons = buttons,
        poll_status = poll_status,
        device_command = device_command,
        notifications = notifications,
    )
}
