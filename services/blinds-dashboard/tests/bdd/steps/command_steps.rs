//! BDD step definitions for the blinds commands feature

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};

use blinds_dashboard::notifier::NotificationLevel;
use blinds_dashboard::{Command, CommandOutcome, DispatchResult};

use crate::world::{BlindsWorld, Scripted};

fn button_command(label: &str) -> Command {
    match label {
        "Open Blinds" => Command::Open,
        "Close Blinds" => Command::Close,
        other => panic!("Unknown button: {}", other),
    }
}

#[given("the control endpoint echoes the command")]
async fn control_echoes(world: &mut BlindsWorld) {
    *world.http.control.write().await = Scripted::Echo;
}

#[given(expr = "the control endpoint replies {string}")]
async fn control_replies(world: &mut BlindsWorld, body: String) {
    *world.http.control.write().await = Scripted::Reply { status: 200, body };
}

#[given("the control endpoint is unreachable")]
async fn control_unreachable(world: &mut BlindsWorld) {
    *world.http.control.write().await = Scripted::Unreachable;
}

#[given(expr = "the control endpoint takes {int} ms to reply")]
async fn control_delay(world: &mut BlindsWorld, millis: u64) {
    *world.http.control_delay.write().await = Duration::from_millis(millis);
}

/// Start a dispatch on a background task and wait until it holds the in-flight flag
async fn spawn_pending_dispatch(world: &mut BlindsWorld, command: Command) {
    let dispatcher = world.dashboard().dispatcher();
    let task = {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move { dispatcher.dispatch(command).await })
    };
    while !dispatcher.is_in_flight() {
        tokio::task::yield_now().await;
    }
    world.pending_dispatch = Some(task);
}

#[given("a command is in flight")]
async fn command_in_flight(world: &mut BlindsWorld) {
    spawn_pending_dispatch(world, Command::Open).await;
}

#[when(expr = "the user clicks {string}")]
async fn user_clicks(world: &mut BlindsWorld, label: String) {
    let command = button_command(&label);
    let delayed = !world.http.control_delay.read().await.is_zero();
    if delayed {
        // Leave the reply pending so a second click can overlap it
        spawn_pending_dispatch(world, command).await;
    } else {
        let result = world.dashboard().dispatcher().dispatch(command).await;
        world.dispatch_results.push(result);
    }
}

#[when(expr = "the user clicks {string} before the first reply")]
async fn user_clicks_again(world: &mut BlindsWorld, label: String) {
    let dispatcher = world.dashboard().dispatcher();
    assert!(dispatcher.is_in_flight(), "first command should be in flight");

    let second = dispatcher.dispatch(button_command(&label)).await;

    let first = world
        .pending_dispatch
        .take()
        .expect("no pending dispatch")
        .await
        .expect("dispatch task panicked");
    world.dispatch_results.push(first);
    world.dispatch_results.push(second);
}

#[then(expr = "a POST to {string} was sent with body {string}")]
async fn post_sent_with_body(world: &mut BlindsWorld, path: String, body: String) {
    let expected: serde_json::Value = serde_json::from_str(&body).expect("valid JSON in step");
    let requests = world.http.requests.read().await;
    let found = requests.iter().any(|r| {
        r.method == "POST" && r.url.ends_with(&path) && r.body.as_ref() == Some(&expected)
    });
    assert!(
        found,
        "Expected POST {} with body {}, recorded requests: {:?}",
        path, body, *requests
    );
}

#[then(expr = "a success notification {string} is shown")]
async fn success_notification(world: &mut BlindsWorld, message: String) {
    let state = world.dashboard().state();
    let state = state.read().await;
    assert!(
        state
            .notifications
            .iter()
            .any(|n| n.level == NotificationLevel::Success && n.message == message),
        "notifications: {:?}",
        state.notifications
    );
}

#[then(expr = "a failure notification {string} is shown")]
async fn failure_notification(world: &mut BlindsWorld, message: String) {
    let state = world.dashboard().state();
    let state = state.read().await;
    assert!(
        state
            .notifications
            .iter()
            .any(|n| n.level == NotificationLevel::Failure && n.message == message),
        "notifications: {:?}",
        state.notifications
    );
}

#[then("no notification is shown")]
async fn no_notification(world: &mut BlindsWorld) {
    let state = world.dashboard().state();
    let state = state.read().await;
    assert!(
        state.notifications.is_empty(),
        "notifications: {:?}",
        state.notifications
    );
}

#[then("the in-flight flag is false")]
fn in_flight_false(world: &mut BlindsWorld) {
    assert!(!world.dashboard().dispatcher().is_in_flight());
}

#[then(expr = "exactly {int} control request(s) was sent")]
async fn control_requests_sent(world: &mut BlindsWorld, count: usize) {
    assert_eq!(world.http.count("POST", "/control").await, count);
}

#[then("the last outcome is mismatched")]
fn last_outcome_mismatched(world: &mut BlindsWorld) {
    match world.dispatch_results.last() {
        Some(DispatchResult::Completed(CommandOutcome::Mismatched { .. })) => {}
        other => panic!("expected a mismatched outcome, got {:?}", other),
    }
}

#[then("the second click was rejected")]
fn second_click_rejected(world: &mut BlindsWorld) {
    assert_eq!(world.dispatch_results.len(), 2);
    assert_eq!(
        world.dispatch_results[0],
        DispatchResult::Completed(CommandOutcome::Confirmed)
    );
    assert_eq!(world.dispatch_results[1], DispatchResult::Rejected);
}
