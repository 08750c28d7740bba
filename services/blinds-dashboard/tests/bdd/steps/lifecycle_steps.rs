//! BDD step definitions for the dashboard lifecycle feature

use std::time::Duration;

use cucumber::{given, then, when};

use blinds_dashboard::DispatchResult;

use crate::world::BlindsWorld;

#[given("the dashboard is activated")]
#[when("the dashboard is activated")]
fn dashboard_activated(world: &mut BlindsWorld) {
    world.dashboard().activate();
}

#[when("the dashboard is deactivated")]
async fn dashboard_deactivated(world: &mut BlindsWorld) {
    world.dashboard().deactivate().await;
    world.data_requests_at_teardown = Some(world.http.count("GET", "/data").await);
}

#[then(expr = "samples are displayed within {int} ms")]
async fn samples_displayed_within(world: &mut BlindsWorld, millis: u64) {
    let state = world.dashboard().state();
    let deadline = tokio::time::Instant::now() + Duration::from_millis(millis);
    loop {
        if !state.read().await.samples.is_empty() {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "no samples displayed within {} ms",
            millis
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[then("the dashboard is active")]
fn dashboard_is_active(world: &mut BlindsWorld) {
    assert!(world.dashboard().is_active());
}

#[then("the dashboard is not active")]
fn dashboard_is_not_active(world: &mut BlindsWorld) {
    assert!(!world.dashboard().is_active());
}

#[then(expr = "no further data requests arrive within {int} ms")]
async fn no_further_requests(world: &mut BlindsWorld, millis: u64) {
    let at_teardown = world
        .data_requests_at_teardown
        .expect("dashboard was not deactivated");
    tokio::time::sleep(Duration::from_millis(millis)).await;
    assert_eq!(world.http.count("GET", "/data").await, at_teardown);
}

#[then("the pending command was abandoned")]
async fn pending_command_abandoned(world: &mut BlindsWorld) {
    let result = world
        .pending_dispatch
        .take()
        .expect("no pending dispatch")
        .await
        .expect("dispatch task panicked");
    assert_eq!(result, DispatchResult::Abandoned);
}
