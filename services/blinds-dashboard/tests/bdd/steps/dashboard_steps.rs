//! BDD step definitions for the dashboard feature

use axum::body::Body;
use axum::http::{header, Method, Request};
use cucumber::{then, when};
use tower::ServiceExt;

use crate::world::BlindsWorld;

async fn send(world: &mut BlindsWorld, request: Request<Body>) {
    let app = world.dashboard().router();
    let response = app.oneshot(request).await.unwrap();
    world.response_status = Some(response.status().as_u16());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    world.response_body = Some(String::from_utf8(body.to_vec()).unwrap());
}

#[when(expr = "{string} is requested from the dashboard")]
async fn get_path(world: &mut BlindsWorld, path: String) {
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    send(world, request).await;
}

#[when(expr = "{string} is posted to {string}")]
async fn post_json(world: &mut BlindsWorld, body: String, path: String) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    send(world, request).await;
}

#[when(expr = "the {string} button form is submitted")]
async fn submit_button_form(world: &mut BlindsWorld, command: String) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/command/{}", command))
        .body(Body::empty())
        .unwrap();
    send(world, request).await;
}

#[then(expr = "the response status is {int}")]
fn response_status(world: &mut BlindsWorld, expected: u16) {
    assert_eq!(world.response_status, Some(expected));
}

#[then(expr = "the response should contain {string}")]
fn response_contains(world: &mut BlindsWorld, expected: String) {
    let body = world.response_body.as_ref().expect("no response body");
    assert!(
        body.contains(&expected),
        "Expected response to contain '{}', but it didn't.\nResponse body:\n{}",
        expected,
        body
    );
}

#[then(expr = "the response should not contain {string}")]
fn response_does_not_contain(world: &mut BlindsWorld, unexpected: String) {
    let body = world.response_body.as_ref().expect("no response body");
    assert!(
        !body.contains(&unexpected),
        "Expected response not to contain '{}'.\nResponse body:\n{}",
        unexpected,
        body
    );
}
