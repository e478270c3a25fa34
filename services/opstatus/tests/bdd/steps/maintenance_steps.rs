//! BDD step definitions for maintenance interception feature

use std::sync::Arc;

use cucumber::{given, then, when};

use opstatus::interceptor::MaintenanceLayer;
use opstatus::io::HttpClient;

use crate::support::url;
use crate::world::OpStatusWorld;

#[given("the maintenance interceptor is mounted on the pipeline")]
fn interceptor_mounted(world: &mut OpStatusWorld) {
    let pipeline = world.pipeline();
    let store = world.store();
    world.guard = Some(pipeline.mount(&MaintenanceLayer::new(store)));
}

#[given(expr = "the backend answers {string} with status {int} and body {string}")]
fn backend_answers(world: &mut OpStatusWorld, path: String, status: u16, body: String) {
    world.api().respond(&path, status, &body);
}

#[given(expr = "the backend drops the connection for {string}")]
fn backend_fails(world: &mut OpStatusWorld, path: String) {
    world.api().fail(&path, "connection reset by peer");
}

#[given(expr = "maintenance mode was entered with message {string}")]
fn maintenance_entered(world: &mut OpStatusWorld, message: String) {
    world.store().enter(Some(message));
}

#[when(expr = "the client requests {string}")]
async fn client_requests(world: &mut OpStatusWorld, path: String) {
    let pipeline = world.pipeline();
    world.last_response = Some(pipeline.get(&url(&path)).await);
}

#[when(expr = "the client posts to {string}")]
async fn client_posts(world: &mut OpStatusWorld, path: String) {
    let pipeline = world.pipeline();
    world.last_response = Some(
        pipeline
            .post_json(&url(&path), &serde_json::json!({}))
            .await,
    );
}

#[when("the maintenance interceptor is unmounted")]
fn interceptor_unmounted(world: &mut OpStatusWorld) {
    world
        .guard
        .take()
        .expect("interceptor not mounted")
        .unmount();
}

#[then(expr = "maintenance mode should be active with message {string}")]
fn maintenance_active_with(world: &mut OpStatusWorld, message: String) {
    let state = world.store().current();
    assert!(state.is_active(), "expected maintenance, got {:?}", state);
    assert_eq!(state.message(), Some(message.as_str()));
}

#[then("maintenance mode should be active with the default message")]
fn maintenance_active_default(world: &mut OpStatusWorld) {
    let store = world.store();
    let state = store.current();
    assert!(state.is_active(), "expected maintenance, got {:?}", state);
    assert_eq!(state.message(), Some(store.default_message()));
}

#[then("maintenance mode should be inactive")]
fn maintenance_inactive(world: &mut OpStatusWorld) {
    let state = world.store().current();
    assert!(!state.is_active(), "expected no maintenance, got {:?}", state);
}

#[then(expr = "the client should receive status {int}")]
fn client_receives(world: &mut OpStatusWorld, status: u16) {
    match world.last_response.as_ref().expect("no request made") {
        Ok(response) => assert_eq!(response.status, status),
        Err(e) => panic!("request failed: {}", e),
    }
}

#[then("the client should receive a transport error")]
fn client_receives_error(world: &mut OpStatusWorld) {
    let response = world.last_response.as_ref().expect("no request made");
    assert!(response.is_err(), "expected error, got {:?}", response);
}

#[then("the pipeline should dispatch to the bare backend again")]
fn pipeline_restored(world: &mut OpStatusWorld) {
    let api: Arc<dyn HttpClient> = world.api();
    assert!(world.pipeline().is_target(&api));
}
