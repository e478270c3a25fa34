//! BDD step definitions for health probe feature

use std::time::Duration;

use cucumber::{given, then, when};
use tokio_util::sync::CancellationToken;

use opstatus::health::HealthStatus;

use crate::world::OpStatusWorld;

#[given(expr = "the liveness endpoint reports service {string} version {string}")]
fn liveness_up(world: &mut OpStatusWorld, service: String, version: String) {
    let body = serde_json::json!({
        "status": "ok",
        "timestamp": "2024-03-01T09:00:00Z",
        "service": service,
        "version": version,
    });
    world.api().respond("/health", 200, &body.to_string());
}

#[given("the liveness endpoint is unreachable")]
fn liveness_unreachable(world: &mut OpStatusWorld) {
    world.api().fail("/health", "connection refused");
}

#[when("the liveness endpoint goes down")]
fn liveness_goes_down(world: &mut OpStatusWorld) {
    world.api().fail("/health", "connection refused");
}

#[given("the health probe has run")]
async fn probe_has_run(world: &mut OpStatusWorld) {
    world.probe().fetch_health().await;
}

#[when("the health probe runs")]
async fn probe_runs(world: &mut OpStatusWorld) {
    world.probe().fetch_health().await;
}

#[when(expr = "the health probe is started every {int} seconds")]
async fn probe_started(world: &mut OpStatusWorld, seconds: u64) {
    let probe = world.probe();
    let mut rx = probe.subscribe();
    let cancel = CancellationToken::new();
    world.health_task = Some(probe.spawn(Duration::from_secs(seconds), &cancel));
    world.poll_cancel = Some(cancel);

    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("first probe did not complete")
        .expect("probe dropped");
}

#[when("the application is shut down")]
async fn application_shut_down(world: &mut OpStatusWorld) {
    world
        .poll_cancel
        .as_ref()
        .expect("probe not started")
        .cancel();
    if let Some(task) = world.health_task.take() {
        task.cancel().await;
    }
}

#[then(expr = "the backend status should be {string}")]
fn backend_status(world: &mut OpStatusWorld, expected: String) {
    assert_eq!(world.probe().current().to_string(), expected);
}

#[then(expr = "the health snapshot should name service {string} version {string}")]
fn snapshot_names(world: &mut OpStatusWorld, service: String, version: String) {
    let status = world.probe().current();
    let snapshot = status.snapshot().expect("no snapshot");
    assert_eq!(snapshot.service, service);
    assert_eq!(snapshot.version, version);
}

#[then("no health snapshot should be kept")]
fn no_snapshot(world: &mut OpStatusWorld) {
    let status = world.probe().current();
    assert!(
        matches!(status, HealthStatus::Offline { .. }),
        "expected offline, got {:?}",
        status
    );
    assert!(status.snapshot().is_none());
}

#[then("the health probe should have stopped")]
fn probe_stopped(world: &mut OpStatusWorld) {
    assert!(world.health_task.is_none());
    assert!(world
        .poll_cancel
        .as_ref()
        .expect("probe not started")
        .is_cancelled());
}
