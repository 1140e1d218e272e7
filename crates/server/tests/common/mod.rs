//! Common test utilities for driving the router in-process.
//!
//! The fixture wires a real orchestrator to a `MockEngine` and a temp
//! directory tree, so requests exercise the whole job path without ffmpeg.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use vidstage_core::{
    testing::MockEngine, BroadcastSink, Config, FsStorageGate, JobOrchestrator, StatusEvent,
    StatusSink, StorageGate,
};
use vidstage_server::{create_router, AppState};

/// Re-export fixtures for test convenience
pub use vidstage_core::testing::fixtures;

/// In-process server with a mock engine.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock engine - control exit codes and hold runs
    pub engine: MockEngine,
    /// Status feed the router's WebSocket clients subscribe to
    pub status_feed: BroadcastSink,
    /// Root of the temp and output directories
    pub temp_dir: TempDir,
    pub staged_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let storage = fixtures::storage_config(temp_dir.path());
        let staged_dir = storage.temp_dir.clone();
        let output_dir = storage.output_dir.clone();

        let config = Config {
            storage: storage.clone(),
            ..Default::default()
        };

        let gate = Arc::new(FsStorageGate::new(storage));
        let storage_access = gate.access();
        let engine = MockEngine::new();
        let status_feed = BroadcastSink::default();

        let orchestrator = JobOrchestrator::new(
            config.job.clone(),
            gate as Arc<dyn StorageGate>,
            Arc::new(engine.clone()),
            Arc::new(status_feed.clone()) as Arc<dyn StatusSink>,
        );

        let state = Arc::new(AppState::new(
            config,
            orchestrator,
            status_feed.clone(),
            storage_access,
        ));

        Self {
            router: create_router(state),
            engine,
            status_feed,
            temp_dir,
            staged_dir,
            output_dir,
        }
    }

    /// Write a source file under the fixture root and return its path.
    pub fn write_source(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, data).expect("Failed to write source file");
        path
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.request(
            Request::put(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Poll the job snapshot until its state name is `state`.
    pub async fn wait_for_state(&self, state: &str) -> Value {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            let response = self.get("/api/v1/job").await;
            if response.body["state"]["name"] == state {
                return response.body;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "Job never reached {}: {}",
                state,
                response.body
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

/// Receive the next event from a status feed subscription.
pub async fn next_event(rx: &mut tokio::sync::broadcast::Receiver<StatusEvent>) -> StatusEvent {
    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("Timed out waiting for status event")
        .expect("Status feed closed")
}
