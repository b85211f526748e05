//! Test helper utilities for collector integration tests

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use collector::services::{FileSessionStorage, MemorySessionStorage, RealFarmApi};
use collector::traits::SessionStorage;
use collector::{ClientConfig, FarmApp, MockFarmApi};
use shared::{UserProfile, initialize_layout};
use wiremock::MockServer;

pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Storage already holding a session for `profile`
pub fn stored_session(token: &str, profile: &UserProfile) -> MemorySessionStorage {
    let user = serde_json::to_string(profile).unwrap();
    MemorySessionStorage::with_values([("token", token), ("user", user.as_str())])
}

/// App over a mock API, already started
pub async fn started_app<S>(api: MockFarmApi, storage: S) -> FarmApp<MockFarmApi, S>
where
    S: SessionStorage,
{
    let app = FarmApp::new(api, storage, initialize_layout(), POLL_INTERVAL);
    app.start().await.unwrap();
    app
}

pub fn config_for(server: &MockServer, session_dir: &Path) -> ClientConfig {
    ClientConfig::new(Some(&server.uri()), Some(5), Some(1), Some(session_dir.to_path_buf())).unwrap()
}

/// App wired to the real HTTP client and file storage, already started
pub async fn real_app(server: &MockServer, session_dir: &Path) -> FarmApp<RealFarmApi, FileSessionStorage> {
    let config = config_for(server, session_dir);
    let poll_interval = config.poll_interval;
    let storage = FileSessionStorage::new(config.session_dir.clone());
    let api = RealFarmApi::new(config).unwrap();
    let app = FarmApp::new(api, storage, initialize_layout(), poll_interval);
    app.start().await.unwrap();
    app
}

/// Poll `condition` every 10ms until it holds or `timeout_ms` passes
pub async fn wait_for_condition<F, Fut>(mut condition: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    loop {
        if condition().await {
            return true;
        }
        if start.elapsed() > timeout {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
