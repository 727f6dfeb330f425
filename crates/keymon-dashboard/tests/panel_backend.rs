//! Integration tests driving a mounted panel against a mock backend
#![forbid(unsafe_code)]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::field_reassign_with_default
)]

use keymon_core::Config;
use keymon_dashboard::{DashboardPanel, PanelSnapshot, Phase, render};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(5);

fn config_for(server: &MockServer, delay_ms: u64) -> Config {
    let mut config = Config::default();
    config.backend.base_url = server.uri();
    config.backend.api_key = Some("panel-key".to_string());
    config.backend.request_timeout_seconds = 2;
    config.panel.refresh_delay_ms = delay_ms;
    config
}

async fn settled_at(rx: &mut watch::Receiver<PanelSnapshot>, token: u64) -> PanelSnapshot {
    timeout(
        WAIT,
        rx.wait_for(|s| s.phase == Phase::Waiting && s.refresh_token.get() == token),
    )
    .await
    .expect("panel did not settle in time")
    .unwrap()
    .clone()
}

/// Mount, render the first response, then pick up the second one
#[tokio::test]
async fn test_panel_follows_backend_changes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/keys/active"))
        .and(header("X-API-Key", "panel-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"keys": ["a", "b"]})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/keys/active"))
        .and(header("X-API-Key", "panel-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"keys": ["c"]})))
        .mount(&server)
        .await;

    let handle = DashboardPanel::from_config(&config_for(&server, 50))
        .unwrap()
        .mount();
    let mut rx = handle.subscribe();

    let first = render(&settled_at(&mut rx, 0).await);
    let second = render(&settled_at(&mut rx, 1).await);

    let first_keys: Vec<_> = first.children.iter().map(|c| c.apikey.as_str()).collect();
    let second_keys: Vec<_> = second.children.iter().map(|c| c.apikey.as_str()).collect();
    assert_eq!(first_keys, vec!["a", "b"]);
    assert_eq!(second_keys, vec!["c"]);
    assert_eq!(second.children[0].refresh_token.get(), 1);

    handle.stop().await.unwrap();
}

/// A failing backend never stops the loop
#[tokio::test]
async fn test_panel_survives_backend_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/keys/active"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/keys/active"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/keys/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"keys": ["k1"]})))
        .mount(&server)
        .await;

    let handle = DashboardPanel::from_config(&config_for(&server, 20))
        .unwrap()
        .mount();
    let mut rx = handle.subscribe();

    assert!(settled_at(&mut rx, 0).await.keys.is_empty());
    assert!(settled_at(&mut rx, 1).await.keys.is_empty());
    assert_eq!(settled_at(&mut rx, 2).await.keys, vec!["k1"]);

    let stats = handle.stats();
    assert_eq!(stats.failures, 2);
    assert!(stats.cycles >= 3);

    handle.stop().await.unwrap();
}

/// Once stopped, the backend sees no more requests
#[tokio::test]
async fn test_stopped_panel_issues_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/keys/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"keys": ["a"]})))
        .mount(&server)
        .await;

    let handle = DashboardPanel::from_config(&config_for(&server, 20))
        .unwrap()
        .mount();
    let mut rx = handle.subscribe();
    settled_at(&mut rx, 1).await;

    handle.stop().await.unwrap();
    let before = server.received_requests().await.unwrap().len();

    tokio::time::sleep(Duration::from_millis(200)).await;
    let after = server.received_requests().await.unwrap().len();

    assert_eq!(before, after);
}
