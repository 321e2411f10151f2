//! Integration tests for API endpoints
//!
//! These tests verify that:
//! - Status endpoints aggregate the current health correctly
//! - Unknown keys answer 404 with the valid keys
//! - Prometheus endpoints emit the text exposition format
//! - The plug metrics relay reports a missing or failing upstream

use std::net::SocketAddr;
use std::sync::Arc;

use aims_monitor::Monitor;
use aims_monitor::api::{ApiConfig, ApiState, spawn_api_server};
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{
    FakeRuntime, create_test_monitor, exited, http_service, refused_service, running,
};

// Helper to create test API server
async fn spawn_test_api(monitor: Monitor, plugs_metrics_url: Option<String>) -> SocketAddr {
    let state = ApiState::new(monitor, plugs_metrics_url);
    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(), // Random port
        enable_cors: true,
    };

    spawn_api_server(config, state).await.unwrap()
}

/// Six services, two of them down, one checked cycle
async fn fleet(mock_server: &MockServer) -> Monitor {
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(mock_server)
        .await;

    let mut services: Vec<_> = ["frontend", "api", "worker", "scheduler"]
        .into_iter()
        .map(|name| http_service(name, &mock_server.uri()))
        .collect();
    services.push(refused_service("search"));
    services.push(refused_service("billing"));

    let runtime = Arc::new(FakeRuntime::new(vec![
        running("0123456789abcdef", "web"),
        exited("fedcba9876543210", "migrations"),
    ]));

    let monitor = create_test_monitor(services, runtime);
    monitor.run_cycle().await;
    monitor
}

async fn get_json(addr: SocketAddr, route: &str) -> (StatusCode, Value) {
    let response = reqwest::get(format!("http://{addr}{route}")).await.unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let monitor = create_test_monitor(vec![], Arc::new(FakeRuntime::default()));
    let addr = spawn_test_api(monitor, None).await;

    let (status, body) = get_json(addr, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_status_two_of_six_down() {
    let mock_server = MockServer::start().await;
    let addr = spawn_test_api(fleet(&mock_server).await, None).await;

    let (status, body) = get_json(addr, "/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(
        body["summary"],
        json!({ "total": 6, "up": 4, "degraded": 0, "down": 2 })
    );
    assert_eq!(body["services"].as_array().unwrap().len(), 6);
    let first = &body["services"][0];
    assert_eq!(first["name"], "api");
    assert_eq!(first["type"], "core");
    assert!(first["responseTimeMs"].is_u64());
    assert!(first["lastCheckTimestamp"].is_string());
}

#[tokio::test]
async fn test_empty_fleet_is_healthy() {
    let monitor = create_test_monitor(vec![], Arc::new(FakeRuntime::default()));
    monitor.run_cycle().await;
    let addr = spawn_test_api(monitor, None).await;

    let (_, body) = get_json(addr, "/status").await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["summary"]["total"], 0);
}

#[tokio::test]
async fn test_single_service() {
    let mock_server = MockServer::start().await;
    let addr = spawn_test_api(fleet(&mock_server).await, None).await;

    let (status, body) = get_json(addr, "/status/billing").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "billing");
    assert_eq!(body["status"], "down");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_unknown_service_lists_available() {
    let mock_server = MockServer::start().await;
    let addr = spawn_test_api(fleet(&mock_server).await, None).await;

    let (status, body) = get_json(addr, "/status/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("nope"));
    let available = body["available"].as_array().unwrap();
    assert_eq!(available.len(), 6);
    assert!(available.contains(&json!("frontend")));
}

#[tokio::test]
async fn test_dashboard() {
    let mock_server = MockServer::start().await;
    let addr = spawn_test_api(fleet(&mock_server).await, None).await;

    let (status, body) = get_json(addr, "/dashboard").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["uptimePercent"], 0.0);
    assert_eq!(body["historyPoints"], 1);
    assert_eq!(body["containers"].as_array().unwrap().len(), 2);
    assert_eq!(body["services"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_history_limit() {
    let monitor = create_test_monitor(vec![], Arc::new(FakeRuntime::default()));
    for _ in 0..3 {
        monitor.run_cycle().await;
    }
    let addr = spawn_test_api(monitor, None).await;

    let (_, all) = get_json(addr, "/history").await;
    let (_, limited) = get_json(addr, "/history?limit=2").await;

    assert_eq!(all["count"], 3);
    assert_eq!(all["uptimePercent"], 100.0);
    assert_eq!(limited["count"], 2);
    assert_eq!(limited["snapshots"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_container_endpoints() {
    let mock_server = MockServer::start().await;
    let addr = spawn_test_api(fleet(&mock_server).await, None).await;

    let (status, body) = get_json(addr, "/containers/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["containers"][0]["id"], "0123456789ab");
    assert_eq!(body["containers"][0]["cpuPercent"], 50.0);

    let (status, body) = get_json(addr, "/containers/web/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["memoryPercent"], 19.53);

    let (status, body) = get_json(addr, "/containers/fedcba/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "migrations");
    assert_eq!(body["state"], "exited");
}

#[tokio::test]
async fn test_unknown_container_lists_available() {
    let mock_server = MockServer::start().await;
    let addr = spawn_test_api(fleet(&mock_server).await, None).await;

    let (status, body) = get_json(addr, "/containers/db/stats").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let available = body["available"].as_array().unwrap();
    assert!(available.contains(&json!("web")));
    assert!(available.contains(&json!("0123456789ab")));
}

#[tokio::test]
async fn test_prometheus_metrics() {
    let mock_server = MockServer::start().await;
    let addr = spawn_test_api(fleet(&mock_server).await, None).await;

    let response = reqwest::get(format!("http://{addr}/metrics")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));
    assert!(content_type.contains("version=0.0.4"));

    let text = response.text().await.unwrap();
    assert!(text.contains("# HELP aims_service_up"));
    assert!(text.contains("# TYPE aims_service_up gauge"));
    assert!(text.contains(r#"aims_service_up{service="frontend",type="core"} 1"#));
    assert!(text.contains(r#"aims_service_up{service="billing",type="core"} 0"#));
    assert!(text.contains("aims_service_response_time_ms{"));
    assert!(text.contains(r#"aims_container_cpu_percent{container="web"} 50"#));
    assert!(text.contains(r#"aims_container_pids{container="web"} 4"#));
}

#[tokio::test]
async fn test_container_metrics_only() {
    let mock_server = MockServer::start().await;
    let addr = spawn_test_api(fleet(&mock_server).await, None).await;

    let text = reqwest::get(format!("http://{addr}/metrics/containers"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(text.contains("aims_container_memory_mb"));
    assert!(!text.contains("aims_service_up"));
}

#[tokio::test]
async fn test_plugs_relay() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metrics"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("plug_operations_total 42\n"),
        )
        .mount(&upstream)
        .await;

    let monitor = create_test_monitor(vec![], Arc::new(FakeRuntime::default()));
    let addr = spawn_test_api(monitor, Some(format!("{}/metrics", upstream.uri()))).await;

    let response = reqwest::get(format!("http://{addr}/metrics/plugs"))
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "plug_operations_total 42\n");
}

#[tokio::test]
async fn test_plugs_relay_not_configured() {
    let monitor = create_test_monitor(vec![], Arc::new(FakeRuntime::default()));
    let addr = spawn_test_api(monitor, None).await;

    let (status, body) = get_json(addr, "/metrics/plugs").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_plugs_relay_upstream_failure() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&upstream)
        .await;

    let monitor = create_test_monitor(vec![], Arc::new(FakeRuntime::default()));
    let addr = spawn_test_api(monitor, Some(upstream.uri())).await;

    let (status, _) = get_json(addr, "/metrics/plugs").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_cors_headers() {
    let monitor = create_test_monitor(vec![], Arc::new(FakeRuntime::default()));
    let addr = spawn_test_api(monitor, None).await;

    let response = reqwest::Client::new()
        .get(format!("http://{addr}/health"))
        .header("Origin", "http://dashboard.local")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
}
