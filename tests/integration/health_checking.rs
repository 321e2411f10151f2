//! Integration tests for the health checker
//!
//! These tests verify that:
//! - HTTP status codes map to up / degraded
//! - Timeouts and refused connections map to down
//! - Probes run concurrently
//! - The redis strategy never issues an HTTP request

use std::sync::Arc;
use std::time::{Duration, Instant};

use aims_monitor::ServiceStatus;
use aims_monitor::config::{HealthCheckStrategy, ServiceConfig, ServiceRegistry};
use aims_monitor::monitors::HealthChecker;
use aims_monitor::storage::HealthStore;
use assert_matches::assert_matches;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{http_service, refused_service};

fn checker(registry: ServiceRegistry) -> (HealthChecker, Arc<HealthStore>) {
    let store = Arc::new(HealthStore::new());
    (HealthChecker::new(Arc::new(registry), store.clone()), store)
}

#[tokio::test]
async fn test_frontend_up_with_response_time() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(40)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (checker, store) = checker(ServiceRegistry::new([http_service(
        "frontend",
        &mock_server.uri(),
    )]));

    let results = checker.check_all().await;

    assert_eq!(results.len(), 1);
    let health = &results[0];
    assert_eq!(health.name, "frontend");
    assert_eq!(health.status, ServiceStatus::Up);
    assert!(health.error.is_none());
    assert!(health.response_time_ms >= 40, "{}", health.response_time_ms);
    assert!(health.response_time_ms < 500, "{}", health.response_time_ms);

    assert_eq!(store.get("frontend").await.as_ref(), Some(health));
}

#[tokio::test]
async fn test_server_error_is_degraded() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let (checker, _) = checker(ServiceRegistry::new([http_service(
        "api",
        &mock_server.uri(),
    )]));

    let results = checker.check_all().await;

    assert_eq!(results[0].status, ServiceStatus::Degraded);
    assert_eq!(
        results[0].error.as_deref(),
        Some("unexpected status code: 500")
    );
}

#[tokio::test]
async fn test_custom_health_path() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/healthz"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = ServiceConfig {
        name: "gateway".to_string(),
        kind: "infra".to_string(),
        url: mock_server.uri(),
        check: None,
        health_path: Some("healthz".to_string()),
        timeout_secs: Some(1),
    }
    .resolve()
    .unwrap();
    let (checker, _) = checker(ServiceRegistry::new([service]));

    let results = checker.check_all().await;

    assert_eq!(results[0].status, ServiceStatus::Up);
    assert_eq!(results[0].kind, "infra");
}

#[tokio::test]
async fn test_slow_service_times_out_as_down() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let service =
        http_service("slow", &mock_server.uri()).with_timeout(Duration::from_millis(200));
    let (checker, _) = checker(ServiceRegistry::new([service]));

    let start = Instant::now();
    let results = checker.check_all().await;

    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(results[0].status, ServiceStatus::Down);
    assert_matches!(results[0].error.as_deref(), Some(e) if e.contains("timed out"));
    assert!(results[0].response_time_ms >= 200);
}

#[tokio::test]
async fn test_refused_connection_is_down() {
    let (checker, _) = checker(ServiceRegistry::new([refused_service("gone")]));

    let results = checker.check_all().await;

    assert_eq!(results[0].status, ServiceStatus::Down);
    assert!(results[0].error.is_some());
}

#[tokio::test]
async fn test_probes_run_concurrently() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .mount(&mock_server)
        .await;

    let services = (0..6).map(|i| {
        http_service(&format!("svc-{i}"), &mock_server.uri()).with_timeout(Duration::from_secs(1))
    });
    let (checker, _) = checker(ServiceRegistry::new(services));

    let start = Instant::now();
    let results = checker.check_all().await;
    let elapsed = start.elapsed();

    assert_eq!(results.len(), 6);
    assert!(results.iter().all(|h| h.status == ServiceStatus::Up));
    // sequential probing would take 1.8s
    assert!(elapsed < Duration::from_millis(1200), "{elapsed:?}");
}

#[tokio::test]
async fn test_one_failure_does_not_affect_others() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let (checker, _) = checker(ServiceRegistry::new([
        http_service("a", &mock_server.uri()),
        refused_service("b"),
        http_service("c", &mock_server.uri()),
    ]));

    let results = checker.check_all().await;
    let statuses: Vec<_> = results.iter().map(|h| (h.name.as_str(), h.status)).collect();

    assert_eq!(
        statuses,
        vec![
            ("a", ServiceStatus::Up),
            ("b", ServiceStatus::Down),
            ("c", ServiceStatus::Up),
        ]
    );
}

#[tokio::test]
async fn test_redis_dependency_uses_ping() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut lines = BufReader::new(read).lines();
        // *1 / $4 / PING
        for _ in 0..3 {
            lines.next_line().await.unwrap();
        }
        write.write_all(b"+PONG\r\n").await.unwrap();
    });

    let service = ServiceConfig {
        name: "redis".to_string(),
        kind: "infra".to_string(),
        url: format!("redis://127.0.0.1:{port}"),
        check: None,
        health_path: None,
        timeout_secs: None,
    }
    .resolve()
    .unwrap();
    assert_eq!(service.strategy, HealthCheckStrategy::RedisPing);

    let (checker, _) = checker(ServiceRegistry::new([service]));
    let results = checker.check_all().await;

    assert_eq!(results[0].status, ServiceStatus::Up);
    assert!(results[0].error.is_none());
}

#[tokio::test]
async fn test_duplicate_registration_replaces_entry() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let registry = ServiceRegistry::new([
        refused_service("api"),
        http_service("api", &mock_server.uri()),
    ]);
    assert_eq!(registry.len(), 1);

    let (checker, _) = checker(registry);
    let results = checker.check_all().await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, ServiceStatus::Up);
}
