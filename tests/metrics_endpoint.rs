//! Prometheus exposition. Kept in its own test binary because the recorder
//! is process-global.

use guarded_backend::http::AppState;
use guarded_backend::observability::metrics::install_recorder;

mod common;

use common::{test_config, TestServer};

#[tokio::test]
async fn metrics_count_requests_by_route_and_method() {
    let exporter = install_recorder().expect("recorder installs once per process");

    let config = test_config();
    let state = AppState::from_config(&config).unwrap().with_metrics(exporter);
    let server = TestServer::start_with_state(config, state).await;

    for _ in 0..3 {
        let res = server.client.get(server.url("/api/hello")).send().await.unwrap();
        assert_eq!(res.status(), 200);
    }
    let res = server.client.get(server.url("/api/time")).send().await.unwrap();
    assert_eq!(res.status(), 403);

    let res = server.client.get(server.url("/metrics")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body = res.text().await.unwrap();

    let hello = body
        .lines()
        .find(|line| {
            line.starts_with("backend_requests_total{")
                && line.contains("path=\"/api/hello\"")
                && line.contains("method=\"GET\"")
        })
        .unwrap_or_else(|| panic!("no hello counter in:\n{body}"));
    assert!(hello.ends_with(" 3"), "unexpected sample: {hello}");

    assert!(
        body.lines().any(|line| line.starts_with("backend_requests_total{")
            && line.contains("path=\"/api/time\"")),
        "rejected requests are counted too"
    );
    assert!(body.contains("backend_request_duration_seconds"));
    assert!(
        body.lines().any(|line| line.starts_with("process_")),
        "process statistics missing from:\n{body}"
    );
}
