use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use tasker_server::web::health_check_handler;
use tower::ServiceExt;

fn health_router() -> Router {
    Router::new().route("/health", get(health_check_handler))
}

#[tokio::test]
async fn health_endpoint_returns_ok_with_timestamp() {
    let router = health_router();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["status"], "OK");
    let timestamp = body["timestamp"]
        .as_str()
        .expect("Health response should carry a timestamp string");
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .expect("Health timestamp should be valid RFC 3339");
}

#[tokio::test]
async fn health_endpoint_is_stateless_across_requests() {
    let router = health_router();

    for _ in 0..3 {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
