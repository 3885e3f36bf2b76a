// tests/handler_tests.rs
mod common;

use common::*;
use hyper::{Body, Request, StatusCode};
use lb_registrator::server::RequestHandler;
use lb_registrator::Reconciler;
use std::sync::Arc;
use tower::ServiceExt;

fn handler(fake: &Arc<FakeControlPlane>) -> RequestHandler {
    RequestHandler::new(Arc::new(Reconciler::new(&test_config(), fake.clone(), None)))
}

fn post(path: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

async fn body_json(response: hyper::Response<Body>) -> serde_json::Value {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_up_then_down_over_http() {
    let fake = Arc::new(single_host_directory());
    let handler = handler(&fake);
    let payload = serde_json::to_string(&instance("web", "1.2.3.4", "32768", "443")).unwrap();

    let up = handler
        .clone()
        .oneshot(post("/v1/instances/up", payload.clone()))
        .await
        .unwrap();
    assert_eq!(up.status(), StatusCode::NO_CONTENT);
    assert_eq!(fake.balancers().len(), 1);

    let down = handler
        .oneshot(post("/v1/instances/down", payload))
        .await
        .unwrap();
    assert_eq!(down.status(), StatusCode::NO_CONTENT);
    assert!(fake.balancers().is_empty());
}

#[tokio::test]
async fn test_validation_failure_is_unprocessable() {
    let fake = Arc::new(single_host_directory());
    let payload = serde_json::to_string(&instance("web", "1.2.3.4", "32768", "8080")).unwrap();

    let response = handler(&fake)
        .oneshot(post("/v1/instances/up", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("8080"));
}

#[tokio::test]
async fn test_remote_failure_is_bad_gateway() {
    let fake = Arc::new(single_host_directory());
    fake.fail("list_load_balancers", 500);
    let payload = serde_json::to_string(&instance("web", "1.2.3.4", "32768", "443")).unwrap();

    let response = handler(&fake)
        .oneshot(post("/v1/instances/down", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let fake = Arc::new(single_host_directory());

    let response = handler(&fake)
        .oneshot(post("/v1/instances/up", "{not json".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_listing_is_always_empty() {
    let fake = Arc::new(single_host_directory());

    let response = handler(&fake).oneshot(get("/v1/instances")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn test_healthz_reflects_probe() {
    let fake = Arc::new(single_host_directory());
    let handler = handler(&fake);

    let ok = handler.clone().oneshot(get("/healthz")).await.unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    fake.fail("get_datacenter", 503);
    let failing = handler.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(failing.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_refresh_and_unknown_routes() {
    let fake = Arc::new(single_host_directory());
    let handler = handler(&fake);
    let payload = serde_json::to_string(&instance("web", "1.2.3.4", "32768", "443")).unwrap();

    let refresh = handler
        .clone()
        .oneshot(post("/v1/instances/refresh", payload))
        .await
        .unwrap();
    assert_eq!(refresh.status(), StatusCode::NO_CONTENT);

    let missing = handler.oneshot(get("/v1/nope")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
