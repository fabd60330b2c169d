//! Gateway role tests: API forwarding and single-page-app serving.
//!
//! Backends are real axum servers bound to ephemeral loopback ports; the
//! gateway router itself is driven with `oneshot`.

use std::net::SocketAddr;
use std::path::Path;
use std::time::{Duration, Instant};

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use greeting_api::config::{CACHE_CONTROL_INDEX, CACHE_CONTROL_STATIC};
use greeting_api::routes::api::GREETING_MESSAGE;
use greeting_api::{create_router, AppConfig, AppState};

async fn spawn_backend(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A backend playing the API role, built from this crate.
async fn spawn_greeting_backend() -> SocketAddr {
    let config = AppConfig::from_toml("").unwrap();
    spawn_backend(create_router(AppState::new(config).unwrap())).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Value> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "custom": header("x-custom"),
        "request_id": header("x-request-id"),
        "body": body,
    }))
}

async fn teapot() -> Response {
    (
        StatusCode::IM_A_TEAPOT,
        [("x-upstream", "yes")],
        "short and stout",
    )
        .into_response()
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "too late"
}

async fn spawn_echo_backend() -> SocketAddr {
    let app = Router::new()
        .route("/api/echo", any(echo))
        .route("/api/nested/echo", any(echo))
        .route("/api/teapot", get(teapot))
        .route("/api/slow", get(slow));
    spawn_backend(app).await
}

fn gateway(backend: SocketAddr, extra: &str) -> Router {
    let toml = format!(
        "[frontend]\nbackend_url = \"http://{}\"\n{}",
        backend, extra
    );
    let config = AppConfig::from_toml(&toml).unwrap();
    create_router(AppState::new(config).unwrap())
}

fn dist_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>app</html>").unwrap();
    std::fs::create_dir(dir.path().join("assets")).unwrap();
    std::fs::write(dir.path().join("assets/app.js"), "console.log(1);").unwrap();
    dir
}

fn dist_line(dir: &Path) -> String {
    format!("dist_dir = {:?}\n", dir.display().to_string())
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn gateway_relays_greeting_from_backend() {
    let backend = spawn_greeting_backend().await;
    let app = gateway(backend, "");

    let response = send(&app, get_request("/api/data")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["message"], GREETING_MESSAGE);
}

#[tokio::test]
async fn gateway_forwards_method_query_headers_and_body() {
    let backend = spawn_echo_backend().await;
    let app = gateway(backend, "");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/echo?a=1&b=two")
        .header("x-custom", "forwarded")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("ping"))
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["method"], "POST");
    assert_eq!(json["path"], "/api/echo");
    assert_eq!(json["query"], "a=1&b=two");
    assert_eq!(json["custom"], "forwarded");
    assert_eq!(json["body"], "ping");
}

#[tokio::test]
async fn gateway_forwards_nested_paths() {
    let backend = spawn_echo_backend().await;
    let app = gateway(backend, "");

    let response = send(&app, get_request("/api/nested/echo")).await;
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["method"], "GET");
    assert_eq!(json["path"], "/api/nested/echo");
    assert_eq!(json["query"], Value::Null);
}

#[tokio::test]
async fn gateway_propagates_request_id() {
    let backend = spawn_echo_backend().await;
    let app = gateway(backend, "");

    let id = "3f2504e0-4f89-41d3-9a0c-0305e82c3301";
    let request = Request::builder()
        .uri("/api/echo")
        .header("x-request-id", id)
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.headers().get("x-request-id").unwrap(), id);
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["request_id"], id);

    // Generated ids are forwarded too
    let response = send(&app, get_request("/api/echo")).await;
    let local_id = response
        .headers()
        .get("x-request-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["request_id"], local_id.as_str());
}

#[tokio::test]
async fn gateway_replaces_malformed_request_id() {
    let backend = spawn_echo_backend().await;
    let app = gateway(backend, "");

    let request = Request::builder()
        .uri("/api/echo")
        .header("x-request-id", "not-a-uuid")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    let client_id = response
        .headers()
        .get("x-request-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert!(uuid::Uuid::parse_str(&client_id).is_ok());

    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["request_id"], client_id.as_str());
}

#[tokio::test]
async fn gateway_relays_upstream_status_and_headers() {
    let backend = spawn_echo_backend().await;
    let app = gateway(backend, "");

    let response = send(&app, get_request("/api/teapot")).await;
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(response.headers().get("x-upstream").unwrap(), "yes");
    assert_eq!(body_string(response).await, "short and stout");

    let response = send(&app, get_request("/api/nowhere")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn gateway_reports_unreachable_backend() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let app = gateway(addr, "timeout_seconds = 2\n");
    let response = send(&app, get_request("/api/data")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body_string(response).await.is_empty());
}

#[tokio::test]
async fn gateway_reports_backend_timeout() {
    let backend = spawn_echo_backend().await;
    let app = gateway(backend, "timeout_seconds = 1\n");

    let started = Instant::now();
    let response = send(&app, get_request("/api/slow")).await;

    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_string(response).await;
    assert!(!body.is_empty());
    assert_ne!(body, "too late");
}

#[tokio::test]
async fn gateway_rejects_oversized_body() {
    let backend = spawn_echo_backend().await;
    let app = gateway(backend, "max_body_bytes = 8\n");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/echo")
        .body(Body::from(vec![b'x'; 100]))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn gateway_health_is_local() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let app = gateway(addr, "");
    let response = send(&app, get_request("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn gateway_serves_spa_alongside_proxy() {
    let backend = spawn_greeting_backend().await;
    let dist = dist_dir();
    let app = gateway(backend, &dist_line(dist.path()));

    let response = send(&app, get_request("/dashboard/settings")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "<html>app</html>");

    let response = send(&app, get_request("/api/data")).await;
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["message"], GREETING_MESSAGE);
}

#[tokio::test]
async fn combined_serves_static_assets() {
    let dist = dist_dir();
    let config = AppConfig::from_toml(&format!("[frontend]\n{}", dist_line(dist.path()))).unwrap();
    let app = create_router(AppState::new(config).unwrap());

    let response = send(&app, get_request("/assets/app.js")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        CACHE_CONTROL_STATIC
    );
    assert_eq!(body_string(response).await, "console.log(1);");
}

#[tokio::test]
async fn combined_falls_back_to_index() {
    let dist = dist_dir();
    let config = AppConfig::from_toml(&format!("[frontend]\n{}", dist_line(dist.path()))).unwrap();
    let app = create_router(AppState::new(config).unwrap());

    for uri in ["/", "/about", "/users/42/profile", "/assets"] {
        let response = send(&app, get_request(uri)).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            CACHE_CONTROL_INDEX,
            "{uri}"
        );
        assert_eq!(body_string(response).await, "<html>app</html>", "{uri}");
    }

    // The greeting is still answered locally
    let response = send(&app, get_request("/api/data")).await;
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["message"], GREETING_MESSAGE);
}

#[tokio::test]
async fn frontend_errors_are_not_cached_as_assets() {
    let dist = dist_dir();
    let config = AppConfig::from_toml(&format!("[frontend]\n{}", dist_line(dist.path()))).unwrap();
    let app = create_router(AppState::new(config).unwrap());

    for uri in ["/about", "/assets/app.js"] {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{uri}");
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            CACHE_CONTROL_INDEX,
            "{uri}"
        );
    }
}

#[tokio::test]
async fn missing_index_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::from_toml(&format!("[frontend]\n{}", dist_line(dir.path()))).unwrap();
    let app = create_router(AppState::new(config).unwrap());

    let response = send(&app, get_request("/about")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
