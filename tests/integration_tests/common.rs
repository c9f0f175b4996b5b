// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use axum::Router;
use http_body_util::BodyExt;
use lockfleet_rs::{
    api::{router::build_router, state::AppState},
    cfg::config::{DeviceDescriptor, DeviceMap, LockMapping, Secrets},
    device::session::DeviceSession,
    registry::{DeviceRegistry, LockLocation},
};
use tokio::net::{TcpListener, TcpStream};
use tower::ServiceExt;

pub const TEST_USERNAME: &str = "admin";
pub const TEST_PASSWORD: &str = "swordfish";

pub fn test_secrets() -> Secrets {
    Secrets {
        jwt_secret: "integration-test-secret".to_string(),
        username: TEST_USERNAME.to_string(),
        password_hash: bcrypt::hash(TEST_PASSWORD, bcrypt::DEFAULT_COST).expect("bcrypt hash"),
    }
}

/// Bind a listener on an ephemeral loopback port and run `serve` against the
/// first accepted connection in the background, returning the address the
/// device session should dial.
pub async fn spawn_mock_device<F, Fut>(serve: F) -> (String, u16)
where
    F: FnOnce(TcpStream) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock device");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let (sock, _) = listener.accept().await.expect("accept mock connection");
        serve(sock).await;
    });
    (addr.ip().to_string(), addr.port())
}

/// Build a one-device config and a registry whose session is already
/// connected to a mock device on `port`. Bypasses the real port-23
/// initializer so tests can point a session at a loopback mock.
pub async fn build_single_device_state(
    address: &str,
    port: u16,
    boards: u8,
    locks: Vec<LockMapping>,
) -> Arc<AppState> {
    let registry = DeviceRegistry::new();
    let session = DeviceSession::connect_to(address.to_string(), port, boards)
        .await
        .expect("mock device should accept the connection");
    registry.insert_session(address.to_string(), session);
    for lock in &locks {
        registry.insert_lock(lock.id.clone(), LockLocation {
            address: address.to_string(),
            board: lock.board,
            lock: lock.lock,
        });
    }

    let mut devices = DeviceMap::new();
    devices.insert(address.to_string(), DeviceDescriptor { boards, locks });

    AppState::new(Arc::new(registry), devices, test_secrets())
}

/// A config with a declared device that never got a session — every lock
/// it declares should come back "offline".
pub fn unreachable_device_state(address: &str, boards: u8, locks: Vec<LockMapping>) -> Arc<AppState> {
    let registry = DeviceRegistry::new();
    let mut devices = DeviceMap::new();
    devices.insert(address.to_string(), DeviceDescriptor { boards, locks });
    AppState::new(Arc::new(registry), devices, test_secrets())
}

pub fn router_for(state: Arc<AppState>) -> Router {
    build_router(state)
}

/// Log in against the real `/api/v1/token` handler and return the bearer
/// token, exercising the same auth path a real client would.
pub async fn bearer_token(router: &Router) -> String {
    let body = serde_json::json!({ "username": TEST_USERNAME, "password": TEST_PASSWORD });
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/token")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .expect("build token request");

    let response = router.clone().oneshot(request).await.expect("token response");
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    response_json(response).await["access_token"]
        .as_str()
        .expect("access_token present")
        .to_string()
}

pub fn authed_request(
    method: &str,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(axum::body::Body::from(body.to_string()))
        .expect("build request")
}

/// A bodiless request carrying an arbitrary (or absent) `Authorization`
/// header, for exercising the bearer extractor directly against
/// `GET /api/v1/status`-shaped routes.
pub fn request_with_auth_header(
    method: &str,
    uri: &str,
    authorization: Option<&str>,
) -> axum::http::Request<axum::body::Body> {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    builder.body(axum::body::Body::empty()).expect("build request")
}

pub async fn response_json(response: axum::http::Response<axum::body::Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.expect("read body").to_bytes();
    serde_json::from_slice(&bytes).expect("response json")
}
