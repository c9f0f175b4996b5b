// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use axum::http::{Request, StatusCode};
use lockfleet_rs::cfg::config::LockMapping;
use serde_json::json;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::oneshot,
};
use tower::ServiceExt;

use crate::integration_tests::common::{bearer_token, build_single_device_state, response_json, router_for};

async fn get_status(router: &axum::Router, token: &str) -> serde_json::Value {
    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/status")
        .header("authorization", format!("Bearer {token}"))
        .body(axum::body::Body::empty())
        .expect("build request");
    let response = router.clone().oneshot(request).await.expect("status response");
    assert_eq!(response.status(), StatusCode::OK);
    response_json(response).await
}

#[tokio::test]
async fn a_second_status_poll_one_second_later_is_served_from_cache() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock device");
    let addr = listener.local_addr().expect("local addr");
    let (extra_write_tx, extra_write_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.expect("accept mock connection");
        let mut buf = [0u8; 6];
        // Exactly one status command should ever reach the device.
        sock.read_exact(&mut buf).await.expect("read status command");
        sock.write_all(&[0u8; 12]).await.expect("write status response");

        // Watch for a second command over the whole test window; report
        // back whether one ever arrived.
        let mut probe = [0u8; 1];
        let saw_second_command =
            tokio::time::timeout(Duration::from_millis(1500), sock.read(&mut probe))
                .await
                .map(|r| r.unwrap_or(0) > 0)
                .unwrap_or(false);
        let _ = extra_write_tx.send(saw_second_command);
    });

    let state = build_single_device_state(&addr.ip().to_string(), addr.port(), 1, vec![LockMapping {
        id: "A".to_string(),
        board: 0,
        lock: 1,
    }])
    .await;
    let router = router_for(state);
    let token = bearer_token(&router).await;

    let first = get_status(&router, &token).await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    let second = get_status(&router, &token).await;

    assert_eq!(first, second);
    assert_eq!(first, json!({ "id": { "A": { "status": false } } }));

    let saw_second_command = extra_write_rx.await.expect("mock reported back");
    assert!(!saw_second_command, "the cached status poll should emit zero bytes on the transport");
}
