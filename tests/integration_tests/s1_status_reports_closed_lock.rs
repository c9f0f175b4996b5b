// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use axum::http::{Request, StatusCode};
use lockfleet_rs::{cfg::config::LockMapping, protocol::frame::encode_status};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt;

use crate::integration_tests::common::{
    bearer_token, build_single_device_state, response_json, router_for, spawn_mock_device,
};

#[tokio::test]
async fn status_reflects_the_bit_set_in_the_devices_response() {
    let response_frame: [u8; 12] = [
        0xAA, 0xBB, 0xCC, 0xDD, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0xEE, 0xFF,
    ];
    let (ip, port) = spawn_mock_device(move |mut sock| async move {
        let mut buf = [0u8; 6];
        sock.read_exact(&mut buf).await.expect("read status command");
        assert_eq!(buf, encode_status(0));
        sock.write_all(&response_frame).await.expect("write status response");
    })
    .await;

    let state = build_single_device_state(&ip, port, 1, vec![LockMapping {
        id: "A".to_string(),
        board: 0,
        lock: 1,
    }])
    .await;
    let router = router_for(state);
    let token = bearer_token(&router).await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/status")
        .header("authorization", format!("Bearer {token}"))
        .body(axum::body::Body::empty())
        .expect("build request");

    let response = router.oneshot(request).await.expect("status response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body, json!({ "id": { "A": { "status": true } } }));
}
