//! Gateway Integration Tests
//!
//! Presence over real sockets, with users created through the REST API.
//! Skips without `DATABASE_URL` and `JWT_SECRET`.

use integration_tests::{
    assert_json, check_test_env, fixtures::*, next_json, TestGateway, TestServer,
};
use reqwest::StatusCode;

async fn signup(server: &TestServer) -> AuthResponse {
    let response = server.post("/auth/signup", &SignupRequest::unique()).await.unwrap();
    assert_json(response, StatusCode::CREATED).await.unwrap()
}

fn online_ids(frame: &serde_json::Value) -> Vec<String> {
    frame["d"]["user_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_presence_across_gateway_sockets() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start API");
    let gateway = TestGateway::start().await.expect("Failed to start gateway");
    let alice = signup(&server).await;
    let bob = signup(&server).await;

    let (mut alice_socket, ready) = gateway.identify(&alice.access_token).await.unwrap();
    assert_eq!(ready["user_id"], alice.user.id);
    let first = next_json(&mut alice_socket).await.unwrap();
    assert_eq!(first["t"], "ONLINE_USERS");
    assert_eq!(online_ids(&first), vec![alice.user.id.clone()]);

    let (bob_socket, ready) = gateway.identify(&bob.access_token).await.unwrap();
    let online = ready["online_users"].as_array().unwrap();
    assert!(online.iter().any(|id| id == &alice.user.id));
    assert!(online.iter().any(|id| id == &bob.user.id));

    // Alice sees Bob arrive, then leave
    let arrived = next_json(&mut alice_socket).await.unwrap();
    assert!(online_ids(&arrived).contains(&bob.user.id));

    drop(bob_socket);
    let left = next_json(&mut alice_socket).await.unwrap();
    assert_eq!(left["t"], "ONLINE_USERS");
    assert_eq!(online_ids(&left), vec![alice.user.id.clone()]);
}
