//! API Integration Tests
//!
//! These tests require a running PostgreSQL instance and the environment
//! variables `DATABASE_URL` and `JWT_SECRET`; they skip otherwise.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use integration_tests::{
    assert_json, assert_status, check_test_env, error_code, fixtures::*, TestServer,
};
use reqwest::StatusCode;

async fn signup(server: &TestServer) -> (SignupRequest, AuthResponse) {
    let request = SignupRequest::unique();
    let response = server.post("/auth/signup", &request).await.unwrap();
    let auth = assert_json(response, StatusCode::CREATED).await.unwrap();
    (request, auth)
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get_raw("/health").await.unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server.get_raw("/health/ready").await.unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

// ============================================================================
// Auth Tests
// ============================================================================

#[tokio::test]
async fn test_signup_and_login() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let request = SignupRequest::unique();

    let response = server.post("/auth/signup", &request).await.unwrap();
    assert!(response.headers().get("set-cookie").is_some());
    let auth: AuthResponse = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(auth.user.username, request.username);
    assert!(!auth.access_token.is_empty());

    let response = server
        .post("/auth/login", &LoginRequest::from_signup(&request))
        .await
        .unwrap();
    let login: AuthResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(login.user.id, auth.user.id);
}

#[tokio::test]
async fn test_signup_duplicate_is_conflict() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (request, _) = signup(&server).await;

    let response = server.post("/auth/signup", &request).await.unwrap();
    assert_status(response, StatusCode::CONFLICT).await.unwrap();
}

#[tokio::test]
async fn test_login_failures() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (request, _) = signup(&server).await;

    let unknown = LoginRequest {
        username: format!("nobody{}", unique_suffix()),
        password: "whatever1".to_string(),
    };
    let response = server.post("/auth/login", &unknown).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let wrong = LoginRequest {
        username: request.username,
        password: "WrongPass999".to_string(),
    };
    let response = server.post("/auth/login", &wrong).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(response).await.unwrap(), "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_refresh_token() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = signup(&server).await;

    let body = serde_json::json!({ "refresh_token": auth.refresh_token });
    let response = server.post("/auth/refresh", &body).await.unwrap();
    let refreshed: AuthResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(refreshed.user.id, auth.user.id);
}

// ============================================================================
// Follow Graph Tests
// ============================================================================

#[tokio::test]
async fn test_follow_toggle_is_mirrored() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, alice) = signup(&server).await;
    let (_, bob) = signup(&server).await;
    let follow = format!("/users/{}/follow", bob.user.id);

    let response = server.post_empty_auth(&follow, &alice.access_token).await.unwrap();
    let toggled: FollowResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(toggled.following);
    assert_eq!(toggled.followers_count, 1);
    assert_eq!(toggled.following_count, 1);

    let response = server.get(&format!("/users/{}", alice.user.id)).await.unwrap();
    let profile: UserResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(profile.following, vec![bob.user.id.clone()]);

    let response = server
        .get(&format!("/users/{}/followers", bob.user.id))
        .await
        .unwrap();
    let followers: Vec<UserSummary> = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0].id, alice.user.id);

    let response = server.post_empty_auth(&follow, &alice.access_token).await.unwrap();
    let toggled: FollowResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(!toggled.following);
    assert_eq!(toggled.followers_count, 0);
}

#[tokio::test]
async fn test_self_follow_and_unknown_target() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, alice) = signup(&server).await;

    let own = format!("/users/{}/follow", alice.user.id);
    let response = server.post_empty_auth(&own, &alice.access_token).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await.unwrap(), "INVALID_OPERATION");

    let response = server
        .post_empty_auth("/users/1/follow", &alice.access_token)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Post and Feed Tests
// ============================================================================

#[tokio::test]
async fn test_feed_lists_followees_newest_first() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, alice) = signup(&server).await;
    let (_, carol) = signup(&server).await;
    let (_, dave) = signup(&server).await;

    let response = server.get_auth("/posts/feed", &alice.access_token).await.unwrap();
    let empty: Vec<PostResponse> = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(empty.is_empty());

    for target in [&carol, &dave] {
        let path = format!("/users/{}/follow", target.user.id);
        server.post_empty_auth(&path, &alice.access_token).await.unwrap();
    }

    let response = server
        .post_auth("/posts", &carol.access_token, &CreatePostRequest::new("P1"))
        .await
        .unwrap();
    let p1: PostResponse = assert_json(response, StatusCode::CREATED).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let response = server
        .post_auth("/posts", &dave.access_token, &CreatePostRequest::new("P2"))
        .await
        .unwrap();
    let p2: PostResponse = assert_json(response, StatusCode::CREATED).await.unwrap();

    let response = server.get_auth("/posts/feed", &alice.access_token).await.unwrap();
    let feed: Vec<PostResponse> = assert_json(response, StatusCode::OK).await.unwrap();
    let ids: Vec<_> = feed.iter().map(|p| p.id.clone()).collect();
    assert_eq!(ids, vec![p2.id, p1.id]);
}

#[tokio::test]
async fn test_post_like_and_delete() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, alice) = signup(&server).await;
    let (_, bob) = signup(&server).await;

    let response = server
        .post_auth("/posts", &alice.access_token, &CreatePostRequest::new("hello"))
        .await
        .unwrap();
    let post: PostResponse = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(post.author_id, alice.user.id);

    let like = format!("/posts/{}/like", post.id);
    let response = server.put_auth(&like, &bob.access_token).await.unwrap();
    let liked: LikeResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(liked.liked);
    assert_eq!(liked.likes, 1);

    let path = format!("/posts/{}", post.id);
    let response = server.delete_auth(&path, &bob.access_token).await.unwrap();
    assert_status(response, StatusCode::FORBIDDEN).await.unwrap();

    let response = server.delete_auth(&path, &alice.access_token).await.unwrap();
    assert_status(response, StatusCode::NO_CONTENT).await.unwrap();

    let response = server.get(&path).await.unwrap();
    assert_status(response, StatusCode::NOT_FOUND).await.unwrap();
}
