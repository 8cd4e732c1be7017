mod common;

use serde_json::json;
use shortlink_client::auth::SessionEvent;
use shortlink_client::error::Error;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{client_for, link_json, mount_login};

#[tokio::test]
async fn test_list_attaches_bearer_token() {
    let server = MockServer::start().await;
    let access = mount_login(&server, "alice", "pw123456", "a1").await;
    Mock::given(method("GET"))
        .and(path("/api/my-urls/"))
        .and(header("Authorization", format!("Bearer {}", access).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            link_json(2, "https://example.com/b", "bbbbbb"),
            link_json(1, "https://example.com/a", "aaaaaa"),
        ])))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);
    client.auth().login("alice", "pw123456").await.unwrap();

    let links = client.links().list().await.unwrap();

    assert_eq!(links.len(), 2);
    assert_eq!(links[0].short_code, "bbbbbb");
    assert_eq!(links[1].long_url, "https://example.com/a");
}

#[tokio::test]
async fn test_calls_without_session_never_reach_the_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    let client = client_for(&server);

    assert!(matches!(client.links().list().await, Err(Error::NotAuthenticated)));
    assert!(matches!(
        client.links().create("https://example.com").await,
        Err(Error::NotAuthenticated)
    ));
    assert!(matches!(client.links().delete(1).await, Err(Error::NotAuthenticated)));
}

#[tokio::test]
async fn test_unauthorized_list_forces_logout() {
    let server = MockServer::start().await;
    mount_login(&server, "alice", "pw123456", "a1").await;
    Mock::given(method("GET"))
        .and(path("/api/my-urls/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Given token not valid for any token type",
            "code": "token_not_valid"
        })))
        .mount(&server)
        .await;
    let client = client_for(&server);
    client.auth().login("alice", "pw123456").await.unwrap();
    let mut events = client.auth().store().subscribe();

    let result = client.links().list().await;

    assert!(matches!(result, Err(Error::SessionExpired)));
    assert!(client.session().is_none());
    assert_eq!(events.try_recv().unwrap(), SessionEvent::SignedOut);
}

#[tokio::test]
async fn test_stale_rejection_keeps_newer_session() {
    let server = MockServer::start().await;
    let old = mount_login(&server, "alice", "pw123456", "a1").await;
    mount_login(&server, "bob", "hunter22", "b1").await;
    let client = client_for(&server);
    client.auth().login("alice", "pw123456").await.unwrap();
    client.auth().login("bob", "hunter22").await.unwrap();

    // a rejection of alice's token arriving after bob logged in
    assert!(!client.auth().expire(&old));
    assert_eq!(client.session().unwrap().username(), "bob");
}

#[tokio::test]
async fn test_create_returns_short_code() {
    let server = MockServer::start().await;
    mount_login(&server, "alice", "pw123456", "a1").await;
    Mock::given(method("POST"))
        .and(path("/api/shorten/"))
        .and(body_json(json!({ "long_url": "https://example.com" })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(link_json(9, "https://example.com", "Xy7pQ2")),
        )
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);
    client.auth().login("alice", "pw123456").await.unwrap();

    let link = client.links().create("https://example.com").await.unwrap();

    assert_eq!(link.id, 9);
    assert_eq!(link.short_code, "Xy7pQ2");
    assert_eq!(link.created_at.to_rfc3339(), "2026-10-16T09:30:00.123456+00:00");
}

#[tokio::test]
async fn test_create_rate_limited() {
    let server = MockServer::start().await;
    mount_login(&server, "alice", "pw123456", "a1").await;
    Mock::given(method("POST"))
        .and(path("/api/shorten/"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": "Rate limit exceeded. Try again after 1 minute."
        })))
        .mount(&server)
        .await;
    let client = client_for(&server);
    client.auth().login("alice", "pw123456").await.unwrap();

    let result = client.links().create("https://example.com").await;

    assert!(matches!(result, Err(Error::RateLimited)));
    assert!(client.session().is_some());
}

#[tokio::test]
async fn test_create_invalid_url() {
    let server = MockServer::start().await;
    mount_login(&server, "alice", "pw123456", "a1").await;
    Mock::given(method("POST"))
        .and(path("/api/shorten/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "long_url": ["Enter a valid URL."]
        })))
        .mount(&server)
        .await;
    let client = client_for(&server);
    client.auth().login("alice", "pw123456").await.unwrap();

    match client.links().create("not a url").await {
        Err(Error::Validation(errors)) => {
            assert_eq!(errors.get("long_url").unwrap(), ["Enter a valid URL."]);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_missing_link() {
    let server = MockServer::start().await;
    mount_login(&server, "alice", "pw123456", "a1").await;
    Mock::given(method("DELETE"))
        .and(path("/api/url/404/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "URL not found or unauthorized"
        })))
        .mount(&server)
        .await;
    let client = client_for(&server);
    client.auth().login("alice", "pw123456").await.unwrap();

    assert!(matches!(client.links().delete(404).await, Err(Error::NotFound(404))));
    assert!(client.session().is_some());
}

#[tokio::test]
async fn test_server_error_is_reported_with_status() {
    let server = MockServer::start().await;
    mount_login(&server, "alice", "pw123456", "a1").await;
    Mock::given(method("GET"))
        .and(path("/api/my-urls/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    let client = client_for(&server);
    client.auth().login("alice", "pw123456").await.unwrap();

    match client.links().list().await {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected API error, got {:?}", other),
    }
    assert!(client.session().is_some());
}
