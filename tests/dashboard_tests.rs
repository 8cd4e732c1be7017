mod common;

use serde_json::json;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use shortlink_client::auth::MemoryStorage;
use shortlink_client::config::ClientOptions;
use shortlink_client::cooldown::CooldownState;
use shortlink_client::error::Error;
use shortlink_client::Shortlink;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{client_for, link_json, mount_login};

async fn mount_list(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/my-urls/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_rate_limit_disables_submission_without_calling_api() {
    let server = MockServer::start().await;
    mount_login(&server, "alice", "pw123456", "a1").await;
    Mock::given(method("POST"))
        .and(path("/api/shorten/"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": "Rate limit exceeded. Try again after 1 minute."
        })))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);
    client.auth().login("alice", "pw123456").await.unwrap();
    let mut dashboard = client.dashboard();

    let first = dashboard.submit("https://example.com").await;
    assert!(matches!(first, Err(Error::RateLimited)));
    assert_eq!(dashboard.cooldown(), CooldownState::Cooling(60));
    assert!(!dashboard.can_submit());
    assert_eq!(
        dashboard.message().as_deref(),
        Some("Rate limit exceeded. Please wait 60 seconds.")
    );

    let second = dashboard.submit("https://example.com").await;
    assert!(matches!(second, Err(Error::CoolingDown(secs)) if secs > 0));

    dashboard.close();
    assert!(dashboard.can_submit());
    assert_eq!(dashboard.message(), None);
}

#[tokio::test]
async fn test_transient_error_cleared_by_next_submission() {
    let server = MockServer::start().await;
    mount_login(&server, "alice", "pw123456", "a1").await;
    Mock::given(method("POST"))
        .and(path("/api/shorten/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "long_url": ["Enter a valid URL."]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/shorten/"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(link_json(3, "https://example.com", "Q9w8E7")),
        )
        .mount(&server)
        .await;
    mount_list(&server, json!([link_json(3, "https://example.com", "Q9w8E7")])).await;
    let client = client_for(&server);
    client.auth().login("alice", "pw123456").await.unwrap();
    let mut dashboard = client.dashboard();

    let failed = dashboard.submit("example").await;
    assert!(matches!(failed, Err(Error::Validation(_))));
    assert_eq!(dashboard.message().as_deref(), Some("long_url: Enter a valid URL."));
    assert!(dashboard.can_submit());

    let link = dashboard.submit("https://example.com").await.unwrap();
    assert_eq!(dashboard.message(), None);
    assert_eq!(dashboard.latest(), Some(&link));
    assert_eq!(dashboard.links(), &[link.clone()]);
    assert_eq!(dashboard.short_url(&link), format!("{}/register/Q9w8E7", server.uri()));
}

#[tokio::test]
async fn test_load_marks_dashboard_loaded() {
    let server = MockServer::start().await;
    mount_login(&server, "alice", "pw123456", "a1").await;
    mount_list(&server, json!([link_json(1, "https://rust-lang.org", "r5t")])).await;
    let client = client_for(&server);
    client.auth().login("alice", "pw123456").await.unwrap();
    let mut dashboard = client.dashboard();
    assert!(dashboard.is_loading());

    dashboard.load().await.unwrap();

    assert!(!dashboard.is_loading());
    assert_eq!(dashboard.links()[0].short_code, "r5t");
}

#[tokio::test]
async fn test_rate_limit_lifts_after_cooldown_elapses() {
    let server = MockServer::start().await;
    mount_login(&server, "alice", "pw123456", "a1").await;
    Mock::given(method("POST"))
        .and(path("/api/shorten/"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    let client = client_for(&server);
    client.auth().login("alice", "pw123456").await.unwrap();
    let mut dashboard = client.dashboard();

    assert!(matches!(
        dashboard.submit("https://example.com").await,
        Err(Error::RateLimited)
    ));

    // no more requests from here on, so the clock can be driven by hand
    tokio::time::pause();
    tokio::time::sleep(Duration::from_millis(59_500)).await;
    assert_eq!(dashboard.cooldown(), CooldownState::Cooling(1));
    assert!(!dashboard.can_submit());
    assert_eq!(
        dashboard.message().as_deref(),
        Some("Rate limit exceeded. Please wait 1 seconds.")
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(dashboard.can_submit());
    assert_eq!(dashboard.cooldown(), CooldownState::Ready);
    assert_eq!(dashboard.message(), None);
}

#[tokio::test]
async fn test_network_failure_does_not_cool_down() {
    let server = MockServer::start().await;
    mount_login(&server, "alice", "pw123456", "a1").await;
    let storage = Arc::new(MemoryStorage::new());
    let online = Shortlink::with_storage(ClientOptions::new(&server.uri()), storage.clone()).unwrap();
    online.auth().login("alice", "pw123456").await.unwrap();

    let closed = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };
    let offline = Shortlink::with_storage(ClientOptions::new(&closed), storage).unwrap();
    assert_eq!(offline.session().unwrap().username(), "alice");
    let mut dashboard = offline.dashboard();

    let err = dashboard.submit("https://example.com").await.unwrap_err();
    assert!(matches!(err, Error::Network(_)));
    assert_eq!(dashboard.cooldown(), CooldownState::Ready);
    assert!(dashboard.can_submit());
    assert_eq!(dashboard.message().as_deref(), Some("Network error"));
    assert!(offline.session().is_some());
}

#[tokio::test]
async fn test_malformed_create_response_is_not_a_network_error() {
    let server = MockServer::start().await;
    mount_login(&server, "alice", "pw123456", "a1").await;
    Mock::given(method("POST"))
        .and(path("/api/shorten/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "not-a-number" })))
        .mount(&server)
        .await;
    let client = client_for(&server);
    client.auth().login("alice", "pw123456").await.unwrap();
    let mut dashboard = client.dashboard();

    let err = dashboard.submit("https://example.com").await.unwrap_err();

    assert!(matches!(err, Error::Json(_)));
    assert_eq!(dashboard.message().as_deref(), Some("Something went wrong"));
    assert!(dashboard.can_submit());
}
