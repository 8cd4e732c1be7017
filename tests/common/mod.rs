#![allow(dead_code)]

use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shortlink_client::auth::MemoryStorage;
use shortlink_client::config::ClientOptions;
use shortlink_client::Shortlink;

/// A signed access token whose claims carry `username`
pub fn access_token(username: &str, jti: &str) -> String {
    let claims = json!({
        "token_type": "access",
        "exp": 4_102_444_800i64,
        "iat": 1_700_000_000i64,
        "jti": jti,
        "user_id": 1,
        "username": username,
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"django-insecure")).unwrap()
}

pub fn client_for(server: &MockServer) -> Shortlink {
    Shortlink::with_storage(ClientOptions::new(&server.uri()), Arc::new(MemoryStorage::new())).unwrap()
}

/// Mount a token endpoint accepting `username`/`password`, returning the access token it issues
pub async fn mount_login(server: &MockServer, username: &str, password: &str, jti: &str) -> String {
    let access = access_token(username, jti);
    Mock::given(method("POST"))
        .and(path("/api/token/"))
        .and(body_json(json!({ "username": username, "password": password })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": access,
            "refresh": format!("refresh-{}", jti),
        })))
        .mount(server)
        .await;
    access
}

pub fn link_json(id: i64, long_url: &str, short_code: &str) -> Value {
    json!({
        "id": id,
        "long_url": long_url,
        "short_code": short_code,
        "created_at": "2026-10-16T09:30:00.123456Z",
    })
}
