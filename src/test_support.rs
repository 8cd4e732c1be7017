//! Token and session fixtures for unit tests

use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;

use crate::auth::{Session, TokenPair};

/// A signed access token carrying `username`, valid until 2100
pub(crate) fn token_for(username: &str) -> String {
    let claims = json!({
        "token_type": "access",
        "exp": 4_102_444_800i64,
        "iat": 1_700_000_000i64,
        "jti": "3f1c",
        "user_id": 7,
        "username": username,
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-secret")).unwrap()
}

pub(crate) fn session_for(username: &str) -> Session {
    Session::from_tokens(TokenPair {
        access: token_for(username),
        refresh: format!("refresh-{}", username),
    })
    .unwrap()
}
