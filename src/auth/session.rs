//! Session data and access-token claims

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::Error;

/// The credential pair returned by the token endpoint, and the persisted form of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// The access token
    pub access: String,

    /// The refresh token
    pub refresh: String,
}

/// Claims carried by the access token
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    /// The username the token was issued for
    pub username: String,

    /// The numeric user id, when the server includes it
    #[serde(default)]
    pub user_id: Option<i64>,

    /// Expiry (seconds since epoch)
    #[serde(default)]
    pub exp: Option<i64>,
}

/// An authenticated session.
///
/// Only constructible from a token pair whose access token carries a username,
/// so a session is never observed with tokens but without identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    tokens: TokenPair,
    identity: Identity,
}

impl Session {
    /// Build a session from a token pair, decoding the identity from the access token
    pub fn from_tokens(tokens: TokenPair) -> Result<Self, Error> {
        if tokens.access.is_empty() || tokens.refresh.is_empty() {
            return Err(Error::invalid_token("empty token in credential pair"));
        }
        let identity = decode_identity(&tokens.access)?;
        Ok(Self { tokens, identity })
    }

    pub fn access_token(&self) -> &str {
        &self.tokens.access
    }

    pub fn refresh_token(&self) -> &str {
        &self.tokens.refresh
    }

    pub fn tokens(&self) -> &TokenPair {
        &self.tokens
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn username(&self) -> &str {
        &self.identity.username
    }

    /// Check if the access token has expired.
    ///
    /// Informational only: the API is what rejects expired tokens.
    pub fn is_expired(&self) -> bool {
        if let Some(exp) = self.identity.exp {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or(Duration::from_secs(0))
                .as_secs() as i64;

            now >= exp
        } else {
            false
        }
    }
}

/// Decode the identity claims of a JWT without verifying its signature.
///
/// The signature is the API's business; the client only needs the username.
pub fn decode_identity(token: &str) -> Result<Identity, Error> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(Error::invalid_token("expected three dot-separated segments")),
    };

    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| Error::invalid_token(format!("payload is not base64url: {}", e)))?;

    let identity: Identity = serde_json::from_slice(&bytes)
        .map_err(|e| Error::invalid_token(format!("unreadable claims: {}", e)))?;

    if identity.username.is_empty() {
        return Err(Error::invalid_token("username claim is empty"));
    }
    Ok(identity)
}
