//! Error handling for the shortlink client

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Unified error type for the shortlink client
#[derive(Error, Debug)]
pub enum Error {
    /// Login rejected by the server
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Registration rejected, with the server's per-field messages
    #[error("Registration rejected: {0}")]
    Registration(FieldErrors),

    /// A request payload failed server-side validation
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// An authenticated call came back unauthorized; the session has been dropped
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// An authenticated call was attempted without a session
    #[error("Not logged in")]
    NotAuthenticated,

    /// The server refused the request because of its rate limit
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The action is disabled until the cooldown elapses
    #[error("Rate limit exceeded. Please wait {0} seconds.")]
    CoolingDown(u64),

    /// The link does not exist or belongs to another user
    #[error("Link {0} not found")]
    NotFound(i64),

    /// Network or HTTP related errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// An access token whose claims could not be read
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Session persistence errors
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other unexpected response from the API
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl Error {
    /// Create a new API error
    pub fn api<T: fmt::Display>(status: u16, msg: T) -> Self {
        Error::Api {
            status,
            message: msg.to_string(),
        }
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new invalid token error
    pub fn invalid_token<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidToken(msg.to_string())
    }

    /// Whether this error forced the session to be dropped
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Error::SessionExpired)
    }

    /// Whether the view that triggered the error can recover on its own.
    ///
    /// Everything except an expired or missing session stays local to the
    /// view; those two send the user back to the login page.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::SessionExpired | Error::NotAuthenticated)
    }
}

/// Per-field validation messages returned by the API.
///
/// Errors that do not belong to a field are kept under `non_field_errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub const NON_FIELD: &'static str = "non_field_errors";

    /// Build from a response body, JSON or not
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_json(&value),
            Err(_) => Self::single(Self::NON_FIELD, body.trim()),
        }
    }

    /// Build from a decoded JSON error payload
    pub fn from_json(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self::single(Self::NON_FIELD, flatten(value));
        };

        let mut errors = BTreeMap::new();
        for (field, messages) in map {
            let messages = match messages {
                Value::Array(items) => items.iter().map(flatten).collect(),
                other => vec![flatten(other)],
            };
            errors.insert(field.clone(), messages);
        }
        Self(errors)
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), vec![message.into()]);
        Self(errors)
    }

    /// Messages reported for one field
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

fn flatten(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            first = false;
            write!(f, "{}: {}", field, messages.join(" "))?;
        }
        Ok(())
    }
}
