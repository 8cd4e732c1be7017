//! Configuration options for the shortlink client

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// Base URL of a locally running API
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Storage key the session is persisted under
pub const SESSION_STORAGE_KEY: &str = "authTokens";

/// Cooldown applied after the API rate-limits link creation
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// API paths, relative to the base URL
pub mod endpoints {
    pub const LOGIN: &str = "/api/token/";
    pub const REFRESH: &str = "/api/token/refresh/";
    pub const REGISTER: &str = "/api/register/";
    pub const MY_URLS: &str = "/api/my-urls/";
    pub const SHORTEN: &str = "/api/shorten/";
    pub const REDIRECT: &str = "/register/";

    /// Path of a single link resource
    pub fn link(id: i64) -> String {
        format!("/api/url/{}/", id)
    }
}

/// Configuration options for the shortlink client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The base URL of the API, without a trailing slash
    pub base_url: String,

    /// Path of the token (login) endpoint
    pub login_path: String,

    /// Path prefix under which short codes redirect
    pub redirect_path: String,

    /// Where the session is persisted; `None` keeps it in memory only
    pub session_path: Option<PathBuf>,

    /// The key the session is stored under
    pub storage_key: String,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// How long link creation stays disabled after a rate-limit response
    pub cooldown: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            login_path: endpoints::LOGIN.to_string(),
            redirect_path: endpoints::REDIRECT.to_string(),
            session_path: None,
            storage_key: SESSION_STORAGE_KEY.to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

impl ClientOptions {
    /// Options pointing at the given API base URL
    pub fn new(base_url: &str) -> Self {
        Self::default().with_base_url(base_url)
    }

    /// Load options from the environment (and a `.env` file if present).
    ///
    /// Recognised variables: `SHORTLINK_API_URL`, `SHORTLINK_LOGIN_PATH`,
    /// `SHORTLINK_SESSION_PATH`, `SHORTLINK_TIMEOUT_SECS`, `SHORTLINK_COOLDOWN_SECS`.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        let mut options = Self::default();
        if let Ok(url) = env::var("SHORTLINK_API_URL") {
            url::Url::parse(&url)?;
            options = options.with_base_url(&url);
        }
        if let Ok(path) = env::var("SHORTLINK_LOGIN_PATH") {
            options = options.with_login_path(&path);
        }
        if let Ok(path) = env::var("SHORTLINK_SESSION_PATH") {
            options = options.with_session_path(Some(PathBuf::from(path)));
        }
        if let Ok(secs) = env::var("SHORTLINK_TIMEOUT_SECS") {
            let secs = parse_secs("SHORTLINK_TIMEOUT_SECS", &secs)?;
            options = options.with_request_timeout(Some(Duration::from_secs(secs)));
        }
        if let Ok(secs) = env::var("SHORTLINK_COOLDOWN_SECS") {
            let secs = parse_secs("SHORTLINK_COOLDOWN_SECS", &secs)?;
            options = options.with_cooldown(Duration::from_secs(secs));
        }
        Ok(options)
    }

    /// Set the API base URL
    pub fn with_base_url(mut self, value: &str) -> Self {
        self.base_url = value.trim_end_matches('/').to_string();
        self
    }

    /// Set the login endpoint path
    pub fn with_login_path(mut self, value: &str) -> Self {
        self.login_path = value.to_string();
        self
    }

    /// Set the redirect path prefix used to build short URLs
    pub fn with_redirect_path(mut self, value: &str) -> Self {
        self.redirect_path = value.to_string();
        self
    }

    /// Set where the session is persisted
    pub fn with_session_path(mut self, value: Option<PathBuf>) -> Self {
        self.session_path = value;
        self
    }

    /// Set the storage key
    pub fn with_storage_key(mut self, value: &str) -> Self {
        self.storage_key = value.to_string();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the rate-limit cooldown
    pub fn with_cooldown(mut self, value: Duration) -> Self {
        self.cooldown = value;
        self
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Public URL that redirects to the link behind `short_code`
    pub fn short_link_url(&self, short_code: &str) -> String {
        format!("{}{}{}", self.base_url, self.redirect_path, short_code)
    }
}

fn parse_secs(name: &str, value: &str) -> Result<u64, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("{} must be a number of seconds, got {:?}", name, value)))
}
