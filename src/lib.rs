//! Shortlink Rust Client Library
//!
//! A client for the shortlink URL-shortening API: session handling with
//! login, registration and logout, route gating, and the dashboard actions
//! for listing, creating and deleting short links.

pub mod auth;
pub mod config;
pub mod cooldown;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod guard;
pub mod links;

#[cfg(test)]
pub(crate) mod test_support;

use reqwest::Client;
use std::sync::Arc;

use crate::auth::{Auth, FileStorage, MemoryStorage, Session, SessionStorage, SessionStore};
use crate::config::ClientOptions;
use crate::dashboard::Dashboard;
use crate::error::Error;
use crate::guard::{Navigation, Route};
use crate::links::LinksClient;

/// The main entry point for the shortlink client
pub struct Shortlink {
    /// Client options
    pub options: ClientOptions,
    /// HTTP client used for requests
    pub http_client: Client,
    auth: Arc<Auth>,
    links: Arc<LinksClient>,
}

impl Shortlink {
    /// Create a new client with default options
    ///
    /// # Example
    ///
    /// ```
    /// use shortlink_client::Shortlink;
    ///
    /// let client = Shortlink::new().unwrap();
    /// assert!(client.session().is_none());
    /// ```
    pub fn new() -> Result<Self, Error> {
        Self::new_with_options(ClientOptions::default())
    }

    /// Create a new client with custom options.
    ///
    /// The session is persisted to `options.session_path` when set, and kept
    /// in memory otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// use shortlink_client::{Shortlink, config::ClientOptions};
    ///
    /// let options = ClientOptions::new("https://sho.rt").with_login_path("/api/login/");
    /// let client = Shortlink::new_with_options(options).unwrap();
    /// ```
    pub fn new_with_options(options: ClientOptions) -> Result<Self, Error> {
        let storage: Arc<dyn SessionStorage> = match &options.session_path {
            Some(path) => Arc::new(FileStorage::new(path)),
            None => Arc::new(MemoryStorage::new()),
        };
        Self::with_storage(options, storage)
    }

    /// Create a new client persisting its session through `storage`
    pub fn with_storage(options: ClientOptions, storage: Arc<dyn SessionStorage>) -> Result<Self, Error> {
        let http_client = Client::builder().build()?;
        let store = Arc::new(SessionStore::new(storage, &options.storage_key));

        let auth = Arc::new(Auth::new(http_client.clone(), options.clone(), store));
        let links = Arc::new(LinksClient::new(
            http_client.clone(),
            options.clone(),
            Arc::clone(&auth),
        ));

        Ok(Self {
            options,
            http_client,
            auth,
            links,
        })
    }

    /// Create a client from `SHORTLINK_*` environment variables
    pub fn from_env() -> Result<Self, Error> {
        Self::new_with_options(ClientOptions::from_env()?)
    }

    /// The auth gateway for login, registration and logout
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// The client for the link endpoints
    pub fn links(&self) -> &LinksClient {
        &self.links
    }

    /// The current session
    pub fn session(&self) -> Option<Session> {
        self.auth.session()
    }

    /// Decide what to show for a navigation to `route`
    pub fn navigate(&self, route: Route) -> Navigation {
        guard::guard(self.auth.store(), route)
    }

    /// A fresh dashboard view-model. Must be used within a tokio runtime.
    pub fn dashboard(&self) -> Dashboard {
        Dashboard::new(Arc::clone(&self.links), self.options.clone())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{RegistrationProfile, Session, SessionEvent};
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::guard::{Navigation, Route};
    pub use crate::Shortlink;
}
