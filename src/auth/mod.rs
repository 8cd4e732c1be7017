//! Authentication: login, registration, logout and manual token refresh

mod session;
mod store;
mod types;

use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use std::sync::Arc;

use crate::config::{endpoints, ClientOptions};
use crate::error::Error;
use crate::fetch::{self, Fetch};

pub use session::*;
pub use store::*;
pub use types::RegistrationProfile;
use types::{Credentials, RefreshRequest, RefreshResponse};

/// Auth gateway: the only writer of the [`SessionStore`]
pub struct Auth {
    /// HTTP client used for requests
    client: Client,

    /// Client options
    options: ClientOptions,

    /// The current session
    store: Arc<SessionStore>,
}

impl Auth {
    /// Create a new Auth gateway over `store`
    pub fn new(client: Client, options: ClientOptions, store: Arc<SessionStore>) -> Self {
        Self {
            client,
            options,
            store,
        }
    }

    /// The current session
    pub fn session(&self) -> Option<Session> {
        self.store.get()
    }

    /// Read access to the underlying store
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Log in with a username and password, replacing any current session.
    ///
    /// On failure the previous session, if any, is left as it was.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, Error> {
        let url = self.options.url(&self.options.login_path);

        let response = Fetch::post(&self.client, &url)
            .timeout(self.options.request_timeout)
            .json(&Credentials { username, password })?
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                info!("Login rejected for {}", username);
                return Err(Error::InvalidCredentials);
            }
            _ => return Err(fetch::unexpected(response).await),
        }

        let tokens: TokenPair = fetch::json(response).await?;
        let session = Session::from_tokens(tokens)?;
        self.store.set(session.clone())?;
        Ok(session)
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, profile: &RegistrationProfile) -> Result<(), Error> {
        let url = self.options.url(endpoints::REGISTER);

        let response = Fetch::post(&self.client, &url)
            .timeout(self.options.request_timeout)
            .json(profile)?
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                info!("Registered {}", profile.username);
                Ok(())
            }
            StatusCode::BAD_REQUEST => {
                let errors = fetch::field_errors(response).await?;
                debug!("Registration rejected: {}", errors);
                Err(Error::Registration(errors))
            }
            _ => Err(fetch::unexpected(response).await),
        }
    }

    /// Drop the current session. Safe to call when logged out.
    pub fn logout(&self) {
        if let Err(e) = self.store.clear() {
            warn!("Session cleared but its persisted copy remains: {}", e);
        }
    }

    /// Drop the session because the API rejected `access_token`.
    ///
    /// A session established after that token was issued is kept. Returns
    /// whether a session was dropped.
    pub fn expire(&self, access_token: &str) -> bool {
        match self.store.clear_if(access_token) {
            Ok(dropped) => {
                if dropped {
                    info!("Session expired");
                }
                dropped
            }
            Err(e) => {
                warn!("Session expired but its persisted copy remains: {}", e);
                true
            }
        }
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Never called implicitly; renewal is always an explicit request.
    pub async fn refresh_session(&self) -> Result<Session, Error> {
        let current = self.store.get().ok_or(Error::NotAuthenticated)?;
        let url = self.options.url(endpoints::REFRESH);

        let response = Fetch::post(&self.client, &url)
            .timeout(self.options.request_timeout)
            .json(&RefreshRequest {
                refresh: current.refresh_token(),
            })?
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED => {
                self.expire(current.access_token());
                return Err(Error::SessionExpired);
            }
            _ => return Err(fetch::unexpected(response).await),
        }

        let refreshed: RefreshResponse = fetch::json(response).await?;
        let session = Session::from_tokens(TokenPair {
            access: refreshed.access,
            refresh: refreshed
                .refresh
                .unwrap_or_else(|| current.refresh_token().to_string()),
        })?;
        self.store.set(session.clone())?;
        debug!("Access token refreshed for {}", session.username());
        Ok(session)
    }
}
