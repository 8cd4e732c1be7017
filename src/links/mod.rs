//! Authenticated calls for listing, creating and deleting short links

mod types;

use log::{debug, warn};
use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;

use crate::auth::Auth;
use crate::config::{endpoints, ClientOptions};
use crate::error::Error;
use crate::fetch::{self, Fetch};

pub use types::ShortLink;
use types::ShortenRequest;

/// Client for the link endpoints.
///
/// Every call carries the current access token. An unauthorized response
/// expires the session through [`Auth::expire`] and fails with
/// [`Error::SessionExpired`].
pub struct LinksClient {
    client: Client,
    options: ClientOptions,
    auth: Arc<Auth>,
}

impl LinksClient {
    pub fn new(client: Client, options: ClientOptions, auth: Arc<Auth>) -> Self {
        Self {
            client,
            options,
            auth,
        }
    }

    /// All links of the current user, newest first
    pub async fn list(&self) -> Result<Vec<ShortLink>, Error> {
        let token = self.access_token()?;
        let url = self.options.url(endpoints::MY_URLS);

        let response = Fetch::get(&self.client, &url)
            .timeout(self.options.request_timeout)
            .bearer_auth(&token)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(self.rejected(&token, response).await);
        }
        let links: Vec<ShortLink> = fetch::json(response).await?;
        debug!("Fetched {} links", links.len());
        Ok(links)
    }

    /// Shorten `long_url`.
    ///
    /// Fails with [`Error::RateLimited`] when the API throttles creation and
    /// with [`Error::Validation`] when it rejects the URL.
    pub async fn create(&self, long_url: &str) -> Result<ShortLink, Error> {
        let token = self.access_token()?;
        let url = self.options.url(endpoints::SHORTEN);

        let response = Fetch::post(&self.client, &url)
            .timeout(self.options.request_timeout)
            .bearer_auth(&token)
            .json(&ShortenRequest { long_url })?
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED | StatusCode::OK => {}
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Link creation rate limited");
                return Err(Error::RateLimited);
            }
            StatusCode::BAD_REQUEST => {
                return Err(Error::Validation(fetch::field_errors(response).await?));
            }
            _ => return Err(self.rejected(&token, response).await),
        }

        let link: ShortLink = fetch::json(response).await?;
        debug!("Created {} -> {}", link.short_code, link.long_url);
        Ok(link)
    }

    /// Delete one of the user's links
    pub async fn delete(&self, id: i64) -> Result<(), Error> {
        let token = self.access_token()?;
        let url = self.options.url(&endpoints::link(id));

        let response = Fetch::delete(&self.client, &url)
            .timeout(self.options.request_timeout)
            .bearer_auth(&token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                debug!("Deleted link {}", id);
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(Error::NotFound(id)),
            _ => Err(self.rejected(&token, response).await),
        }
    }

    fn access_token(&self) -> Result<String, Error> {
        self.auth
            .session()
            .map(|s| s.access_token().to_string())
            .ok_or(Error::NotAuthenticated)
    }

    async fn rejected(&self, token: &str, response: Response) -> Error {
        if response.status() == StatusCode::UNAUTHORIZED {
            self.auth.expire(token);
            return Error::SessionExpired;
        }
        fetch::unexpected(response).await
    }
}
