//! Dashboard state: the user's links, the last created short code, and the
//! create-link cooldown

use log::{error, warn};
use std::sync::Arc;

use crate::config::ClientOptions;
use crate::cooldown::{Cooldown, CooldownState};
use crate::error::Error;
use crate::links::{LinksClient, ShortLink};

/// View-model behind the dashboard.
///
/// Failures other than an expired session stay here as a transient message;
/// [`Error::SessionExpired`] is returned so the caller can send the user back
/// to the login view.
pub struct Dashboard {
    links: Arc<LinksClient>,
    options: ClientOptions,
    cooldown: Cooldown,
    items: Vec<ShortLink>,
    latest: Option<ShortLink>,
    error: Option<String>,
    loading: bool,
}

impl Dashboard {
    pub fn new(links: Arc<LinksClient>, options: ClientOptions) -> Self {
        let cooldown = Cooldown::new(options.cooldown);
        Self {
            links,
            options,
            cooldown,
            items: Vec::new(),
            latest: None,
            error: None,
            loading: true,
        }
    }

    /// The user's links as last fetched
    pub fn links(&self) -> &[ShortLink] {
        &self.items
    }

    /// The link created by the last successful submission
    pub fn latest(&self) -> Option<&ShortLink> {
        self.latest.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn cooldown(&self) -> CooldownState {
        self.cooldown.state()
    }

    /// Seconds until the create action is enabled again
    pub fn cooldown_remaining(&self) -> u64 {
        self.cooldown.remaining()
    }

    /// Whether the create action is enabled
    pub fn can_submit(&self) -> bool {
        self.cooldown.is_ready()
    }

    /// Message to show under the form, if any
    pub fn message(&self) -> Option<String> {
        match self.cooldown.state() {
            CooldownState::Cooling(secs) => Some(format!(
                "Rate limit exceeded. Please wait {} seconds.",
                secs
            )),
            CooldownState::Ready => self.error.clone(),
        }
    }

    /// Public URL of a link
    pub fn short_url(&self, link: &ShortLink) -> String {
        self.options.short_link_url(&link.short_code)
    }

    /// Fetch the user's links
    pub async fn load(&mut self) -> Result<(), Error> {
        let result = self.links.list().await;
        self.loading = false;
        match result {
            Ok(items) => {
                self.items = items;
                Ok(())
            }
            Err(e) => {
                error!("Error fetching links: {}", e);
                Err(e)
            }
        }
    }

    /// Shorten `long_url`.
    ///
    /// While cooling down this fails with [`Error::CoolingDown`] without
    /// contacting the API. A rate-limit response starts the cooldown.
    pub async fn submit(&mut self, long_url: &str) -> Result<ShortLink, Error> {
        if let CooldownState::Cooling(secs) = self.cooldown.state() {
            return Err(Error::CoolingDown(secs));
        }
        self.error = None;
        self.latest = None;

        match self.links.create(long_url).await {
            Ok(link) => {
                self.latest = Some(link.clone());
                // the server trims old links, so its list is authoritative
                if let Err(e) = self.load().await {
                    if e.is_session_expired() {
                        return Err(e);
                    }
                    self.items.insert(0, link.clone());
                }
                Ok(link)
            }
            Err(Error::RateLimited) => {
                self.cooldown.start();
                Err(Error::RateLimited)
            }
            Err(e) => {
                warn!("Error creating link: {}", e);
                self.error = match &e {
                    Error::SessionExpired | Error::NotAuthenticated => None,
                    Error::Validation(errors) => Some(errors.to_string()),
                    Error::Network(_) => Some("Network error".to_string()),
                    _ => Some("Something went wrong".to_string()),
                };
                Err(e)
            }
        }
    }

    /// Delete a link and drop it from the list
    pub async fn delete(&mut self, id: i64) -> Result<(), Error> {
        match self.links.delete(id).await {
            Ok(()) => {
                self.items.retain(|link| link.id != id);
                if self.latest.as_ref().map_or(false, |link| link.id == id) {
                    self.latest = None;
                }
                Ok(())
            }
            Err(e) => {
                error!("Error deleting link {}: {}", id, e);
                Err(e)
            }
        }
    }

    /// Stop the cooldown ticker. Also happens on drop.
    pub fn close(&self) {
        self.cooldown.cancel();
    }
}
