//! Types for shortened links

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shortened link owned by the logged-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLink {
    pub id: i64,

    /// The original URL
    pub long_url: String,

    /// The compact identifier the API assigned
    pub short_code: String,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ShortenRequest<'a> {
    pub long_url: &'a str,
}
