use std::time::Duration;

use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;
use reqwest::Client;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;

use crate::domain::Show;

/// Read-only client for the Payload CMS REST API. Shows are owned by the CMS;
/// we never write to it.
pub struct ContentStore {
    http_client: Client,
    base_url: String,
    collection: String,
    /// `(auth collection slug, key)`
    api_key: Option<(String, Secret<String>)>,
}

/// Envelope of `GET /api/{collection}`. Pagination fields are ignored, since
/// we always ask for every document.
#[derive(Deserialize)]
struct FindResponse<T> {
    docs: Vec<T>,
}

impl ContentStore {
    pub fn new(
        base_url: String,
        collection: String,
        api_key: Option<(String, Secret<String>)>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            collection,
            api_key,
        })
    }

    /// All shows dated on or after `since`, earliest first. Filtering and
    /// sorting happen in the CMS; the list is returned as received.
    #[tracing::instrument(name = "Fetching upcoming shows", skip(self))]
    pub async fn upcoming_shows(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Show>, reqwest::Error> {
        let url = format!(
            "{}/api/{}",
            self.base_url.trim_end_matches('/'),
            self.collection
        );
        let since = since.to_rfc3339_opts(SecondsFormat::Millis, true);

        let mut req = self.http_client.get(&url).query(&[
            ("where[date][greater_than_equal]", since.as_str()),
            ("sort", "date"),
            ("pagination", "false"),
        ]);
        if let Some((auth_collection, key)) = &self.api_key {
            req = req.header(
                "Authorization",
                format!("{auth_collection} API-Key {}", key.expose_secret()),
            );
        }

        let shows = req
            .send()
            .await?
            .error_for_status()?
            .json::<FindResponse<Show>>()
            .await?
            .docs;
        tracing::debug!(count = shows.len(), "fetched shows");
        Ok(shows)
    }
}
