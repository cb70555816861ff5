use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::SubscriberEmail;

/// Client for Listmonk's public subscription endpoint. The list itself (and
/// the double opt-in email) is managed by Listmonk.
///
/// Establishing a HTTP connection is expensive, so a single client is built at
/// startup and shared by all requests (see `startup::run`).
pub struct MailingListClient {
    http_client: Client,
    base_url: String,
    list_id: Uuid,
}

#[derive(Serialize)]
struct SubscriptionRequest<'a> {
    email: &'a str,
    list_uuids: [Uuid; 1],
}

impl MailingListClient {
    pub fn new(
        base_url: String,
        list_id: Uuid,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            list_id,
        })
    }

    /// Single attempt, no retry. Any non-2xx status is an error.
    #[tracing::instrument(name = "Subscribing to mailing list", skip(self))]
    pub async fn subscribe(
        &self,
        email: &SubscriberEmail,
    ) -> Result<(), reqwest::Error> {
        let url = format!("{}/public/subscription", self.base_url.trim_end_matches('/'));
        let body = SubscriptionRequest {
            email: email.as_ref(),
            list_uuids: [self.list_id],
        };
        self.http_client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
