use std::time::Duration;

use reqwest::Client;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde::Serialize;

/// hCaptcha `siteverify` client.
///
/// Verification is fail-closed: anything other than an explicit
/// `"success": true` from the verify endpoint counts as a failed challenge.
pub struct CaptchaClient {
    http_client: Client,
    verify_url: String,
    site_key: String,
    secret_key: Secret<String>,
    /// Skip verification entirely (local environment)
    bypass: bool,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    secret: &'a str,
    sitekey: &'a str,
    response: &'a str,
}

#[derive(Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    success: bool,
}

impl CaptchaClient {
    pub fn new(
        verify_url: String,
        site_key: String,
        secret_key: Secret<String>,
        bypass: bool,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            verify_url,
            site_key,
            secret_key,
            bypass,
        })
    }

    /// Public key embedded in the page's widget
    pub fn site_key(&self) -> &str { &self.site_key }

    /// Whether `token` (the `h-captcha-response` form field) proves a human
    /// solved the challenge.
    #[tracing::instrument(name = "Verifying captcha", skip(self, token))]
    pub async fn verify(
        &self,
        token: Option<&str>,
    ) -> bool {
        if self.bypass {
            tracing::info!("captcha validation skipped in local environment");
            return true;
        }

        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => {
                tracing::info!("no captcha response submitted");
                return false;
            }
        };

        match self.siteverify(token).await {
            Ok(success) => success,
            Err(e) => {
                tracing::warn!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "captcha verification failed"
                );
                false
            }
        }
    }

    async fn siteverify(
        &self,
        token: &str,
    ) -> Result<bool, reqwest::Error> {
        let body = VerifyRequest {
            secret: self.secret_key.expose_secret(),
            sitekey: &self.site_key,
            response: token,
        };
        let resp: VerifyResponse = self
            .http_client
            .post(&self.verify_url)
            .form(&body)
            .send()
            .await?
            .json()
            .await?;
        Ok(resp.success)
    }
}
