use std::fmt::Debug;

use actix_web::web;
use actix_web::HttpResponse;
use serde::Deserialize;
use serde::Serialize;

use super::error_chain_fmt;
use crate::captcha::CaptchaClient;
use crate::domain::SubscriberEmail;
use crate::mailing_list::MailingListClient;
use crate::signup_form::Outcome;

pub const SIGNUP_OK: &str =
    "Thanks for signing up! Check your inbox/spam for an email with the confirmation link.";

/// Submitted by the newsletter form, as `application/x-www-form-urlencoded`.
/// A body without `email` is rejected with 400 by the `Form` extractor.
#[derive(Deserialize)]
pub struct SignupFormData {
    pub email: String,
    /// Filled in by the hCaptcha widget; absent when the challenge was never
    /// solved
    #[serde(rename = "h-captcha-response", default)]
    pub captcha_response: Option<String>,
}

#[derive(thiserror::Error)]
pub enum SignupError {
    // these strings are shown to the visitor as-is
    #[error("Please confirm the captcha.")]
    Captcha,
    #[error("Please enter a valid email address.")]
    InvalidEmail(#[source] anyhow::Error),
    #[error("We couldn't sign you up. Please try again.")]
    Subscription(#[source] reqwest::Error),
}

impl Debug for SignupError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// What the action hands back to the view: a message, flagged as an error or
/// not. `error` is left out of the JSON when false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionData {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
    pub message: String,
}

impl ActionData {
    pub fn outcome(&self) -> Outcome {
        match self.error {
            true => Outcome::Failed,
            false => Outcome::Subscribed,
        }
    }
}

impl From<Result<(), SignupError>> for ActionData {
    fn from(result: Result<(), SignupError>) -> Self {
        match result {
            Ok(()) => Self {
                error: false,
                message: SIGNUP_OK.to_owned(),
            },
            Err(e) => Self {
                error: true,
                message: e.to_string(),
            },
        }
    }
}

/// The form action: check the captcha, then forward the email to the mailing
/// list. The subscription endpoint is only called once the captcha passed and
/// the email parsed.
///
/// Failures are logged here and converted into a message by the caller (see
/// `ActionData`); they never become an error status.
#[tracing::instrument(
    name = "Signing up for the newsletter",
    skip(form, captcha, mailing_list),
    fields(subscriber_email = %form.email)
)]
pub async fn sign_up(
    form: SignupFormData,
    captcha: &CaptchaClient,
    mailing_list: &MailingListClient,
) -> Result<(), SignupError> {
    let result = async {
        if !captcha.verify(form.captcha_response.as_deref()).await {
            return Err(SignupError::Captcha);
        }
        let email = SubscriberEmail::parse(form.email)
            .map_err(|e| SignupError::InvalidEmail(anyhow::anyhow!(e)))?;
        mailing_list
            .subscribe(&email)
            .await
            .map_err(SignupError::Subscription)
    }
    .await;

    if let Err(e) = &result {
        tracing::warn!(
            error.cause_chain = ?e,
            error.message = %e,
            "newsletter signup failed"
        );
    }
    result
}

/// `POST /newsletter`
///
/// Same action as `POST /`, answered with the action data as JSON instead of
/// a rendered page.
///
/// # Request example
///
/// ```sh
///     curl --data 'email=john@foo.com&h-captcha-response=...' http://127.0.0.1:8000/newsletter
/// ```
pub async fn newsletter_signup(
    form: web::Form<SignupFormData>,
    captcha: web::Data<CaptchaClient>,
    mailing_list: web::Data<MailingListClient>,
) -> HttpResponse {
    let data: ActionData = sign_up(form.0, &captcha, &mailing_list).await.into();
    HttpResponse::Ok().json(data)
}
