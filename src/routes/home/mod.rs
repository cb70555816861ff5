use std::fmt::Debug;

use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use chrono::Local;
use serde::Serialize;
use tera::Context;
use tera::Tera;

use super::error_chain_fmt;
use super::sign_up;
use super::ActionData;
use super::SignupFormData;
use crate::captcha::CaptchaClient;
use crate::configuration::SiteSettings;
use crate::content_store::ContentStore;
use crate::domain::start_of_today;
use crate::domain::Show;
use crate::mailing_list::MailingListClient;
use crate::signup_form::browser_transitions;
use crate::signup_form::Panel;
use crate::signup_form::SignupForm;
use crate::signup_form::Status;
use crate::signup_form::Transition;

const TEMPLATE: &str = "index.html";

/// Build the page templates once, at startup. The template is compiled into
/// the binary (path relative to this file, checked at compile time).
pub fn templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE, include_str!("./index.html"))?;
    Ok(tera)
}

#[derive(thiserror::Error)]
pub enum PageError {
    #[error("Failed to load shows")]
    Loader(#[source] reqwest::Error),
    #[error("Failed to render page")]
    Render(#[from] tera::Error),
}

impl Debug for PageError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Page loads are not retried or degraded; the visitor just gets a 500.
impl ResponseError for PageError {
    fn status_code(&self) -> StatusCode { StatusCode::INTERNAL_SERVER_ERROR }
}

/// A `Show` as the template wants it: dates preformatted in local time
#[derive(Serialize)]
struct ShowRow<'a> {
    datetime: String,
    day: String,
    venue: Option<&'a str>,
    location: Option<&'a str>,
    tickets: Option<&'a str>,
}

impl<'a> From<&'a Show> for ShowRow<'a> {
    fn from(show: &'a Show) -> Self {
        let local = show.date.with_timezone(&Local);
        Self {
            datetime: show.date.to_rfc3339(),
            day: local.format("%a %-d %b %Y").to_string(),
            venue: show.venue.as_deref(),
            location: show.location.as_deref(),
            tickets: show.tickets.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct FormContext<'a> {
    status: Status,
    panel: Panel,
    active: bool,
    loading: bool,
    email: &'a str,
}

#[derive(Serialize)]
struct PageContext<'a> {
    site: &'a SiteSettings,
    shows: Vec<ShowRow<'a>>,
    captcha_site_key: &'a str,
    form: FormContext<'a>,
    message: Option<&'a str>,
    /// Read by the page script, which applies focus, outside clicks and
    /// dismissal through the same table
    transitions: Vec<Transition>,
}

/// The loader: every show from local midnight today onwards, earliest first.
#[tracing::instrument(name = "Loading upcoming shows", skip(store))]
async fn load_shows(store: &ContentStore) -> Result<Vec<Show>, PageError> {
    let since = start_of_today(&Local::now());
    store.upcoming_shows(since).await.map_err(|e| {
        tracing::error!(error.cause_chain = ?e, "could not load shows");
        PageError::Loader(e)
    })
}

fn render(
    templates: &Tera,
    site: &SiteSettings,
    captcha: &CaptchaClient,
    shows: &[Show],
    form: &SignupForm,
    action: Option<&ActionData>,
) -> Result<HttpResponse, PageError> {
    let page = PageContext {
        site,
        shows: shows.iter().map(ShowRow::from).collect(),
        captcha_site_key: captcha.site_key(),
        form: FormContext {
            status: form.status(),
            panel: form.panel(),
            active: form.is_active(),
            loading: form.is_loading(),
            email: form.email(),
        },
        message: action.map(|a| a.message.as_str()),
        transitions: browser_transitions(),
    };
    let body = templates.render(TEMPLATE, &Context::from_serialize(&page)?)?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(body))
}

/// `GET /`
///
/// Tour dates plus an idle signup form.
pub async fn home(
    store: web::Data<ContentStore>,
    captcha: web::Data<CaptchaClient>,
    site: web::Data<SiteSettings>,
    templates: web::Data<Tera>,
) -> Result<HttpResponse, PageError> {
    let shows = load_shows(&store).await?;
    render(&templates, &site, &captcha, &shows, &SignupForm::mounted(), None)
}

/// `POST /`
///
/// Run the signup action, then load and render the page again with its
/// result, the way a browser without JavaScript sees it. Action failures are
/// rendered as an error message (200); only a loader failure is a 500.
#[tracing::instrument(name = "Newsletter form post", skip_all)]
pub async fn home_signup(
    form: web::Form<SignupFormData>,
    store: web::Data<ContentStore>,
    captcha: web::Data<CaptchaClient>,
    mailing_list: web::Data<MailingListClient>,
    site: web::Data<SiteSettings>,
    templates: web::Data<Tera>,
) -> Result<HttpResponse, PageError> {
    let email = form.email.clone();
    let action: ActionData = sign_up(form.0, &captcha, &mailing_list).await.into();
    let signup = SignupForm::after_submission(email, action.outcome());

    let shows = load_shows(&store).await?;
    render(&templates, &site, &captcha, &shows, &signup, Some(&action))
}
