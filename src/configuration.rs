use std::env;
use std::env::current_dir;
use std::fmt::Display;
use std::path::Path;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use config::Map;
use reqwest::Url;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde::Serialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use uuid::Uuid;

use crate::captcha::CaptchaClient;
use crate::content_store::ContentStore;
use crate::mailing_list::MailingListClient;

/// Global configuration, loaded from `configuration/*.yaml` and `APP_*` env
/// vars. See `get_configuration`.
#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub environment: Environment,
    pub application: ApplicationSettings,
    pub site: SiteSettings,
    pub content_store: ContentStoreSettings,
    pub captcha: CaptchaSettings,
    pub mailing_list: MailingListSettings,
}

/// Server configuration
#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    /// Should be localhost on dev machine, 0.0.0.0 on prod
    pub host: String,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

/// Static page content that is not managed by the content store
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct SiteSettings {
    pub title: String,
    pub storefront_url: String,
    pub contact_email: String,
    #[serde(default)]
    pub social_links: Vec<SocialLink>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct SocialLink {
    pub label: String,
    pub url: String,
}

/// Payload CMS instance holding the `shows` collection
#[derive(Deserialize, Clone, Debug)]
pub struct ContentStoreSettings {
    pub base_url: String,
    pub collection: String,

    /// Only needed when the collection is not publicly readable
    #[serde(default)]
    pub api_key: Option<Secret<String>>,

    /// Slug of the auth-enabled collection the API key belongs to
    #[serde(default = "default_auth_collection")]
    pub auth_collection: String,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

fn default_auth_collection() -> String { "users".to_owned() }

impl ContentStoreSettings {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn client(&self) -> Result<ContentStore, reqwest::Error> {
        ContentStore::new(
            self.base_url.clone(),
            self.collection.clone(),
            self.api_key
                .clone()
                .map(|key| (self.auth_collection.clone(), key)),
            self.timeout(),
        )
    }
}

/// hCaptcha credentials. Both keys may be left empty in the local environment,
/// where validation is skipped.
#[derive(Deserialize, Clone, Debug)]
pub struct CaptchaSettings {
    pub verify_url: String,
    #[serde(default)]
    pub site_key: String,
    #[serde(default = "empty_secret")]
    pub secret_key: Secret<String>,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

fn empty_secret() -> Secret<String> { Secret::new(String::new()) }

impl CaptchaSettings {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn client(
        &self,
        env: Environment,
    ) -> Result<CaptchaClient, reqwest::Error> {
        CaptchaClient::new(
            self.verify_url.clone(),
            self.site_key.clone(),
            self.secret_key.clone(),
            env == Environment::Local,
            self.timeout(),
        )
    }
}

/// Listmonk public subscription API
#[derive(Deserialize, Clone, Debug)]
pub struct MailingListSettings {
    /// Listmonk API root, e.g. `https://lists.example.com/api`
    pub base_url: String,
    pub list_id: Uuid,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl MailingListSettings {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn client(&self) -> Result<MailingListClient, reqwest::Error> {
        MailingListClient::new(self.base_url.clone(), self.list_id, self.timeout())
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            e => Err(format!("Invalid environment: {e}")),
        }
    }
}

impl Settings {
    /// Checks that deserialization alone cannot express. Every problem found
    /// is reported, not just the first.
    pub fn validate(&self) -> Result<(), String> {
        let mut problems = vec![];

        for (name, url) in [
            ("content_store.base_url", &self.content_store.base_url),
            ("captcha.verify_url", &self.captcha.verify_url),
            ("mailing_list.base_url", &self.mailing_list.base_url),
        ] {
            if let Err(e) = Url::parse(url) {
                problems.push(format!("{name} is not a valid url ({e}): {url:?}"));
            }
        }

        if self.mailing_list.list_id.is_nil() {
            problems.push("mailing_list.list_id must not be the nil uuid".to_owned());
        }

        // the captcha is bypassed locally, so the keys only matter elsewhere
        if self.environment != Environment::Local {
            if self.captcha.site_key.trim().is_empty() {
                problems.push("captcha.site_key is required".to_owned());
            }
            if self.captcha.secret_key.expose_secret().trim().is_empty() {
                problems.push("captcha.secret_key is required".to_owned());
            }
        }

        match problems.is_empty() {
            true => Ok(()),
            false => Err(problems.join("; ")),
        }
    }
}

/// Load yaml configuration files at `<project_root>/configuration`.
///
/// Missing fields, unparseable values and the checks in `Settings::validate`
/// all fail here, so the server never starts with a half-usable config.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let cfg_dir = current_dir()
        .map_err(|e| ConfigError::Message(format!("could not get current dir: {e}")))?
        .join("configuration");

    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".to_owned())
        .try_into()
        .map_err(ConfigError::Message)?;

    tracing::info!("loading config for {env} env");
    load_configuration(&cfg_dir, env, None)
}

/// Layer `base.yaml`, `{env}.yaml` and `APP_*` variables, then validate.
/// `vars` stands in for the process environment when given.
fn load_configuration(
    cfg_dir: &Path,
    env: Environment,
    vars: Option<Map<String, String>>,
) -> Result<Settings, ConfigError> {
    let settings = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))))
        // env vars are always strings; `serde-aux` parses the numeric ones.
        //
        // `APP_MAILING_LIST__LIST_ID=...` -> `Settings.mailing_list.list_id`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .source(vars),
        )
        .set_override("environment", env.as_str())?
        .build()?
        .try_deserialize::<Settings>()?;

    settings.validate().map_err(ConfigError::Message)?;
    Ok(settings)
}
