use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use tera::Tera;
use tracing_actix_web::TracingLogger;

use crate::captcha::CaptchaClient;
use crate::configuration::Environment;
use crate::configuration::Settings;
use crate::configuration::SiteSettings;
use crate::content_store::ContentStore;
use crate::mailing_list::MailingListClient;
use crate::routes::health_check;
use crate::routes::home;
use crate::routes::home_signup;
use crate::routes::newsletter_signup;
use crate::routes::templates;

/// Wrapper for actix's `Server` with access to the bound port. Not to be
/// confused with actix's `App`!
pub struct Application {
    /// Left private; use `get_port` to access
    port: u16,
    server: Server,
}

impl Application {
    /// Bind the listener and build every outbound client from `cfg`. Fails
    /// before serving anything if any of them can't be built.
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(addr)?;

        // with port 0, the OS picks one; tests need to know which
        let port = listener.local_addr()?.port();

        if cfg.environment == Environment::Local {
            tracing::warn!("running in local environment; captcha validation is disabled");
        }

        let server = run(
            listener,
            cfg.content_store.client()?,
            cfg.captcha.client(cfg.environment)?,
            cfg.mailing_list.client()?,
            cfg.site,
        )?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Because this consumes `self`, this should be the final function call (or
    /// passed to `tokio::spawn`)
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

/// The server is not responsible for binding to an address, it only listens to
/// an already bound address.
///
/// Declares all endpoints.
pub fn run(
    listener: TcpListener,
    content_store: ContentStore,
    captcha: CaptchaClient,
    mailing_list: MailingListClient,
    site: SiteSettings,
) -> Result<Server, anyhow::Error> {
    let templates: Tera = templates()?;

    // `Data` is an `Arc`; every worker gets a clone of the same clients
    let content_store = web::Data::new(content_store);
    let captcha = web::Data::new(captcha);
    let mailing_list = web::Data::new(mailing_list);
    let site = web::Data::new(site);
    let templates = web::Data::new(templates);

    // the closure runs once per worker (one per core), hence the clones
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/", web::get().to(home))
            .route("/", web::post().to(home_signup))
            .route("/newsletter", web::post().to(newsletter_signup))
            .route("/health_check", web::get().to(health_check))
            .app_data(content_store.clone())
            .app_data(captcha.clone())
            .app_data(mailing_list.clone())
            .app_data(site.clone())
            .app_data(templates.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
