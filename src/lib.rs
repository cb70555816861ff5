pub mod captcha;
pub mod configuration;
pub mod content_store;
pub mod domain;
pub mod mailing_list;
pub mod routes;
pub mod signup_form;
pub mod startup;
pub mod telemetry;
