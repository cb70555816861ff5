use serde_json::json;
use tour_page::configuration::Environment;
use tour_page::routes::ActionData;
use tour_page::routes::SIGNUP_OK;
use wiremock::matchers::any;
use wiremock::matchers::body_json;
use wiremock::matchers::body_string_contains;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_app;
use crate::helpers::spawn_app_in;
use crate::helpers::TestApp;

const CAPTCHA_ERROR: &str = "Please confirm the captcha.";
const SIGNUP_FAILED: &str = "We couldn't sign you up. Please try again.";

/// The mailing list must not be called at all
async fn forbid_subscriptions(app: &TestApp) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .named("subscription endpoint")
        .expect(0)
        .mount(&app.mailing_list)
        .await;
}

async fn action_data(resp: reqwest::Response) -> ActionData {
    assert_eq!(resp.status().as_u16(), 200);
    resp.json().await.expect("action data")
}

#[tokio::test]
async fn signup_ok() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/siteverify"))
        .and(body_string_contains("response=valid-token"))
        .and(body_string_contains("secret=test-secret-key"))
        .and(body_string_contains("sitekey=test-site-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&app.captcha_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/public/subscription"))
        .and(body_json(json!({
            "email": "a@b.com",
            "list_uuids": [app.list_id.to_string()],
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.mailing_list)
        .await;

    let resp = app
        .post_newsletter(&[("email", "a@b.com"), ("h-captcha-response", "valid-token")])
        .await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    // no `error` key at all on success
    assert_eq!(body, json!({ "message": SIGNUP_OK }));
    assert!(SIGNUP_OK.starts_with("Thanks for signing up!"));
}

#[tokio::test]
async fn missing_captcha_token() {
    let app = spawn_app().await;
    forbid_subscriptions(&app).await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .named("captcha endpoint")
        .expect(0)
        .mount(&app.captcha_server)
        .await;

    for body in [
        vec![("email", "a@b.com")],
        vec![("email", "a@b.com"), ("h-captcha-response", "")],
    ] {
        let data = action_data(app.post_newsletter(&body).await).await;
        assert!(data.error);
        assert_eq!(data.message, CAPTCHA_ERROR);
    }
}

#[tokio::test]
async fn invalid_captcha_token() {
    let app = spawn_app().await;
    forbid_subscriptions(&app).await;
    app.mount_captcha(false).await;

    let data = action_data(
        app.post_newsletter(&[("email", "a@b.com"), ("h-captcha-response", "forged")])
            .await,
    )
    .await;
    assert!(data.error);
    assert_eq!(data.message, CAPTCHA_ERROR);
}

#[tokio::test]
async fn captcha_service_down() {
    let app = spawn_app().await;
    forbid_subscriptions(&app).await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(503))
        .mount(&app.captcha_server)
        .await;

    let data = action_data(
        app.post_newsletter(&[("email", "a@b.com"), ("h-captcha-response", "token")])
            .await,
    )
    .await;
    assert!(data.error);
    assert_eq!(data.message, CAPTCHA_ERROR);
}

#[tokio::test]
async fn subscription_service_failure() {
    let app = spawn_app().await;
    app.mount_captcha(true).await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        // one attempt, no retry
        .expect(1)
        .mount(&app.mailing_list)
        .await;

    let data = action_data(
        app.post_newsletter(&[("email", "a@b.com"), ("h-captcha-response", "token")])
            .await,
    )
    .await;
    assert!(data.error);
    assert_eq!(data.message, SIGNUP_FAILED);
}

#[tokio::test]
async fn invalid_email() {
    let app = spawn_app().await;
    app.mount_captcha(true).await;
    forbid_subscriptions(&app).await;

    let data = action_data(
        app.post_newsletter(&[("email", "not-an-email"), ("h-captcha-response", "token")])
            .await,
    )
    .await;
    assert!(data.error);
    assert_eq!(data.message, "Please enter a valid email address.");
}

#[tokio::test]
async fn missing_email_is_rejected() {
    let app = spawn_app().await;
    forbid_subscriptions(&app).await;

    for (body, msg) in [
        (vec![], "empty body"),
        (vec![("h-captcha-response", "token")], "no email"),
    ] {
        let resp = app.post_newsletter(&body).await;
        assert_eq!(resp.status().as_u16(), 400, "{msg}");
    }
}

#[tokio::test]
async fn local_environment_skips_captcha() {
    let app = spawn_app_in(Environment::Local).await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .expect(0)
        .mount(&app.captcha_server)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.mailing_list)
        .await;

    for body in [
        vec![("email", "a@b.com")],
        vec![("email", "a@b.com"), ("h-captcha-response", "anything")],
    ] {
        let data = action_data(app.post_newsletter(&body).await).await;
        assert!(!data.error);
        assert_eq!(data.message, SIGNUP_OK);
    }
}
