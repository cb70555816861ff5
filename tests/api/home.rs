use chrono::Local;
use chrono::SecondsFormat;
use serde_json::json;
use tour_page::domain::start_of_today;
use wiremock::matchers::any;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_app;

#[tokio::test]
async fn lists_upcoming_shows() {
    let app = spawn_app().await;

    Mock::given(method("GET"))
        .and(path("/api/shows"))
        .and(query_param("sort", "date"))
        .and(query_param("pagination", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "docs": [
                {"id": 1, "date": "2030-05-01T19:00:00.000Z", "venue": "Lido", "location": "Berlin"},
                {"id": 2, "date": "2030-06-11T20:00:00.000Z", "venue": "Badehaus"},
            ],
        })))
        .expect(1)
        .mount(&app.content_store)
        .await;

    let resp = app.get_home().await;
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.headers()["content-type"].to_str().unwrap(),
        "text/html; charset=utf-8"
    );

    let html = resp.text().await.unwrap();
    let lido = html.find("Lido").expect("first show");
    let badehaus = html.find("Badehaus").expect("second show");
    assert!(lido < badehaus);
    assert!(html.contains("Berlin"));
    assert!(html.contains(r#"data-sitekey="test-site-key""#));
}

#[tokio::test]
async fn shows_are_queried_from_midnight() {
    let app = spawn_app().await;
    app.mount_shows(json!([])).await;

    let before = start_of_today(&Local::now());
    app.get_home().await.error_for_status().unwrap();
    let after = start_of_today(&Local::now());

    let requests = app.content_store.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let since = requests[0]
        .url
        .query_pairs()
        .find(|(k, _)| k == "where[date][greater_than_equal]")
        .map(|(_, v)| v.into_owned())
        .expect("date filter");

    // the test may straddle midnight
    let expected = [before, after].map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true));
    assert!(expected.contains(&since), "{since} not in {expected:?}");
}

#[tokio::test]
async fn no_shows() {
    let app = spawn_app().await;
    app.mount_shows(json!([])).await;

    let html = app.get_home().await.text().await.unwrap();
    assert!(html.contains("no upcoming shows"));
    assert!(html.contains(r#"href="/faq""#));
    assert!(html.contains(r#"href="/songbook""#));
}

#[tokio::test]
async fn content_store_failure_is_a_page_error() {
    let app = spawn_app().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.content_store)
        .await;

    let resp = app.get_home().await;
    assert_eq!(resp.status().as_u16(), 500);
}

#[tokio::test]
async fn form_post_renders_success() {
    let app = spawn_app().await;
    app.mount_shows(json!([{"date": "2030-05-01T19:00:00.000Z", "venue": "Lido"}]))
        .await;
    app.mount_captcha(true).await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.mailing_list)
        .await;

    let resp = app
        .post_home(&[("email", "a@b.com"), ("h-captcha-response", "token")])
        .await;
    assert_eq!(resp.status().as_u16(), 200);

    let html = resp.text().await.unwrap();
    // escaped by the template, so only check up to the first '/'
    assert!(html.contains("Thanks for signing up! Check your inbox"));
    // the form is cleared and the captcha collapsed
    assert!(!html.contains("a@b.com"));
    assert!(html.contains(r#"style="display: none""#));
    // shows are loaded again after the action
    assert!(html.contains("Lido"));
}

#[tokio::test]
async fn form_post_renders_failure() {
    let app = spawn_app().await;
    app.mount_shows(json!([])).await;
    app.mount_captcha(true).await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.mailing_list)
        .await;

    let resp = app
        .post_home(&[("email", "a@b.com"), ("h-captcha-response", "token")])
        .await;
    assert_eq!(resp.status().as_u16(), 200);

    let html = resp.text().await.unwrap();
    assert!(html.contains("We couldn&#x27;t sign you up. Please try again."));
    // still populated, panel still open to show the error
    assert!(html.contains(r#"value="a@b.com""#));
    assert!(html.contains(r#"style="display: block""#));
}

#[tokio::test]
async fn form_post_without_captcha() {
    let app = spawn_app().await;
    app.mount_shows(json!([])).await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mailing_list)
        .await;

    let html = app
        .post_home(&[("email", "a@b.com")])
        .await
        .text()
        .await
        .unwrap();
    assert!(html.contains("Please confirm the captcha."));
    assert!(html.contains(r#"value="a@b.com""#));
}
