use reqwest::{Method, StatusCode};

use fake::faker::address::en::CityName;
use fake::faker::internet::en::SafeEmail;
use fake::Fake;

use crate::helpers::{assert_error, json_body, NewSubscriber, TestApp};

const UNKNOWN_TOKEN: &str = "00000000-0000-0000-0000-000000000000";

fn is_canonical_uuid(value: &str) -> bool {
    value.len() == 36
        && value.chars().enumerate().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_hexdigit(),
        })
}

async fn subscribe(app: &TestApp, new_subscriber: &NewSubscriber) -> String {
    let res = app
        .subscribe_json(new_subscriber)
        .await
        .expect("Failed to execute request");
    assert_eq!(StatusCode::OK, res.status());

    json_body(res).await["token"]
        .as_str()
        .expect("Response did not include a token")
        .to_string()
}

#[tokio::test]
async fn subscribe_returns_token_for_valid_json_request() {
    let app = TestApp::spawn().await;
    let email: String = SafeEmail().fake();
    let city: String = CityName().fake();

    let res = app
        .subscribe_json(&NewSubscriber::new(&email, &city, "hourly"))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());

    let body = json_body(res).await;
    assert_eq!(
        "Subscription successful. Confirmation email sent.",
        body["message"]
    );
    let token = body["token"].as_str().unwrap();
    assert!(is_canonical_uuid(token), "Token {} is not a UUID", token);

    let subscription = app.store.find(token).expect("Subscription was not stored");
    assert_eq!(email, subscription.email);
    assert_eq!(city, subscription.city);
    assert_eq!("hourly", subscription.frequency);
    assert!(!subscription.confirmed);
    assert_ne!(subscription.id, subscription.token);
}

#[tokio::test]
async fn subscribe_accepts_form_request() {
    let app = TestApp::spawn().await;

    let res = app
        .subscribe_form(&NewSubscriber::new("form@test.com", "Lviv", "daily"))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());

    let token = json_body(res).await["token"].as_str().unwrap().to_string();
    let subscription = app.store.find(&token).expect("Subscription was not stored");
    assert_eq!("form@test.com", subscription.email);
    assert_eq!("Lviv", subscription.city);
    assert_eq!("daily", subscription.frequency);
}

#[tokio::test]
async fn subscribe_returns_bad_request_for_missing_data() {
    let app = TestApp::spawn().await;

    let test_cases: Vec<(&str, NewSubscriber)> = vec![
        (
            "missing email",
            NewSubscriber {
                email: None,
                city: Some("Kyiv".into()),
                frequency: Some("daily".into()),
            },
        ),
        (
            "missing city",
            NewSubscriber {
                email: Some("test@test.com".into()),
                city: None,
                frequency: Some("daily".into()),
            },
        ),
        (
            "missing frequency",
            NewSubscriber {
                email: Some("test@test.com".into()),
                city: Some("Kyiv".into()),
                frequency: None,
            },
        ),
        ("empty city", NewSubscriber::new("test@test.com", "", "daily")),
    ];

    for (desc, new_subscriber) in test_cases {
        let res = app
            .subscribe_json(&new_subscriber)
            .await
            .expect("Failed to execute request");

        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "API did not fail when payload was {}",
            desc
        );
        assert_eq!("Invalid input", json_body(res).await["message"]);
    }

    assert!(app.store.rows().is_empty());
}

#[tokio::test]
async fn subscribe_rejects_unknown_frequency() {
    let app = TestApp::spawn().await;

    let res = app
        .subscribe_json(&NewSubscriber::new("test@test.com", "Kyiv", "weekly"))
        .await
        .expect("Failed to execute request");

    assert_error(res, 400, "frequency must be hourly or daily").await;
    assert_eq!(0, app.store.calls());
}

#[tokio::test]
async fn subscribe_rejects_malformed_json() {
    let app = TestApp::spawn().await;

    let res = app
        .request(Method::POST, "api/subscribe")
        .header("Content-Type", "application/json")
        .body("{\"email\": ")
        .send()
        .await
        .expect("Failed to execute request");

    assert_error(res, 400, "Invalid input").await;
}

#[tokio::test]
async fn subscribe_twice_is_a_conflict() {
    let app = TestApp::spawn().await;
    let new_subscriber = NewSubscriber::new("dup@test.com", "Kyiv", "daily");

    subscribe(&app, &new_subscriber).await;

    let res = app
        .subscribe_json(&NewSubscriber::new("dup@test.com", "Kyiv", "hourly"))
        .await
        .expect("Failed to execute request");

    assert_error(res, 409, "Email already subscribed").await;
    assert_eq!(1, app.store.rows().len());
}

#[tokio::test]
async fn same_email_may_subscribe_to_another_city() {
    let app = TestApp::spawn().await;

    subscribe(&app, &NewSubscriber::new("dup@test.com", "Kyiv", "daily")).await;
    subscribe(&app, &NewSubscriber::new("dup@test.com", "Lviv", "daily")).await;

    assert_eq!(2, app.store.rows().len());
}

#[tokio::test]
async fn subscribe_returns_server_error_when_store_fails() {
    let app = TestApp::spawn().await;
    app.store.go_offline();

    let res = app
        .subscribe_json(&NewSubscriber::new("test@test.com", "Kyiv", "daily"))
        .await
        .expect("Failed to execute request");

    assert_error(res, 500, "failed to check existing subscription").await;
}

#[tokio::test]
async fn subscribe_returns_server_error_when_insert_fails() {
    let app = TestApp::spawn().await;
    app.store.fail_inserts();

    let res = app
        .subscribe_json(&NewSubscriber::new("test@test.com", "Kyiv", "daily"))
        .await
        .expect("Failed to execute request");

    assert_error(res, 500, "failed to save subscription").await;
    assert_eq!(2, app.store.calls());
    assert!(app.store.rows().is_empty());
}

#[tokio::test]
async fn subscription_can_be_confirmed() {
    let app = TestApp::spawn().await;
    let token = subscribe(&app, &NewSubscriber::new("test@test.com", "Kyiv", "daily")).await;

    let res = app.confirm(&token).await.expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    assert_eq!(
        serde_json::json!({ "message": "Subscription confirmed successfully" }),
        json_body(res).await
    );
    assert!(app.store.find(&token).unwrap().confirmed);
}

#[tokio::test]
async fn confirming_twice_still_succeeds() {
    let app = TestApp::spawn().await;
    let token = subscribe(&app, &NewSubscriber::new("test@test.com", "Kyiv", "daily")).await;

    let first = app.confirm(&token).await.expect("Failed to execute request");
    let second = app.confirm(&token).await.expect("Failed to execute request");

    assert_eq!(StatusCode::OK, first.status());
    assert_eq!(StatusCode::OK, second.status());
    assert!(app.store.find(&token).unwrap().confirmed);
}

#[tokio::test]
async fn invalid_tokens_are_rejected_without_touching_the_store() {
    let app = TestApp::spawn().await;

    let tokens = [
        "bad",
        "0000000-0000-0000-0000-000000000000",
        "zzzzzzzz-0000-0000-0000-000000000000",
    ];

    for token in tokens {
        let res = app.confirm(token).await.expect("Failed to execute request");
        assert_error(res, 400, "Invalid token").await;

        let res = app.unsubscribe(token).await.expect("Failed to execute request");
        assert_error(res, 400, "Invalid token").await;
    }

    assert_eq!(0, app.store.calls());
}

#[tokio::test]
async fn unknown_tokens_are_not_found() {
    let app = TestApp::spawn().await;

    let res = app.confirm(UNKNOWN_TOKEN).await.expect("Failed to execute request");
    assert_error(res, 404, "Token not found").await;

    let res = app
        .unsubscribe(UNKNOWN_TOKEN)
        .await
        .expect("Failed to execute request");
    assert_error(res, 404, "Token not found").await;
}

#[tokio::test]
async fn confirm_and_unsubscribe_return_server_error_when_store_fails() {
    let app = TestApp::spawn().await;
    app.store.go_offline();

    let res = app.confirm(UNKNOWN_TOKEN).await.expect("Failed to execute request");
    assert_error(res, 500, "failed to confirm subscription").await;

    let res = app
        .unsubscribe(UNKNOWN_TOKEN)
        .await
        .expect("Failed to execute request");
    assert_error(res, 500, "failed to unsubscribe").await;
}

#[tokio::test]
async fn subscribe_confirm_unsubscribe_round_trip() {
    let app = TestApp::spawn().await;
    let token = subscribe(&app, &NewSubscriber::new("test@test.com", "Kyiv", "hourly")).await;

    let res = app.confirm(&token).await.expect("Failed to execute request");
    assert_eq!(StatusCode::OK, res.status());

    let res = app.unsubscribe(&token).await.expect("Failed to execute request");
    assert_eq!(StatusCode::OK, res.status());
    assert_eq!(
        serde_json::json!({ "message": "Unsubscribed successfully" }),
        json_body(res).await
    );
    assert!(app.store.find(&token).is_none());

    let res = app.unsubscribe(&token).await.expect("Failed to execute request");
    assert_error(res, 404, "Token not found").await;

    // The pair is free to subscribe again
    subscribe(&app, &NewSubscriber::new("test@test.com", "Kyiv", "hourly")).await;
}
