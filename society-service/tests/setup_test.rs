mod common;

use chrono::{Duration, Utc};
use common::{TestApp, BASE_URL};
use serde_json::{json, Value};
use society_service::services::SocietyStore;

#[tokio::test]
async fn setup_status_requires_key() {
    let app = TestApp::spawn().await;
    let (society_id, _) = app.approved_society("a@x.com").await;

    let response = app.get(&format!("/society/setup/{}", society_id)).await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn setup_status_unknown_society_returns_404() {
    let app = TestApp::spawn().await;

    let response = app.get("/society/setup/missing?key=anything").await;

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn setup_status_rejects_wrong_key() {
    let app = TestApp::spawn().await;
    let (society_id, _) = app.approved_society("a@x.com").await;

    let response = app
        .get(&format!("/society/setup/{}?key=wrong", society_id))
        .await;

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "unauthorized");
}

#[tokio::test]
async fn setup_status_reports_progress() {
    let app = TestApp::spawn().await;
    let (society_id, key) = app.approved_society("a@x.com").await;

    let response = app
        .get(&format!("/society/setup/{}?key={}", society_id, key))
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["society_id"], society_id.as_str());
    assert_eq!(body["society_name"], "Oak Residency");
    assert_eq!(body["state"], "ADMIN_VERIFIED");
    assert_eq!(body["is_verified"], true);
    assert_eq!(body["needs_password_setup"], true);
    assert_eq!(body["next_step"], "set_password");
}

#[tokio::test]
async fn expired_key_is_rejected_even_when_correct() {
    let app = TestApp::spawn().await;
    let (society_id, key) = app.approved_society("a@x.com").await;

    let mut society = app.store.find_society(&society_id).await.unwrap().unwrap();
    society.admin_secret_key_expires = Utc::now() - Duration::minutes(1);
    app.store.save_society(&society).await.unwrap();

    for candidate in [key.as_str(), "wrong"] {
        let response = app
            .get(&format!("/society/setup/{}?key={}", society_id, candidate))
            .await;
        assert_eq!(response.status(), 401);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "expired");
    }
}

#[tokio::test]
async fn set_password_validates_input() {
    let app = TestApp::spawn().await;
    let (society_id, key) = app.approved_society("a@x.com").await;
    let path = format!("/society/setup/{}/set-password?key={}", society_id, key);

    let cases = [
        (json!({}), "validation_error"),
        (
            json!({ "password": "Passw0rd", "confirm_password": "Passw0rd1" }),
            "password_mismatch",
        ),
        (
            json!({ "password": "short1", "confirm_password": "short1" }),
            "weak_password",
        ),
        (
            json!({ "password": "nouppercase1", "confirm_password": "nouppercase1" }),
            "weak_password",
        ),
    ];

    for (body, code) in cases {
        let response = app.post_json(&path, &body).await;
        assert_eq!(response.status(), 400, "{}", code);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], code);
    }

    let society = app.store.find_society(&society_id).await.unwrap().unwrap();
    assert!(society.password.is_none());
}

#[tokio::test]
async fn set_password_stores_hash_and_redirects_to_configure() {
    let app = TestApp::spawn().await;
    let (society_id, key) = app.approved_society("a@x.com").await;

    let response = app.set_password(&society_id, &key, "Password1").await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(
        body["redirect_to"],
        format!("{}/society/setup/{}/configure?key={}", BASE_URL, society_id, key)
    );

    let society = app.store.find_society(&society_id).await.unwrap().unwrap();
    let hash = society.password.unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert!(!hash.contains("Password1"));
}

#[tokio::test]
async fn set_password_before_approval_is_invalid_state() {
    let app = TestApp::spawn().await;
    let (society_id, key) = app.register("a@x.com").await;

    let response = app.set_password(&society_id, &key, "Password1").await;

    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "invalid_state");
}

#[tokio::test]
async fn configure_with_empty_list_is_a_no_op() {
    let app = TestApp::spawn().await;
    let (society_id, key) = app.approved_society("a@x.com").await;

    let response = app
        .post_json(
            &format!("/society/setup/{}/configure?key={}", society_id, key),
            &json!({ "amenities": [] }),
        )
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["amenities"].as_array().unwrap().len(), 0);

    let society = app.store.find_society(&society_id).await.unwrap().unwrap();
    assert_eq!(society.state.as_str(), "ADMIN_VERIFIED");
}

#[tokio::test]
async fn configure_requires_password_first() {
    let app = TestApp::spawn().await;
    let (society_id, key) = app.approved_society("a@x.com").await;

    let response = app
        .post_json(
            &format!("/society/setup/{}/configure?key={}", society_id, key),
            &json!({ "amenities": [{ "name": "Pool", "type": "Recreation" }] }),
        )
        .await;

    assert_eq!(response.status(), 409);
    assert!(app.store.amenities_for(&society_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn configure_rejects_blank_amenity_name() {
    let app = TestApp::spawn().await;
    let (society_id, key) = app.approved_society("a@x.com").await;
    app.set_password(&society_id, &key, "Password1").await;

    let response = app
        .post_json(
            &format!("/society/setup/{}/configure?key={}", society_id, key),
            &json!({ "amenities": [{ "name": "  ", "type": "Recreation" }] }),
        )
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn configure_appends_on_repeat_calls() {
    let app = TestApp::spawn().await;
    let (society_id, key) = app.approved_society("a@x.com").await;
    app.set_password(&society_id, &key, "Password1").await;
    let path = format!("/society/setup/{}/configure?key={}", society_id, key);

    let first = app
        .post_json(&path, &json!({ "amenities": [{ "name": "Pool", "type": "Recreation" }] }))
        .await;
    assert_eq!(first.status(), 200);

    let second = app
        .post_json(
            &path,
            &json!({ "amenities": [{ "amenity_name": "Gym", "amenity_type": "Fitness" }] }),
        )
        .await;
    assert_eq!(second.status(), 200);
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["amenities"][0]["amenity_name"], "Gym");
    assert_eq!(body["amenities"][0]["amenity_type"], "Fitness");

    let amenities = app.store.amenities_for(&society_id).await.unwrap();
    assert_eq!(amenities.len(), 2);
}

#[tokio::test]
async fn configure_without_amenities_is_a_no_op() {
    let app = TestApp::spawn().await;
    let (society_id, key) = app.approved_society("a@x.com").await;
    app.set_password(&society_id, &key, "Password1").await;
    let path = format!("/society/setup/{}/configure?key={}", society_id, key);

    let bodyless = app.client.post(app.url(&path)).send().await.unwrap();
    let null_list = app.post_json(&path, &json!({ "amenities": null })).await;

    for response in [bodyless, null_list] {
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["amenities"].as_array().unwrap().len(), 0);
    }

    let society = app.store.find_society(&society_id).await.unwrap().unwrap();
    assert_eq!(society.state.as_str(), "PASSWORD_SET");
    assert!(app.store.amenities_for(&society_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn set_password_accepts_html_form_post() {
    let app = TestApp::spawn().await;
    let (society_id, key) = app.approved_society("a@x.com").await;

    let response = app
        .client
        .post(app.url(&format!(
            "/society/setup/{}/set-password?key={}",
            society_id, key
        )))
        .form(&[("password", "Password1"), ("confirm_password", "Password1")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let society = app.store.find_society(&society_id).await.unwrap().unwrap();
    assert_eq!(society.state.as_str(), "PASSWORD_SET");
    assert!(society.password.is_some());
}
