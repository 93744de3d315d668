mod common;

use common::{society_body, TestApp, ADMIN_EMAIL, BASE_URL, OPERATOR_KEY};
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use society_service::services::SocietyStore;

fn registration_form(email: &str) -> Form {
    Form::new()
        .text("society_name", "Oak Residency")
        .text("city", "Pune")
        .text("address", "12 MG Road")
        .text("email", email.to_string())
        .text("contact_number", "9999999999")
}

#[tokio::test]
async fn register_returns_201_and_sends_verification_email() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json("/api/society/register", &society_body("a@x.com"))
        .await;

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    let society_id = body["society_id"].as_str().unwrap();
    assert!(!body["admin_secret_key"].as_str().unwrap().is_empty());

    let sent = app.email.sent_to("a@x.com");
    assert_eq!(sent.len(), 1);
    assert!(sent[0]
        .body_text
        .contains(&format!("{}/api/society/verify/{}", BASE_URL, society_id)));
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = TestApp::spawn().await;
    app.register("a@x.com").await;

    let response = app
        .post_json("/api/society/register", &society_body("  A@X.COM "))
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "duplicate_email");
}

#[tokio::test]
async fn register_rejects_missing_and_oversized_fields() {
    let app = TestApp::spawn().await;

    let cases = vec![
        (json!({ "society_name": "Oak" }), "missing fields"),
        (
            json!({
                "society_name": "x".repeat(101),
                "city": "Pune",
                "address": "12 MG Road",
                "email": "a@x.com",
                "contact_number": "9999999999"
            }),
            "name too long",
        ),
        (
            json!({
                "society_name": "Oak",
                "city": "Pune",
                "address": "12 MG Road",
                "email": "not-an-email",
                "contact_number": "9999999999"
            }),
            "invalid email",
        ),
    ];

    for (body, description) in cases {
        let response = app.post_json("/api/society/register", &body).await;
        assert_eq!(response.status(), 400, "{}", description);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "validation_error", "{}", description);
    }
}

#[tokio::test]
async fn register_rejects_malformed_json() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/society/register"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn register_accepts_html_form_post() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/society/register"))
        .form(&[
            ("society_name", "Oak Residency"),
            ("city", "Pune"),
            ("address", "12 MG Road"),
            ("email", "a@x.com"),
            ("contact_number", "9999999999"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    let society_id = body["society_id"].as_str().unwrap();
    let society = app.store.find_society(society_id).await.unwrap().unwrap();
    assert_eq!(society.city, "Pune");
}

#[tokio::test]
async fn register_without_body_reports_missing_fields() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/society/register"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn multipart_register_stores_documents_and_serves_them() {
    let app = TestApp::spawn().await;

    let form = registration_form("a@x.com").part(
        "verification_documents",
        Part::bytes(b"%PDF-1.4 deed".to_vec())
            .file_name("deed.pdf")
            .mime_str("application/pdf")
            .unwrap(),
    );

    let response = app
        .client
        .post(app.url("/api/society/register"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    let society_id = body["society_id"].as_str().unwrap();

    let society = app.store.find_society(society_id).await.unwrap().unwrap();
    assert_eq!(society.verification_files.len(), 1);
    let file = &society.verification_files[0];
    assert!(file.starts_with("Oak_Residency/verification-"));
    assert!(app.uploads.path().join(file).exists());

    let served = app.get(&format!("/uploads/{}", file)).await;
    assert_eq!(served.status(), 200);
    assert_eq!(served.bytes().await.unwrap().as_ref(), b"%PDF-1.4 deed");
}

#[tokio::test]
async fn multipart_register_rejects_unsupported_file_type() {
    let app = TestApp::spawn().await;

    let form = registration_form("a@x.com").part(
        "verification_documents",
        Part::bytes(b"MZ".to_vec()).file_name("setup.exe"),
    );

    let response = app
        .client
        .post(app.url("/api/society/register"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "validation_error");
    assert!(app.email.sent().is_empty());
}

#[tokio::test]
async fn multipart_register_rejects_too_many_files() {
    let app = TestApp::spawn().await;

    let mut form = registration_form("a@x.com");
    for i in 0..6 {
        form = form.part(
            "verification_documents",
            Part::bytes(vec![0u8; 16]).file_name(format!("doc{}.png", i)),
        );
    }

    let response = app
        .client
        .post(app.url("/api/society/register"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn verify_email_renders_page_and_notifies_operator_once() {
    let app = TestApp::spawn().await;
    let (society_id, key) = app.register("a@x.com").await;

    for _ in 0..2 {
        let response = app.get(&format!("/api/society/verify/{}", society_id)).await;
        assert_eq!(response.status(), 200);
        assert!(response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        let page = response.text().await.unwrap();
        assert!(page.contains("Email Verified Successfully"));
    }

    let admin_mail = app.email.sent_to(ADMIN_EMAIL);
    assert_eq!(admin_mail.len(), 1);
    assert!(admin_mail[0].body_text.contains(&key));
    assert!(admin_mail[0].body_text.contains(&format!(
        "/api/society/admin-verify/{}?key={}",
        society_id, OPERATOR_KEY
    )));

    let society = app.store.find_society(&society_id).await.unwrap().unwrap();
    assert!(society.email_verified);
}

#[tokio::test]
async fn verify_email_unknown_society_returns_404_page() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/society/verify/does-not-exist").await;

    assert_eq!(response.status(), 404);
    assert!(response.text().await.unwrap().contains("Society Not Found"));
}

#[tokio::test]
async fn admin_verify_requires_operator_key() {
    let app = TestApp::spawn().await;
    let (society_id, _) = app.register("a@x.com").await;
    app.get(&format!("/api/society/verify/{}", society_id)).await;

    let response = app
        .get(&format!("/api/society/admin-verify/{}?key=wrong", society_id))
        .await;
    assert_eq!(response.status(), 401);

    let response = app
        .get(&format!("/api/society/admin-verify/{}", society_id))
        .await;
    assert_eq!(response.status(), 401);

    let society = app.store.find_society(&society_id).await.unwrap().unwrap();
    assert!(!society.is_verified);
}

#[tokio::test]
async fn admin_verify_before_email_verification_is_rejected() {
    let app = TestApp::spawn().await;
    let (society_id, _) = app.register("a@x.com").await;

    let response = app
        .get(&format!(
            "/api/society/admin-verify/{}?key={}",
            society_id, OPERATOR_KEY
        ))
        .await;

    assert_eq!(response.status(), 409);
    let society = app.store.find_society(&society_id).await.unwrap().unwrap();
    assert!(!society.is_verified);
}

#[tokio::test]
async fn register_is_rate_limited_per_ip() {
    let app = TestApp::spawn_with(|config| {
        config.rate_limit.register_attempts = 2;
        config.rate_limit.register_window_seconds = 3600;
    })
    .await;

    for i in 0..2 {
        let response = app
            .post_json(
                "/api/society/register",
                &society_body(&format!("user{}@x.com", i)),
            )
            .await;
        assert_eq!(response.status(), 201);
    }

    let response = app
        .post_json("/api/society/register", &society_body("user9@x.com"))
        .await;
    assert_eq!(response.status(), 429);
}
