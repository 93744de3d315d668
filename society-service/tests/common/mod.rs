#![allow(dead_code)]

use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use society_service::config::{
    MongoConfig, OnboardingConfig, RateLimitConfig, SmtpConfig, SocietyConfig, UploadConfig,
};
use society_service::services::providers::MockEmailProvider;
use society_service::services::InMemorySocietyStore;
use society_service::startup::Application;
use std::sync::Arc;
use tempfile::TempDir;

pub const OPERATOR_KEY: &str = "test-operator-key";
pub const ADMIN_EMAIL: &str = "ops@neighbournet.test";
pub const BASE_URL: &str = "http://neighbournet.test";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub store: Arc<InMemorySocietyStore>,
    pub email: Arc<MockEmailProvider>,
    pub uploads: TempDir,
}

pub fn test_config(uploads_dir: &str) -> SocietyConfig {
    SocietyConfig {
        common: CoreConfig { port: 0 },
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "society_test".to_string(),
        },
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            port: 587,
            user: String::new(),
            password: String::new(),
            from_email: "noreply@neighbournet.test".to_string(),
            from_name: "NeighbourNet".to_string(),
            enabled: false,
        },
        onboarding: OnboardingConfig {
            admin_verification_key: OPERATOR_KEY.to_string(),
            admin_email: ADMIN_EMAIL.to_string(),
            public_base_url: BASE_URL.to_string(),
            secret_key_ttl_days: 7,
        },
        uploads: UploadConfig {
            dir: uploads_dir.to_string(),
            max_file_bytes: 64 * 1024,
            max_files: 5,
        },
        rate_limit: RateLimitConfig {
            register_attempts: 1000,
            register_window_seconds: 60,
            regenerate_key_attempts: 1000,
            regenerate_key_window_seconds: 60,
        },
        log_level: "info".to_string(),
        otlp_endpoint: None,
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(customize: impl FnOnce(&mut SocietyConfig)) -> Self {
        let uploads = tempfile::tempdir().expect("Failed to create uploads dir");
        let mut config = test_config(&uploads.path().to_string_lossy());
        customize(&mut config);

        let store = Arc::new(InMemorySocietyStore::new());
        let email = Arc::new(MockEmailProvider::new());

        let app = Application::build_with(config, store.clone(), email.clone())
            .await
            .expect("Failed to build test application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped(std::future::pending()).await.ok();
        });

        TestApp {
            address,
            client: reqwest::Client::new(),
            store,
            email,
            uploads,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Register a society over JSON, returning `(society_id, admin_secret_key)`.
    pub async fn register(&self, email: &str) -> (String, String) {
        let response = self
            .post_json("/api/society/register", &society_body(email))
            .await;
        assert_eq!(response.status(), 201);

        let body: Value = response.json().await.expect("Failed to parse response");
        (
            body["society_id"].as_str().unwrap().to_string(),
            body["admin_secret_key"].as_str().unwrap().to_string(),
        )
    }

    /// Register, verify email and approve a society.
    pub async fn approved_society(&self, email: &str) -> (String, String) {
        let (society_id, key) = self.register(email).await;

        let response = self.get(&format!("/api/society/verify/{}", society_id)).await;
        assert_eq!(response.status(), 200);

        let response = self
            .get(&format!(
                "/api/society/admin-verify/{}?key={}",
                society_id, OPERATOR_KEY
            ))
            .await;
        assert_eq!(response.status(), 200);

        (society_id, key)
    }

    pub async fn set_password(&self, society_id: &str, key: &str, password: &str) -> reqwest::Response {
        self.post_json(
            &format!("/society/setup/{}/set-password?key={}", society_id, key),
            &json!({ "password": password, "confirm_password": password }),
        )
        .await
    }
}

pub fn society_body(email: &str) -> Value {
    json!({
        "society_name": "Oak Residency",
        "city": "Pune",
        "address": "12 MG Road",
        "email": email,
        "contact_number": "9999999999"
    })
}
