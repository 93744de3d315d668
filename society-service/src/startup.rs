//! Application startup and lifecycle management.

use service_core::error::AppError;
use service_core::middleware::rate_limit::create_ip_rate_limiter;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::SocietyConfig;
use crate::services::providers::{EmailProvider, MockEmailProvider, SmtpProvider};
use crate::services::{
    LocalStorage, MongoDb, NotificationGateway, NotificationSettings, OnboardingWorkflow,
    SecretKeyIssuer, SocietyStore, UploadPolicy,
};
use crate::{build_router, AppState};

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application against MongoDB and the configured email provider.
    pub async fn build(config: SocietyConfig) -> Result<Self, AppError> {
        let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;

        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let email_provider: Arc<dyn EmailProvider> = if config.smtp.enabled {
            match SmtpProvider::new(config.smtp.clone()) {
                Ok(provider) => {
                    tracing::info!("SMTP email provider initialized");
                    Arc::new(provider)
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize SMTP provider: {}. Using mock.", e);
                    Arc::new(MockEmailProvider::new())
                }
            }
        } else {
            tracing::info!("SMTP provider disabled, using mock email provider");
            Arc::new(MockEmailProvider::new())
        };

        Self::build_with(config, Arc::new(db), email_provider).await
    }

    /// Build the application from an existing store and email provider.
    pub async fn build_with(
        config: SocietyConfig,
        store: Arc<dyn SocietyStore>,
        email_provider: Arc<dyn EmailProvider>,
    ) -> Result<Self, AppError> {
        let storage = LocalStorage::new(&config.uploads.dir).await.map_err(|e| {
            tracing::error!("Failed to prepare uploads directory {}: {}", config.uploads.dir, e);
            e
        })?;

        let notifier = NotificationGateway::new(
            email_provider,
            NotificationSettings {
                public_base_url: config.onboarding.public_base_url.clone(),
                admin_email: config.onboarding.admin_email.clone(),
                operator_secret: config.onboarding.admin_verification_key.clone(),
                key_ttl_days: config.onboarding.secret_key_ttl_days,
            },
        );

        let workflow = OnboardingWorkflow::new(
            store,
            Arc::new(notifier),
            Arc::new(storage),
            SecretKeyIssuer::new(config.onboarding.secret_key_ttl_days),
            UploadPolicy {
                max_file_bytes: config.uploads.max_file_bytes,
                max_files: config.uploads.max_files,
            },
            config.onboarding.admin_verification_key.clone(),
        );

        let register_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.register_attempts,
            config.rate_limit.register_window_seconds,
        );
        let regenerate_key_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.regenerate_key_attempts,
            config.rate_limit.regenerate_key_window_seconds,
        );
        tracing::info!("Rate limiters initialized: Register, Regenerate Key");

        // Port 0 binds a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Society service listening");

        Ok(Self {
            port,
            listener,
            state: AppState {
                config: Arc::new(config),
                workflow: Arc::new(workflow),
                register_rate_limiter,
                regenerate_key_rate_limiter,
            },
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the HTTP server until `shutdown` resolves.
    pub async fn run_until_stopped(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(
            self.listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }
}
