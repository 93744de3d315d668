use serde::Deserialize;
use service_core::config::{self as core_config, get_env, get_env_parsed, Environment};
use service_core::error::AppError;

use crate::services::secret_key::MAX_TTL_DAYS;

#[derive(Debug, Clone, Deserialize)]
pub struct SocietyConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub smtp: SmtpConfig,
    pub onboarding: OnboardingConfig,
    pub uploads: UploadConfig,
    pub rate_limit: RateLimitConfig,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OnboardingConfig {
    /// Operator secret authorizing the admin-verify step.
    pub admin_verification_key: String,
    /// Recipient of admin-review emails.
    pub admin_email: String,
    /// Base URL used in links sent by email.
    pub public_base_url: String,
    pub secret_key_ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub dir: String,
    pub max_file_bytes: usize,
    pub max_files: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub register_attempts: u32,
    pub register_window_seconds: u64,
    pub regenerate_key_attempts: u32,
    pub regenerate_key_window_seconds: u64,
}

impl SocietyConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = Environment::current().is_prod();
        let default_base_url = format!("http://localhost:{}", common_config.port);

        Ok(SocietyConfig {
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", None, is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("neighbournet"), is_prod)?,
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("smtp.gmail.com"), is_prod)?,
                port: get_env("SMTP_PORT", Some("587"), is_prod)?
                    .parse()
                    .unwrap_or(587),
                user: get_env("SMTP_USER", Some(""), is_prod)?,
                password: get_env("SMTP_PASSWORD", Some(""), is_prod)?,
                from_email: get_env("SMTP_FROM_EMAIL", Some("noreply@neighbournet.local"), is_prod)?,
                from_name: get_env("SMTP_FROM_NAME", Some("NeighbourNet"), is_prod)?,
                enabled: get_env_parsed("SMTP_ENABLED", false),
            },
            onboarding: OnboardingConfig {
                admin_verification_key: get_env("ADMIN_VERIFICATION_KEY", Some("admin123"), is_prod)?,
                admin_email: get_env("ADMIN_EMAIL", Some("admin@neighbournet.local"), is_prod)?,
                public_base_url: get_env("PUBLIC_BASE_URL", Some(&default_base_url), is_prod)?
                    .trim_end_matches('/')
                    .to_string(),
                secret_key_ttl_days: secret_key_ttl_days(get_env_parsed("SECRET_KEY_TTL_DAYS", 7))?,
            },
            uploads: UploadConfig {
                dir: get_env("UPLOADS_DIR", Some("uploads"), is_prod)?,
                max_file_bytes: get_env_parsed("UPLOAD_MAX_FILE_BYTES", 5 * 1024 * 1024),
                max_files: get_env_parsed("UPLOAD_MAX_FILES", 5),
            },
            rate_limit: RateLimitConfig {
                register_attempts: get_env_parsed("REGISTER_RATE_LIMIT", 10),
                register_window_seconds: get_env_parsed("REGISTER_RATE_WINDOW_SECONDS", 3600),
                regenerate_key_attempts: get_env_parsed("REGENERATE_KEY_RATE_LIMIT", 5),
                regenerate_key_window_seconds: get_env_parsed(
                    "REGENERATE_KEY_RATE_WINDOW_SECONDS",
                    3600,
                ),
            },
            log_level: get_env_parsed("LOG_LEVEL", "info".to_string()),
            otlp_endpoint: std::env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
            common: common_config,
        })
    }
}

/// Admin secret key lifetime must be between one day and [`MAX_TTL_DAYS`].
fn secret_key_ttl_days(days: i64) -> Result<i64, AppError> {
    if (1..=MAX_TTL_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(AppError::ConfigError(anyhow::anyhow!(
            "SECRET_KEY_TTL_DAYS must be between 1 and {}, got {}",
            MAX_TTL_DAYS,
            days
        )))
    }
}
