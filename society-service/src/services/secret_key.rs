use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};

const KEY_LENGTH: usize = 32;

/// Longest lifetime an admin secret key may be issued with.
pub const MAX_TTL_DAYS: i64 = 365;

/// An issued admin secret key with its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretKey {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues time-boxed admin secret keys.
#[derive(Debug, Clone)]
pub struct SecretKeyIssuer {
    ttl: Duration,
}

impl SecretKeyIssuer {
    /// `ttl_days` is clamped to `1..=MAX_TTL_DAYS`.
    pub fn new(ttl_days: i64) -> Self {
        Self {
            ttl: Duration::days(ttl_days.clamp(1, MAX_TTL_DAYS)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self) -> SecretKey {
        let value: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(KEY_LENGTH)
            .map(char::from)
            .collect();

        SecretKey {
            value,
            expires_at: Utc::now() + self.ttl,
        }
    }
}
