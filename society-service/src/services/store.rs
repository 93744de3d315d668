use async_trait::async_trait;
use service_core::error::AppError;
use std::fmt;
use thiserror::Error;

use crate::models::{Amenity, Society};

/// Uniquely indexed society fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    SocietyId,
    Email,
    SecretKey,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueField::SocietyId => f.write_str("society_id"),
            UniqueField::Email => f.write_str("email"),
            UniqueField::SecretKey => f.write_str("admin_secret_key"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate value for unique field {0}")]
    Duplicate(UniqueField),

    #[error(transparent)]
    Backend(#[from] AppError),
}

/// Persistence for societies and their amenities.
#[async_trait]
pub trait SocietyStore: Send + Sync {
    async fn insert_society(&self, society: &Society) -> Result<(), StoreError>;

    async fn find_society(&self, society_id: &str) -> Result<Option<Society>, StoreError>;

    async fn find_society_by_email(&self, email: &str) -> Result<Option<Society>, StoreError>;

    async fn find_society_by_secret_key(&self, key: &str)
        -> Result<Option<Society>, StoreError>;

    /// Replace the stored record, inserting it when absent.
    async fn save_society(&self, society: &Society) -> Result<(), StoreError>;

    async fn insert_amenities(&self, amenities: &[Amenity]) -> Result<(), StoreError>;

    async fn amenities_for(&self, society_id: &str) -> Result<Vec<Amenity>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
