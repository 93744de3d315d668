use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions, ReplaceOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use super::store::{SocietyStore, StoreError, UniqueField};
use crate::models::{Amenity, Society};

const DUPLICATE_KEY_CODE: i32 = 11000;
const EMAIL_INDEX: &str = "email_unique";
const SECRET_KEY_INDEX: &str = "admin_secret_key_unique";

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for society-service");

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .name(EMAIL_INDEX.to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.societies()
            .create_index(email_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create email index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let key_index = IndexModel::builder()
            .keys(doc! { "admin_secret_key": 1 })
            .options(
                IndexOptions::builder()
                    .name(SECRET_KEY_INDEX.to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.societies()
            .create_index(key_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create admin_secret_key index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let amenity_society_index = IndexModel::builder()
            .keys(doc! { "society_id": 1, "created_at": 1 })
            .options(
                IndexOptions::builder()
                    .name("society_id_created_at_idx".to_string())
                    .build(),
            )
            .build();

        self.amenities()
            .create_index(amenity_society_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create amenities society_id index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    pub fn societies(&self) -> Collection<Society> {
        self.db.collection("societies")
    }

    pub fn amenities(&self) -> Collection<Amenity> {
        self.db.collection("amenities")
    }
}

/// Map a driver error, recognising unique index violations.
fn store_error(context: &str, e: mongodb::error::Error) -> StoreError {
    if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = e.kind.as_ref() {
        if write_error.code == DUPLICATE_KEY_CODE {
            let field = if write_error.message.contains(EMAIL_INDEX) {
                UniqueField::Email
            } else if write_error.message.contains(SECRET_KEY_INDEX) {
                UniqueField::SecretKey
            } else {
                UniqueField::SocietyId
            };
            return StoreError::Duplicate(field);
        }
    }

    tracing::error!("{}: {}", context, e);
    StoreError::Backend(AppError::DatabaseError(anyhow::anyhow!(e.to_string())))
}

#[async_trait]
impl SocietyStore for MongoDb {
    async fn insert_society(&self, society: &Society) -> Result<(), StoreError> {
        self.societies()
            .insert_one(society, None)
            .await
            .map_err(|e| store_error("Failed to insert society", e))?;
        Ok(())
    }

    async fn find_society(&self, society_id: &str) -> Result<Option<Society>, StoreError> {
        self.societies()
            .find_one(doc! { "_id": society_id }, None)
            .await
            .map_err(|e| store_error("Failed to find society", e))
    }

    async fn find_society_by_email(&self, email: &str) -> Result<Option<Society>, StoreError> {
        self.societies()
            .find_one(doc! { "email": email }, None)
            .await
            .map_err(|e| store_error("Failed to find society by email", e))
    }

    async fn find_society_by_secret_key(
        &self,
        key: &str,
    ) -> Result<Option<Society>, StoreError> {
        self.societies()
            .find_one(doc! { "admin_secret_key": key }, None)
            .await
            .map_err(|e| store_error("Failed to find society by secret key", e))
    }

    async fn save_society(&self, society: &Society) -> Result<(), StoreError> {
        let options = ReplaceOptions::builder().upsert(true).build();
        self.societies()
            .replace_one(doc! { "_id": society.society_id.as_str() }, society, options)
            .await
            .map_err(|e| store_error("Failed to save society", e))?;
        Ok(())
    }

    async fn insert_amenities(&self, amenities: &[Amenity]) -> Result<(), StoreError> {
        if amenities.is_empty() {
            return Ok(());
        }
        self.amenities()
            .insert_many(amenities, None)
            .await
            .map_err(|e| store_error("Failed to insert amenities", e))?;
        Ok(())
    }

    async fn amenities_for(&self, society_id: &str) -> Result<Vec<Amenity>, StoreError> {
        let options = FindOptions::builder().sort(doc! { "created_at": 1 }).build();
        let cursor = self
            .amenities()
            .find(doc! { "society_id": society_id }, options)
            .await
            .map_err(|e| store_error("Failed to list amenities", e))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| store_error("Failed to collect amenities", e))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }
}
