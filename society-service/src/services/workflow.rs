//! Onboarding workflow: register, verify email, admin approval, password
//! setup and amenity configuration.
//!
//! Every operation loads the society, checks its guards, applies a
//! [`Transition`] and persists the result before any notification is sent.
//! Notifications are best effort and never undo a committed change.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use service_core::error::{AppError, ErrorResponse};
use service_core::utils::secrets_match;
use std::sync::Arc;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use super::metrics::record_transition;
use super::notifications::{EmailTemplate, NotificationGateway};
use super::secret_key::SecretKeyIssuer;
use super::storage::{document_extension, document_key, Storage, UploadPolicy, UploadedDocument};
use super::store::{SocietyStore, StoreError, UniqueField};
use crate::models::{
    normalize_email, Amenity, InvalidTransition, OnboardingState, Society, SocietyDetails,
    Transition,
};
use crate::utils::{check_password_policy, hash_password, Password};

/// Attempts at persisting a society before giving up on secret key collisions.
const MAX_KEY_ATTEMPTS: usize = 5;

const MAX_AMENITY_NAME: usize = 100;
const MAX_AMENITY_TYPE: usize = 50;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(String),

    #[error("A society with this email is already registered")]
    DuplicateEmail,

    #[error("Society not found")]
    NotFound,

    #[error("Invalid or unauthorized key")]
    Unauthorized,

    #[error("Admin secret key has expired")]
    Expired,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("{0}")]
    WeakPassword(String),

    #[error("{0}")]
    InvalidState(#[from] InvalidTransition),

    #[error(transparent)]
    Internal(#[from] AppError),
}

impl WorkflowError {
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::Validation(_) => "validation_error",
            WorkflowError::DuplicateEmail => "duplicate_email",
            WorkflowError::NotFound => "not_found",
            WorkflowError::Unauthorized => "unauthorized",
            WorkflowError::Expired => "expired",
            WorkflowError::PasswordMismatch => "password_mismatch",
            WorkflowError::WeakPassword(_) => "weak_password",
            WorkflowError::InvalidState(_) => "invalid_state",
            WorkflowError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            WorkflowError::Validation(_)
            | WorkflowError::DuplicateEmail
            | WorkflowError::PasswordMismatch
            | WorkflowError::WeakPassword(_) => StatusCode::BAD_REQUEST,
            WorkflowError::NotFound => StatusCode::NOT_FOUND,
            WorkflowError::Unauthorized | WorkflowError::Expired => StatusCode::UNAUTHORIZED,
            WorkflowError::InvalidState(_) => StatusCode::CONFLICT,
            WorkflowError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal causes stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            WorkflowError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(UniqueField::Email) => WorkflowError::DuplicateEmail,
            StoreError::Duplicate(field) => WorkflowError::Internal(AppError::DatabaseError(
                anyhow::anyhow!("Unexpected duplicate value for {}", field),
            )),
            StoreError::Backend(e) => WorkflowError::Internal(e),
        }
    }
}

impl From<ValidationErrors> for WorkflowError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort_unstable();
        WorkflowError::Validation(format!("Invalid or missing fields: {}", fields.join(", ")))
    }
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        if let WorkflowError::Internal(err) = &self {
            tracing::error!(error = %err, "Onboarding operation failed");
        }
        let body = ErrorResponse::new(self.code(), self.public_message());
        (self.status(), Json(body)).into_response()
    }
}

/// Outcome of a successful registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub society_id: String,
    pub admin_secret_key: String,
}

/// Setup progress of a society, as shown to its administrator.
#[derive(Debug, Clone, Serialize)]
pub struct SetupStatus {
    pub society_id: String,
    pub society_name: String,
    pub state: OnboardingState,
    pub is_verified: bool,
    pub needs_password_setup: bool,
    pub next_step: Option<Transition>,
}

/// An amenity requested during configuration.
#[derive(Debug, Clone)]
pub struct AmenityInput {
    pub name: String,
    pub amenity_type: Option<String>,
}

pub struct OnboardingWorkflow {
    store: Arc<dyn SocietyStore>,
    notifier: Arc<NotificationGateway>,
    storage: Arc<dyn Storage>,
    keys: SecretKeyIssuer,
    upload_policy: UploadPolicy,
    operator_secret: String,
}

impl OnboardingWorkflow {
    pub fn new(
        store: Arc<dyn SocietyStore>,
        notifier: Arc<NotificationGateway>,
        storage: Arc<dyn Storage>,
        keys: SecretKeyIssuer,
        upload_policy: UploadPolicy,
        operator_secret: String,
    ) -> Self {
        Self {
            store,
            notifier,
            storage,
            keys,
            upload_policy,
            operator_secret,
        }
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        self.upload_policy
    }

    pub async fn health_check(&self) -> Result<(), WorkflowError> {
        Ok(self.store.health_check().await?)
    }

    /// Create a society in `REGISTERED` with a fresh admin secret key.
    pub async fn register(
        &self,
        details: SocietyDetails,
        documents: Vec<UploadedDocument>,
    ) -> Result<Registration, WorkflowError> {
        let details = details.normalized();
        details.validate()?;
        self.upload_policy
            .validate(&documents)
            .map_err(WorkflowError::Validation)?;

        if self.store.find_society_by_email(&details.email).await?.is_some() {
            return Err(WorkflowError::DuplicateEmail);
        }

        let files = self.store_documents(&details.society_name, documents).await?;
        let mut society = Society::new(details, self.keys.issue(), files);

        if let Err(e) = self.insert_with_fresh_key(&mut society).await {
            self.discard_documents(&society.verification_files).await;
            return Err(e);
        }

        tracing::info!(
            society_id = %society.society_id,
            documents = society.verification_files.len(),
            "Society registered"
        );

        self.notifier
            .send(EmailTemplate::EmailVerification, &society)
            .await;

        Ok(Registration {
            society_id: society.society_id,
            admin_secret_key: society.admin_secret_key,
        })
    }

    /// Mark the society's email as verified. Repeat calls succeed without
    /// notifying the operator again.
    pub async fn verify_email(&self, society_id: &str) -> Result<Society, WorkflowError> {
        let mut society = self.load(society_id).await?;

        if society.advance(Transition::VerifyEmail)? {
            self.store.save_society(&society).await?;
            record_transition(Transition::VerifyEmail);
            tracing::info!(society_id = %society.society_id, "Society email verified");

            self.notifier.send(EmailTemplate::AdminReview, &society).await;
        }

        Ok(society)
    }

    /// Operator approval. The operator key is checked before the lookup.
    pub async fn admin_verify(
        &self,
        society_id: &str,
        operator_key: Option<&str>,
    ) -> Result<Society, WorkflowError> {
        match operator_key {
            Some(key) if secrets_match(key, &self.operator_secret) => {}
            _ => {
                tracing::warn!(society_id = %society_id, "Admin verification with invalid key");
                return Err(WorkflowError::Unauthorized);
            }
        }

        let mut society = self.load(society_id).await?;

        if society.advance(Transition::AdminApprove)? {
            self.store.save_society(&society).await?;
            record_transition(Transition::AdminApprove);
            tracing::info!(society_id = %society.society_id, "Society approved by operator");

            self.notifier.send(EmailTemplate::SocietySetup, &society).await;
        }

        Ok(society)
    }

    /// Issue a new admin secret key. The caller proves ownership with the
    /// society id, its email and the previous key, which may have expired.
    pub async fn regenerate_key(
        &self,
        society_id: &str,
        email: &str,
        previous_key: &str,
    ) -> Result<Society, WorkflowError> {
        let society_id = society_id.trim();
        let email = normalize_email(email);
        let previous_key = previous_key.trim();

        if society_id.is_empty() || email.is_empty() || previous_key.is_empty() {
            return Err(WorkflowError::Validation(
                "society_id, email and previous_key are required".to_string(),
            ));
        }

        let mut society = self
            .store
            .find_society_by_secret_key(previous_key)
            .await?
            .filter(|s| s.society_id == society_id && s.email == email)
            .ok_or(WorkflowError::NotFound)?;

        let mut attempts = 0;
        loop {
            attempts += 1;
            society.rotate_key(self.keys.issue());
            match self.store.save_society(&society).await {
                Ok(()) => break,
                Err(StoreError::Duplicate(UniqueField::SecretKey)) if attempts < MAX_KEY_ATTEMPTS => {
                    tracing::warn!(society_id = %society.society_id, "Secret key collision, reissuing");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!(society_id = %society.society_id, "Admin secret key regenerated");

        self.notifier
            .send(EmailTemplate::SecretKeyRegenerated, &society)
            .await;

        Ok(society)
    }

    /// Guard shared by the setup operations.
    ///
    /// Checks run in a fixed order: key present, society exists, key not
    /// expired, key matches.
    pub async fn validate_secret_key(
        &self,
        society_id: &str,
        key: Option<&str>,
    ) -> Result<Society, WorkflowError> {
        let key = key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| WorkflowError::Validation("Admin secret key is required".to_string()))?;

        let society = self.load(society_id).await?;

        if society.key_expired_at(Utc::now()) {
            return Err(WorkflowError::Expired);
        }

        if !secrets_match(key, &society.admin_secret_key) {
            return Err(WorkflowError::Unauthorized);
        }

        Ok(society)
    }

    pub async fn setup_status(
        &self,
        society_id: &str,
        key: Option<&str>,
    ) -> Result<SetupStatus, WorkflowError> {
        let society = self.validate_secret_key(society_id, key).await?;

        Ok(SetupStatus {
            needs_password_setup: society.needs_password_setup(),
            next_step: society.state.next_step(),
            state: society.state,
            is_verified: society.is_verified,
            society_name: society.society_name,
            society_id: society.society_id,
        })
    }

    /// Set or change the society's admin password.
    pub async fn set_password(
        &self,
        society_id: &str,
        key: Option<&str>,
        password: Password,
        confirm_password: Password,
    ) -> Result<Society, WorkflowError> {
        let mut society = self.validate_secret_key(society_id, key).await?;

        if password.is_empty() {
            return Err(WorkflowError::Validation("Password is required".to_string()));
        }
        if password.as_str() != confirm_password.as_str() {
            return Err(WorkflowError::PasswordMismatch);
        }
        check_password_policy(&password).map_err(WorkflowError::WeakPassword)?;

        let changed = society.advance(Transition::SetPassword)?;

        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Password hashing task failed: {}", e)))?
            .map_err(AppError::InternalError)?;

        society.password = Some(hash.into_string());
        society.updated_at = Utc::now();
        self.store.save_society(&society).await?;

        if changed {
            record_transition(Transition::SetPassword);
        }
        tracing::info!(society_id = %society.society_id, "Society password set");

        Ok(society)
    }

    /// Append amenities to the society. An empty list changes nothing.
    pub async fn configure(
        &self,
        society_id: &str,
        key: Option<&str>,
        amenities: Vec<AmenityInput>,
    ) -> Result<Vec<Amenity>, WorkflowError> {
        let mut society = self.validate_secret_key(society_id, key).await?;

        if amenities.is_empty() {
            return Ok(Vec::new());
        }

        let amenities = amenities
            .into_iter()
            .map(normalize_amenity)
            .collect::<Result<Vec<_>, _>>()?;

        // Commit the state before the rows: a failed save must leave no amenities.
        if society.advance(Transition::Configure)? {
            self.store.save_society(&society).await?;
            record_transition(Transition::Configure);
        }

        let records: Vec<Amenity> = amenities
            .into_iter()
            .map(|a| Amenity::new(society.society_id.clone(), a.name, a.amenity_type))
            .collect();

        self.store.insert_amenities(&records).await.map_err(|e| {
            tracing::error!(
                society_id = %society.society_id,
                state = society.state.as_str(),
                error = %e,
                "Failed to store amenities after state change"
            );
            e
        })?;

        tracing::info!(
            society_id = %society.society_id,
            amenities = records.len(),
            "Society amenities configured"
        );

        Ok(records)
    }

    pub async fn amenities(&self, society_id: &str) -> Result<Vec<Amenity>, WorkflowError> {
        Ok(self.store.amenities_for(society_id).await?)
    }

    async fn load(&self, society_id: &str) -> Result<Society, WorkflowError> {
        self.store
            .find_society(society_id)
            .await?
            .ok_or(WorkflowError::NotFound)
    }

    async fn insert_with_fresh_key(&self, society: &mut Society) -> Result<(), WorkflowError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.store.insert_society(society).await {
                Ok(()) => return Ok(()),
                Err(StoreError::Duplicate(UniqueField::SecretKey)) if attempts < MAX_KEY_ATTEMPTS => {
                    tracing::warn!(society_id = %society.society_id, "Secret key collision, reissuing");
                    society.rotate_key(self.keys.issue());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn store_documents(
        &self,
        society_name: &str,
        documents: Vec<UploadedDocument>,
    ) -> Result<Vec<String>, WorkflowError> {
        let mut stored = Vec::with_capacity(documents.len());

        for doc in documents {
            let Some(extension) = document_extension(&doc.file_name) else {
                self.discard_documents(&stored).await;
                return Err(WorkflowError::Validation(format!(
                    "Unsupported file type for {}",
                    doc.file_name
                )));
            };

            let key = document_key(society_name, &extension);
            if let Err(e) = self.storage.upload(&key, doc.data).await {
                self.discard_documents(&stored).await;
                return Err(e.into());
            }
            stored.push(key);
        }

        Ok(stored)
    }

    async fn discard_documents(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.storage.delete(key).await {
                tracing::warn!(key = %key, error = %e, "Failed to remove verification document");
            }
        }
    }
}

fn normalize_amenity(input: AmenityInput) -> Result<AmenityInput, WorkflowError> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(WorkflowError::Validation("Amenity name is required".to_string()));
    }
    if name.chars().count() > MAX_AMENITY_NAME {
        return Err(WorkflowError::Validation(format!(
            "Amenity name must be at most {} characters",
            MAX_AMENITY_NAME
        )));
    }

    let amenity_type = input
        .amenity_type
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    if let Some(t) = &amenity_type {
        if t.chars().count() > MAX_AMENITY_TYPE {
            return Err(WorkflowError::Validation(format!(
                "Amenity type must be at most {} characters",
                MAX_AMENITY_TYPE
            )));
        }
    }

    Ok(AmenityInput { name, amenity_type })
}
