pub mod database;
pub mod memory;
pub mod metrics;
pub mod notifications;
pub mod providers;
pub mod secret_key;
pub mod storage;
pub mod store;
pub mod workflow;

pub use database::MongoDb;
pub use memory::InMemorySocietyStore;
pub use notifications::{EmailTemplate, NotificationGateway, NotificationSettings};
pub use secret_key::{SecretKey, SecretKeyIssuer};
pub use storage::{LocalStorage, Storage, UploadPolicy, UploadedDocument};
pub use store::{SocietyStore, StoreError, UniqueField};
pub use workflow::{AmenityInput, OnboardingWorkflow, Registration, SetupStatus, WorkflowError};
