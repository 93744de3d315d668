use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use service_core::error::AppError;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// File extensions accepted as verification documents.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "pdf", "doc", "docx"];

#[async_trait]
pub trait Storage: Send + Sync {
    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<(), AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Invalid storage key: {}",
                key
            )));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<(), AppError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, data).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let path = self.resolve(key)?;
        if path.exists() {
            fs::remove_file(path).await?;
        }
        Ok(())
    }
}

/// A verification document received with a registration.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Limits applied to verification documents.
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub max_file_bytes: usize,
    pub max_files: usize,
}

impl UploadPolicy {
    /// Check count, extension and size of every document.
    pub fn validate(&self, documents: &[UploadedDocument]) -> Result<(), String> {
        if documents.len() > self.max_files {
            return Err(format!(
                "At most {} verification documents may be uploaded",
                self.max_files
            ));
        }

        for doc in documents {
            if document_extension(&doc.file_name).is_none() {
                return Err(format!(
                    "Unsupported file type for {}: allowed types are {}",
                    doc.file_name,
                    ALLOWED_EXTENSIONS.join(", ")
                ));
            }
            if doc.data.len() > self.max_file_bytes {
                return Err(format!(
                    "{} exceeds the maximum file size of {} bytes",
                    doc.file_name, self.max_file_bytes
                ));
            }
        }

        Ok(())
    }
}

/// Lower-cased extension of `file_name` when it is an allowed document type.
pub fn document_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

/// Directory name for a society's documents: spaces become underscores and
/// anything outside `[A-Za-z0-9_-]` is dropped.
pub fn society_directory(society_name: &str) -> String {
    let dir: String = society_name
        .trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('_'),
            c if c.is_ascii_alphanumeric() || c == '_' || c == '-' => Some(c),
            _ => None,
        })
        .collect();

    if dir.is_empty() {
        "society".to_string()
    } else {
        dir
    }
}

/// Storage key `<society dir>/verification-<millis>-<12 hex>.<ext>`.
pub fn document_key(society_name: &str, extension: &str) -> String {
    let suffix: [u8; 6] = rand::thread_rng().gen();
    let hex: String = suffix.iter().map(|b| format!("{:02x}", b)).collect();
    format!(
        "{}/verification-{}-{}.{}",
        society_directory(society_name),
        Utc::now().timestamp_millis(),
        hex,
        extension
    )
}
