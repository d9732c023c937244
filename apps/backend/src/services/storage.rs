//! Local-disk storage service for uploaded dictionary files.

use std::path::PathBuf;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Archives uploaded dictionary source files under a base directory.
pub struct StorageService {
    base_dir: PathBuf,
}

impl StorageService {
    /// Create a storage service rooted at the given directory.
    ///
    /// The directory is created lazily on first upload.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Store an uploaded file.
    ///
    /// # Arguments
    /// * `user_id` - Owner of the upload; files are grouped per user
    /// * `filename` - Declared filename, sanitized before use
    /// * `content` - File content as bytes
    ///
    /// # Returns
    /// The key (relative path) the file was stored under
    pub async fn upload_file(
        &self,
        user_id: i64,
        filename: &str,
        content: &[u8],
    ) -> Result<String, StorageError> {
        let key = Self::make_key(user_id, filename);
        let path = self.base_dir.join(&key);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, content).await?;

        tracing::info!("Archived upload: {}", key);
        Ok(key)
    }

    /// Delete a stored file.
    ///
    /// # Arguments
    /// * `key` - The key returned by `upload_file`
    pub async fn delete_file(&self, key: &str) -> Result<(), StorageError> {
        fs::remove_file(self.base_dir.join(key)).await?;

        tracing::info!("Deleted archived upload: {}", key);
        Ok(())
    }

    /// Generate the storage key for a user's upload.
    ///
    /// Format: `user_{id}/{uuid}-{sanitized filename}`; the uuid keeps
    /// repeated uploads of the same filename from overwriting each other.
    pub fn make_key(user_id: i64, filename: &str) -> String {
        format!("user_{}/{}-{}", user_id, Uuid::new_v4(), sanitize(filename))
    }
}

/// Hash file content for change detection
pub fn hash_content(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Keep only the final path component, with unsafe characters replaced.
fn sanitize(filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect()
}
