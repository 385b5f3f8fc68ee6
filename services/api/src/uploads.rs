//! Storage for uploaded pudding photos
//!
//! Photos land in a flat directory served statically under `/uploads`.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Largest accepted photo: 5 MiB
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Filesystem store for uploaded photos
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create an UploadStore from the `UPLOAD_DIR` environment variable
    /// (default: `uploads`)
    pub fn from_env() -> Self {
        let dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());
        Self::new(dir)
    }

    /// Directory served under `/uploads`
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist an uploaded photo and return its public `/uploads/...` path
    pub async fn store_photo(&self, content_type: &str, bytes: &[u8]) -> ApiResult<String> {
        let ext = match content_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            _ => {
                return Err(ApiError::Validation(
                    "Photo must be a JPEG, PNG, or WebP image".to_string(),
                ));
            }
        };

        if bytes.is_empty() {
            return Err(ApiError::Validation("Photo must not be empty".to_string()));
        }

        if bytes.len() > MAX_PHOTO_BYTES {
            return Err(ApiError::Validation(
                "Photo must be at most 5 MiB".to_string(),
            ));
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ApiError::Internal(e.into()))?;

        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let path = self.dir.join(&filename);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ApiError::Internal(e.into()))?;

        Ok(format!("/uploads/{filename}"))
    }

    /// Delete a stored photo by its public `/uploads/...` path, best effort
    ///
    /// Used to clean up when the request that uploaded the photo fails
    /// after the write.
    pub async fn remove(&self, public_path: &str) {
        let Some(filename) = public_path.strip_prefix("/uploads/") else {
            return;
        };
        if filename.contains('/') {
            return;
        }

        let _ = tokio::fs::remove_file(self.dir.join(filename)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> UploadStore {
        UploadStore::new(std::env::temp_dir().join(format!("pmg-uploads-{}", Uuid::new_v4())))
    }

    #[tokio::test]
    async fn stores_jpeg_and_returns_public_path() {
        let store = temp_store();
        let path = store.store_photo("image/jpeg", b"\xff\xd8fake").await.unwrap();

        assert!(path.starts_with("/uploads/"));
        assert!(path.ends_with(".jpg"));

        let on_disk = store.dir().join(path.trim_start_matches("/uploads/"));
        assert_eq!(tokio::fs::read(on_disk).await.unwrap(), b"\xff\xd8fake");
    }

    #[tokio::test]
    async fn remove_deletes_the_stored_file() {
        let store = temp_store();
        let path = store.store_photo("image/png", b"\x89PNGfake").await.unwrap();

        let on_disk = store.dir().join(path.trim_start_matches("/uploads/"));
        assert!(tokio::fs::metadata(&on_disk).await.is_ok());

        store.remove(&path).await;
        assert!(tokio::fs::metadata(&on_disk).await.is_err());
    }

    #[tokio::test]
    async fn remove_ignores_foreign_paths() {
        let store = temp_store();
        // neither panics nor touches anything outside the store
        store.remove("/etc/passwd").await;
        store.remove("/uploads/../escape.jpg").await;
    }

    #[tokio::test]
    async fn rejects_unknown_content_type() {
        let store = temp_store();
        let err = store.store_photo("application/pdf", b"data").await;
        assert!(matches!(err, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn rejects_oversized_photo() {
        let store = temp_store();
        let big = vec![0u8; MAX_PHOTO_BYTES + 1];
        let err = store.store_photo("image/png", &big).await;
        assert!(matches!(err, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn rejects_empty_photo() {
        let store = temp_store();
        let err = store.store_photo("image/png", b"").await;
        assert!(matches!(err, Err(ApiError::Validation(_))));
    }
}
