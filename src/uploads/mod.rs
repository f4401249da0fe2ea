//! Image storage for menu photos, logos and avatars.

pub mod multipart;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/jpg", "image/webp"];

#[derive(Debug, Clone, Serialize)]
pub struct StoredImage {
    pub url: String,
    pub public_id: String,
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn store(&self, content_type: &str, bytes: &[u8]) -> Result<StoredImage, String>;
}

/// File extension for an accepted image content type.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Writes images under a local directory that the router serves at `/uploads/files`.
pub struct LocalImageStore {
    dir: PathBuf,
    public_url: String,
}

impl LocalImageStore {
    pub fn new(dir: PathBuf, public_url: &str) -> Self {
        Self {
            dir,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(&self, content_type: &str, bytes: &[u8]) -> Result<StoredImage, String> {
        let ext = extension_for(content_type)
            .ok_or_else(|| format!("Unsupported content type: {content_type}"))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| format!("Failed to create upload directory: {e}"))?;

        let public_id = Uuid::now_v7().simple().to_string();
        let file_name = format!("{public_id}.{ext}");
        tokio::fs::write(self.dir.join(&file_name), bytes)
            .await
            .map_err(|e| format!("Failed to write image: {e}"))?;

        Ok(StoredImage {
            url: format!("{}/uploads/files/{file_name}", self.public_url),
            public_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_images_have_extensions() {
        assert_eq!(extension_for("image/jpg"), Some("jpg"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("image/gif"), None);
        assert_eq!(extension_for("application/pdf"), None);
        for ct in ALLOWED_CONTENT_TYPES {
            assert!(extension_for(ct).is_some(), "{ct}");
        }
    }

    #[tokio::test]
    async fn local_store_writes_file_and_builds_url() {
        let dir = std::env::temp_dir().join(format!("ewaiter-uploads-{}", Uuid::now_v7()));
        let store = LocalImageStore::new(dir.clone(), "http://localhost:3000/");

        let stored = store.store("image/png", b"\x89PNG fake").await.unwrap();
        assert_eq!(
            stored.url,
            format!("http://localhost:3000/uploads/files/{}.png", stored.public_id)
        );
        let written = tokio::fs::read(dir.join(format!("{}.png", stored.public_id)))
            .await
            .unwrap();
        assert_eq!(written, b"\x89PNG fake");

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
