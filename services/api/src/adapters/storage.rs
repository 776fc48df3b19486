//! services/api/src/adapters/storage.rs
//!
//! A filesystem-backed bucket implementing the `ObjectStorage` port. Keys are
//! relative paths such as `weddings/1718000000000-a1b2c3d.jpg`; the blobs are
//! served back under the public base URL.

use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use studio_core::ports::{ObjectStorage, PortError, PortResult};
use tokio::fs;
use tracing::{debug, info, warn};

/// Resolves `key` under `base`, refusing anything that could escape it.
fn ensure_within(base: &Path, key: &str) -> PortResult<PathBuf> {
    if key.is_empty() || key.contains('\\') {
        return Err(PortError::Unexpected(format!("Invalid storage key '{key}'")));
    }
    let mut resolved = base.to_path_buf();
    for component in Path::new(key).components() {
        match component {
            Component::Normal(c) => resolved.push(c),
            Component::CurDir => {}
            _ => {
                return Err(PortError::Unexpected(format!(
                    "Path traversal detected in '{key}'"
                )))
            }
        }
    }
    if resolved == base || !resolved.starts_with(base) {
        return Err(PortError::Unexpected(format!("Invalid storage key '{key}'")));
    }
    Ok(resolved)
}

#[derive(Debug, Clone)]
pub struct FsObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl FsObjectStorage {
    pub async fn new(root: PathBuf, public_base_url: impl Into<String>) -> PortResult<Self> {
        fs::create_dir_all(&root).await.map_err(|e| {
            PortError::Unexpected(format!(
                "Failed to create storage directory '{}': {}",
                root.display(),
                e
            ))
        })?;
        info!(path = %root.display(), "Object storage initialized");
        Ok(Self {
            root,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ObjectStorage for FsObjectStorage {
    async fn upload(&self, path: &str, data: Bytes, _content_type: Option<&str>) -> PortResult<()> {
        if data.is_empty() {
            return Err(PortError::Unexpected(format!("Empty file for '{path}'")));
        }
        let target = ensure_within(&self.root, path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(format!("Failed to create '{path}': {e}")))?;
        }
        fs::write(&target, &data)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to write '{path}': {e}")))?;
        debug!(key = path, size = data.len(), "Stored object");
        Ok(())
    }

    /// Every key is validated before anything is deleted. Keys that are
    /// already gone count as removed.
    async fn remove(&self, paths: &[String]) -> PortResult<()> {
        let targets = paths
            .iter()
            .map(|p| ensure_within(&self.root, p))
            .collect::<PortResult<Vec<_>>>()?;

        let mut failures = Vec::new();
        for (key, target) in paths.iter().zip(targets) {
            match fs::remove_file(&target).await {
                Ok(()) => debug!(key = %key, "Removed object"),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    warn!(key = %key, "Object already absent")
                }
                Err(e) => failures.push(format!("{key}: {e}")),
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(PortError::Unexpected(format!(
                "Failed to remove objects: {}",
                failures.join(", ")
            )))
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_storage() -> (FsObjectStorage, TempDir) {
        let dir = TempDir::new().unwrap();
        let storage = FsObjectStorage::new(dir.path().to_path_buf(), "/storage/")
            .await
            .unwrap();
        (storage, dir)
    }

    #[tokio::test]
    async fn upload_then_remove() {
        let (storage, dir) = test_storage().await;
        storage
            .upload("weddings/1-abc.jpg", Bytes::from_static(b"jpeg"), Some("image/jpeg"))
            .await
            .unwrap();
        let on_disk = dir.path().join("weddings/1-abc.jpg");
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"jpeg");

        storage.remove(&["weddings/1-abc.jpg".to_string()]).await.unwrap();
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn removing_missing_key_is_not_an_error() {
        let (storage, _dir) = test_storage().await;
        assert!(storage.remove(&["gone/never.jpg".to_string()]).await.is_ok());
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let (storage, _dir) = test_storage().await;
        for key in ["../escape.jpg", "a/../../b.jpg", "/etc/passwd", ""] {
            assert!(
                storage.upload(key, Bytes::from_static(b"x"), None).await.is_err(),
                "{key}"
            );
        }
        assert!(storage.remove(&["../x".to_string()]).await.is_err());
    }

    #[tokio::test]
    async fn public_url_joins_base_and_key() {
        let (storage, _dir) = test_storage().await;
        assert_eq!(storage.public_url("homepage/1-a.png"), "/storage/homepage/1-a.png");
    }
}
