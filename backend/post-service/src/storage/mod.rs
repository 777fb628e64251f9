//! File storage for post images.
//!
//! The service only ever needs three operations: write a new file, read it
//! back and remove it. `LocalFileStorage` keeps files under a root
//! directory on local disk; references handed out are paths relative to
//! that root (`images/<uuid>.<ext>`), never absolute paths.

use crate::error::{AppError, Result};
use crate::models::FileRef;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

const IMAGE_DIR: &str = "images";

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Persist `bytes` and return a reference to the new file.
    async fn store(&self, bytes: &[u8], content_type: &mime::Mime) -> Result<FileRef>;

    /// Read a stored file.
    async fn read(&self, file: &FileRef) -> Result<Vec<u8>>;

    /// Remove a stored file.
    async fn delete(&self, file: &FileRef) -> Result<()>;
}

/// File storage rooted at a directory on local disk
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the image directory if it does not exist yet.
    pub async fn ensure_dirs(&self) -> Result<()> {
        tokio::fs::create_dir_all(self.root.join(IMAGE_DIR)).await?;
        Ok(())
    }

    fn resolve(&self, file: &FileRef) -> Result<PathBuf> {
        let relative = Path::new(file.as_str());
        let is_plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

        if !is_plain || relative.as_os_str().is_empty() {
            return Err(AppError::Internal(format!("invalid file reference '{}'", file)));
        }

        Ok(self.root.join(relative))
    }
}

fn extension_for(content_type: &mime::Mime) -> &'static str {
    match content_type.subtype().as_str() {
        "jpeg" | "jpg" => "jpg",
        "png" => "png",
        "gif" => "gif",
        "webp" => "webp",
        _ => "bin",
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(&self, bytes: &[u8], content_type: &mime::Mime) -> Result<FileRef> {
        let file = FileRef(format!(
            "{}/{}.{}",
            IMAGE_DIR,
            Uuid::new_v4(),
            extension_for(content_type)
        ));
        let path = self.resolve(&file)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(file = %file, size = bytes.len(), "stored file");
        Ok(file)
    }

    async fn read(&self, file: &FileRef) -> Result<Vec<u8>> {
        let path = self.resolve(file)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("file {}", file)))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, file: &FileRef) -> Result<()> {
        let path = self.resolve(file)?;
        tokio::fs::remove_file(&path).await?;
        tracing::debug!(file = %file, "deleted file");
        Ok(())
    }
}
