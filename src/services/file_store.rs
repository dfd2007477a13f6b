use std::path::{Path, PathBuf};

use axum::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

use crate::error::{Error, Result};

const ALLOWED_EXTENSIONS: [&str; 6] = ["pdf", "doc", "docx", "jpg", "jpeg", "png"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub public_id: String,
    pub url: String,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn store(&self, data: &[u8], file_name: &str, folder: &str) -> Result<StoredFile>;

    async fn remove(&self, public_id: &str) -> Result<()>;
}

/// Writes uploads under `root/<folder>/` and serves them from `public_base`.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
    public_base: String,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }
}

pub(crate) fn checked_extension(file_name: &str, data: &[u8]) -> Result<String> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(Error::BadRequest(format!("File type .{} is not allowed", ext)));
    }
    if ext == "pdf" && !data.starts_with(b"%PDF") {
        return Err(Error::BadRequest("Invalid PDF file content".into()));
    }
    if (ext == "jpg" || ext == "jpeg") && !data.starts_with(&[0xFF, 0xD8]) {
        return Err(Error::BadRequest("Invalid JPEG file content".into()));
    }
    if ext == "png" && !data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return Err(Error::BadRequest("Invalid PNG file content".into()));
    }
    Ok(ext)
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(&self, data: &[u8], file_name: &str, folder: &str) -> Result<StoredFile> {
        let ext = checked_extension(file_name, data)?;

        let dir = self.root.join(folder);
        fs::create_dir_all(&dir).await?;

        let public_id = format!("{}/{}.{}", folder, Uuid::new_v4(), ext);
        fs::write(self.root.join(&public_id), data).await.map_err(|e| {
            tracing::error!(error = %e, public_id = %public_id, "failed to write upload");
            Error::Internal(format!("Failed to save file: {}", e))
        })?;

        tracing::info!(public_id = %public_id, bytes = data.len(), "stored upload");
        Ok(StoredFile {
            url: format!("{}/{}", self.public_base, public_id),
            public_id,
        })
    }

    async fn remove(&self, public_id: &str) -> Result<()> {
        if Path::new(public_id)
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err(Error::BadRequest(format!("invalid file id {}", public_id)));
        }
        match fs::remove_file(self.root.join(public_id)).await {
            Ok(()) => {
                tracing::info!(public_id = %public_id, "removed upload");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
