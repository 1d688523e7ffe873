//! services/api/src/adapters/blob.rs
//!
//! This module contains the local filesystem blob store, the concrete
//! implementation of the `BlobStore` port used for tasting photos.

use async_trait::async_trait;
use beer_journal_core::ports::{BlobStore, PortError, PortResult};
use chrono::Utc;
use std::path::PathBuf;
use tracing::{error, info};

/// URL path prefix the stored files are served under.
pub const UPLOADS_ROUTE: &str = "/uploads";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Writes uploads into a directory that the server also exposes under `/uploads`.
#[derive(Clone)]
pub struct LocalBlobStore {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    /// Creates a new `LocalBlobStore`.
    pub fn new(dir: PathBuf, public_base_url: String) -> Self {
        Self {
            dir,
            public_base_url,
        }
    }
}

//=========================================================================================
// `BlobStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl BlobStore for LocalBlobStore {
    /// Expects an already sanitised file name; anything that could escape the
    /// upload directory is refused.
    async fn put(&self, filename: &str, data: &[u8]) -> PortResult<String> {
        if filename.is_empty() || filename.contains(['/', '\\']) {
            return Err(PortError::Unexpected(format!(
                "Refusing to store blob under '{}'",
                filename
            )));
        }
        let stored_name = format!("{}-{}", Utc::now().timestamp_millis(), filename);
        let path = self.dir.join(&stored_name);

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            error!("Failed to create upload directory {:?}: {:?}", self.dir, e);
            PortError::Unexpected(e.to_string())
        })?;
        tokio::fs::write(&path, data).await.map_err(|e| {
            error!("Failed to write upload {:?}: {:?}", path, e);
            PortError::Unexpected(e.to_string())
        })?;

        info!("Stored upload at {:?} ({} bytes)", path, data.len());
        Ok(format!(
            "{}{}/{}",
            self.public_base_url, UPLOADS_ROUTE, stored_name
        ))
    }
}
