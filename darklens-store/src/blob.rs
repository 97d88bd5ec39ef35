//! Screenshot blob storage
//!
//! A failed write never raises: the caller gets `None` and carries on
//! with a record that has no screenshot reference.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs::{create_dir_all, write};
use tracing::{debug, error};

use crate::StoreError;

/// Storage for page captures
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `name`; returns a reference, or `None` on failure
    async fn store(&self, bytes: &[u8], name: &str) -> Option<String>;
}

/// Names must be a single plain path component
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}

/// Blob store writing into a local directory
pub struct FsBlobStore {
    path: PathBuf,
    public_base: Option<String>,
}

impl FsBlobStore {
    /// Create the directory if needed
    ///
    /// With `public_base`, references are `"{public_base}/{name}"`,
    /// otherwise they are the written file path.
    pub async fn new(path: PathBuf, public_base: Option<String>) -> Result<Self, StoreError> {
        create_dir_all(&path).await?;
        Ok(Self {
            path,
            public_base: public_base.map(|b| b.trim_end_matches('/').to_string()),
        })
    }

    fn reference(&self, name: &str) -> String {
        match &self.public_base {
            Some(base) => format!("{}/{}", base, name),
            None => self.path.join(name).display().to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn store(&self, bytes: &[u8], name: &str) -> Option<String> {
        if !is_safe_name(name) {
            error!("Refusing to store blob with unsafe name: {:?}", name);
            return None;
        }

        match write(self.path.join(name), bytes).await {
            Ok(()) => {
                let reference = self.reference(name);
                debug!("Stored {} bytes as {}", bytes.len(), reference);
                Some(reference)
            }
            Err(e) => {
                error!("Failed to store blob {}: {}", name, e);
                None
            }
        }
    }
}

/// Blob store kept in memory
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.blobs.lock().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(&self, bytes: &[u8], name: &str) -> Option<String> {
        if !is_safe_name(name) {
            return None;
        }
        self.blobs.lock().insert(name.to_string(), bytes.to_vec());
        Some(format!("memory://{}", name))
    }
}
