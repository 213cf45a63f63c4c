//! Content-addressed image store backing image paints.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::model::ImageHash;

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("Image {0} is not registered")]
    NotFound(ImageHash),
}

/// Host-side image registry. Hashes are derived from the bytes, so registering
/// the same image twice yields the same handle.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn register(&self, bytes: Bytes) -> ImageHash;
    async fn fetch(&self, hash: &ImageHash) -> Result<Bytes, ImageStoreError>;
    /// Forgets every registered image. Returns how many were dropped.
    async fn clear(&self) -> usize;
}

pub fn hash_image(bytes: &[u8]) -> ImageHash {
    ImageHash(blake3::hash(bytes).to_hex().to_string())
}

#[derive(Default)]
pub struct MemoryImageStore {
    images: RwLock<HashMap<ImageHash, Bytes>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn register(&self, bytes: Bytes) -> ImageHash {
        let hash = hash_image(&bytes);
        let mut images = self.images.write().await;
        if !images.contains_key(&hash) {
            debug!("Registered image {hash} ({} bytes)", bytes.len());
            images.insert(hash.clone(), bytes);
        }
        hash
    }

    async fn fetch(&self, hash: &ImageHash) -> Result<Bytes, ImageStoreError> {
        self.images
            .read()
            .await
            .get(hash)
            .cloned()
            .ok_or_else(|| ImageStoreError::NotFound(hash.clone()))
    }

    async fn clear(&self) -> usize {
        let mut images = self.images.write().await;
        let dropped = images.len();
        images.clear();
        debug!("Dropped {dropped} image(s)");
        dropped
    }
}
