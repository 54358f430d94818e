//! Image persistence.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Errors from an [`ImageStore`].
#[derive(Debug, Error)]
pub enum ImageStoreError {
    /// The image type cannot be used as a file extension.
    #[error("invalid image type: {0:?}")]
    InvalidImageType(String),
    /// Writing the image failed.
    #[error("cannot write image file {path}: {source}")]
    Io {
        /// Target file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Where a saved image lives and who it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// Owning laptop
    pub laptop_id: String,
    /// Extension including the leading dot, e.g. `.jpg`
    pub image_type: String,
    /// File the bytes were written to
    pub path: PathBuf,
}

/// Persistence for uploaded images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Save `data` as an image of `laptop_id` and return the new image ID.
    async fn save(
        &self,
        laptop_id: &str,
        image_type: &str,
        data: Vec<u8>,
    ) -> Result<String, ImageStoreError>;
}

/// Stores images as `<folder>/<image-id><image-type>` files.
pub struct DiskImageStore {
    folder: PathBuf,
    images: RwLock<HashMap<String, ImageInfo>>,
}

impl fmt::Debug for DiskImageStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskImageStore")
            .field("folder", &self.folder)
            .finish_non_exhaustive()
    }
}

impl DiskImageStore {
    /// Create a store writing into `folder`. The folder is created on first save.
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            images: RwLock::new(HashMap::new()),
        }
    }

    /// The folder images are written to.
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Look up a previously saved image.
    pub async fn find(&self, image_id: &str) -> Option<ImageInfo> {
        self.images.read().await.get(image_id).cloned()
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ImageStoreError + '_ {
    move |source| ImageStoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl ImageStore for DiskImageStore {
    async fn save(
        &self,
        laptop_id: &str,
        image_type: &str,
        data: Vec<u8>,
    ) -> Result<String, ImageStoreError> {
        if image_type.contains(['/', '\\']) || image_type.contains("..") {
            return Err(ImageStoreError::InvalidImageType(image_type.to_string()));
        }

        let image_id = Uuid::new_v4().to_string();
        let path = self.folder.join(format!("{image_id}{image_type}"));

        tokio::fs::create_dir_all(&self.folder)
            .await
            .map_err(io_error(&self.folder))?;
        tokio::fs::write(&path, &data).await.map_err(io_error(&path))?;

        tracing::debug!(%image_id, path = %path.display(), size = data.len(), "wrote image file");

        self.images.write().await.insert(
            image_id.clone(),
            ImageInfo {
                laptop_id: laptop_id.to_string(),
                image_type: image_type.to_string(),
                path,
            },
        );
        Ok(image_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_writes_file_and_indexes_it() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::new(dir.path().join("img"));

        let id = store.save("laptop-1", ".jpg", vec![7; 128]).await.unwrap();

        let info = store.find(&id).await.unwrap();
        assert_eq!(info.laptop_id, "laptop-1");
        assert_eq!(info.image_type, ".jpg");
        assert_eq!(info.path, dir.path().join("img").join(format!("{id}.jpg")));
        assert_eq!(std::fs::read(&info.path).unwrap(), vec![7; 128]);
    }

    #[tokio::test]
    async fn test_each_save_gets_new_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::new(dir.path());

        let a = store.save("laptop-1", ".png", vec![1]).await.unwrap();
        let b = store.save("laptop-1", ".png", vec![1]).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_rejects_path_in_image_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::new(dir.path());

        let err = store
            .save("laptop-1", "/../../etc/passwd", vec![1])
            .await
            .unwrap_err();

        assert!(matches!(err, ImageStoreError::InvalidImageType(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_find_unknown_is_none() {
        let store = DiskImageStore::new("unused");
        assert!(store.find("nope").await.is_none());
    }
}
