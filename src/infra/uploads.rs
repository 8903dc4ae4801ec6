//! Storage for images attached to posts.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use sha2::{Digest, Sha256};
use slug::slugify;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

/// Directory, relative to the media root, that holds post images.
pub const POST_IMAGES_DIR: &str = "posts_images";

#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("uploaded file is empty")]
    EmptyPayload,
    #[error("uploaded file is not a supported image: {0}")]
    NotAnImage(String),
}

/// Pixel dimensions read from an image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub stored_path: String,
    pub checksum: String,
    pub size_bytes: u64,
}

/// Filesystem-backed media storage.
#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store an uploaded image under [`POST_IMAGES_DIR`].
    pub async fn store_image(
        &self,
        original_name: &str,
        data: Bytes,
    ) -> Result<StoredUpload, UploadStorageError> {
        if data.is_empty() {
            return Err(UploadStorageError::EmptyPayload);
        }
        inspect_image(&data)?;

        let stored_path = build_stored_path(original_name);
        let absolute = self.resolve(&stored_path)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&absolute).await?;
        if let Err(err) = file.write_all(&data).await {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            return Err(err.into());
        }
        file.flush().await?;

        let checksum = hex::encode(Sha256::digest(&data));
        Ok(StoredUpload {
            stored_path,
            checksum,
            size_bytes: data.len() as u64,
        })
    }

    pub async fn read(&self, stored_path: &str) -> Result<Bytes, UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    /// Remove the stored payload. Missing files are treated as success.
    pub async fn delete(&self, stored_path: &str) -> Result<(), UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        match fs::remove_file(&absolute).await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(UploadStorageError::Io(err)),
        }
    }

    fn resolve(&self, stored_path: &str) -> Result<PathBuf, UploadStorageError> {
        let relative = Path::new(stored_path);
        if stored_path.is_empty()
            || relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(UploadStorageError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}

/// Reject payloads whose header is not a recognised raster format.
pub fn inspect_image(data: &[u8]) -> Result<ImageDimensions, UploadStorageError> {
    let size = imagesize::blob_size(data)
        .map_err(|err| UploadStorageError::NotAnImage(err.to_string()))?;
    if size.width == 0 || size.height == 0 {
        return Err(UploadStorageError::NotAnImage(
            "image has no pixels".to_string(),
        ));
    }
    Ok(ImageDimensions {
        width: size.width,
        height: size.height,
    })
}

fn build_stored_path(original_name: &str) -> String {
    let (year, month, day) = time::OffsetDateTime::now_utc().to_calendar_date();
    let identifier = Uuid::new_v4().simple();
    let filename = sanitize_filename(original_name);
    format!(
        "{POST_IMAGES_DIR}/{year}/{:02}/{day:02}/{identifier}-{filename}",
        month as u8
    )
}

fn sanitize_filename(original: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("image");
    let mut base = slugify(stem);
    if base.is_empty() {
        base = "image".to_string();
    }

    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.trim_matches('.').to_ascii_lowercase())
        .filter(|value| !value.is_empty());

    match extension {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Smallest valid GIF: 1x1, one colour.
    pub(crate) const TINY_GIF: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
        0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
        0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
    ];

    #[test]
    fn sanitize_filename_slugifies_stem() {
        assert_eq!(sanitize_filename("My Holiday Photo.JPG"), "my-holiday-photo.jpg");
        assert_eq!(sanitize_filename("???"), "image");
    }

    #[test]
    fn inspect_image_reads_dimensions() {
        let dims = inspect_image(TINY_GIF).expect("gif header");
        assert_eq!(dims, ImageDimensions { width: 1, height: 1 });
        assert!(inspect_image(b"plain text, not an image").is_err());
    }

    #[tokio::test]
    async fn store_read_delete_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(dir.path().to_path_buf()).expect("storage");

        let stored = storage
            .store_image("pixel.gif", Bytes::from_static(TINY_GIF))
            .await
            .expect("stored");
        assert!(stored.stored_path.starts_with("posts_images/"));
        assert!(stored.stored_path.ends_with("-pixel.gif"));
        assert_eq!(stored.size_bytes, TINY_GIF.len() as u64);
        assert_eq!(stored.checksum.len(), 64);

        let data = storage.read(&stored.stored_path).await.expect("read");
        assert_eq!(&data[..], TINY_GIF);

        storage.delete(&stored.stored_path).await.expect("deleted");
        storage
            .delete(&stored.stored_path)
            .await
            .expect("second delete is a no-op");
    }

    #[tokio::test]
    async fn rejects_non_images_and_traversal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(dir.path().to_path_buf()).expect("storage");

        let err = storage
            .store_image("evil.png", Bytes::from_static(b"#!/bin/sh"))
            .await
            .expect_err("not an image");
        assert!(matches!(err, UploadStorageError::NotAnImage(_)));

        let err = storage.read("../etc/passwd").await.expect_err("traversal");
        assert!(matches!(err, UploadStorageError::InvalidPath));
    }
}
