//! Filesystem-backed `ImageStore` adapter.
//!
//! Writes go through a `cap_std::fs::Dir` opened at the media root, so a
//! crafted relative path can never escape it. The blocking filesystem work
//! runs on the Tokio blocking pool.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use tokio::task;

use crate::domain::ports::{ImageStore, ImageStoreError};

/// Stores uploaded images under a media root directory.
#[derive(Clone)]
pub struct FsImageStore {
    media_root: PathBuf,
}

impl FsImageStore {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }
}

fn write_under_root(media_root: &Path, relative_path: &Path, bytes: &[u8]) -> io::Result<()> {
    Dir::create_ambient_dir_all(media_root, ambient_authority())?;
    let root = Dir::open_ambient_dir(media_root, ambient_authority())?;
    if let Some(parent) = relative_path.parent()
        && !parent.as_os_str().is_empty()
    {
        root.create_dir_all(parent)?;
    }
    root.write(relative_path, bytes)
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn save(&self, relative_path: &str, bytes: Vec<u8>) -> Result<(), ImageStoreError> {
        let media_root = self.media_root.clone();
        let relative_path = PathBuf::from(relative_path);
        task::spawn_blocking(move || write_under_root(&media_root, &relative_path, &bytes))
            .await
            .map_err(|err| ImageStoreError::write(err.to_string()))?
            .map_err(|err| ImageStoreError::write(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_back(root: &Path, relative: &str) -> Vec<u8> {
        let dir = Dir::open_ambient_dir(root, ambient_authority()).expect("media root exists");
        dir.read(relative).expect("written file readable")
    }

    #[tokio::test]
    async fn save_creates_nested_directories() {
        let media_root = tempfile::tempdir().expect("temp dir");
        let store = FsImageStore::new(media_root.path());

        store
            .save("uploads/recipe/photo.png", b"\x89PNG bytes".to_vec())
            .await
            .expect("save succeeds");

        assert_eq!(
            read_back(media_root.path(), "uploads/recipe/photo.png"),
            b"\x89PNG bytes"
        );
    }

    #[tokio::test]
    async fn save_overwrites_an_existing_file() {
        let media_root = tempfile::tempdir().expect("temp dir");
        let store = FsImageStore::new(media_root.path());

        store
            .save("uploads/recipe/photo.png", b"first".to_vec())
            .await
            .expect("first save succeeds");
        store
            .save("uploads/recipe/photo.png", b"second".to_vec())
            .await
            .expect("second save succeeds");

        assert_eq!(read_back(media_root.path(), "uploads/recipe/photo.png"), b"second");
    }

    #[tokio::test]
    async fn save_rejects_paths_escaping_the_media_root() {
        let media_root = tempfile::tempdir().expect("temp dir");
        let store = FsImageStore::new(media_root.path());

        let result = store.save("../escape.png", b"nope".to_vec()).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn save_creates_a_missing_media_root() {
        let parent = tempfile::tempdir().expect("temp dir");
        let media_root = parent.path().join("media");
        let store = FsImageStore::new(&media_root);

        store
            .save("uploads/recipe/photo.gif", b"GIF89a".to_vec())
            .await
            .expect("save succeeds");

        assert_eq!(read_back(&media_root, "uploads/recipe/photo.gif"), b"GIF89a");
    }
}
