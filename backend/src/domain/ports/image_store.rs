//! Port abstraction for the image storage backend.
//!
//! The physical backend (filesystem, object store) is an external
//! collaborator; this port only moves validated bytes to a derived path.

use async_trait::async_trait;

use super::macros::define_port_error;

define_port_error! {
    /// Failures raised by image store adapters.
    pub enum ImageStoreError {
        /// The backend rejected or failed the write.
        Write => "image write failed: {message}",
    }
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist image bytes under a path relative to the media root.
    async fn save(&self, relative_path: &str, bytes: Vec<u8>) -> Result<(), ImageStoreError>;
}
