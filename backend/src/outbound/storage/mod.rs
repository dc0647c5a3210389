//! Storage adapters for uploaded media.

mod fs_image_store;

pub use fs_image_store::FsImageStore;
