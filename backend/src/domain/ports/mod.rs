//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Ports describe how the domain expects to interact with driven adapters
//! (databases, filesystems). Each trait exposes strongly typed errors so
//! adapters map their failures into predictable variants.

mod macros;

mod access_token_repository;
mod attribute_repository;
mod image_store;
mod memory;
mod recipe_repository;
mod user_repository;

pub use access_token_repository::{AccessTokenRepository, TokenPersistenceError};
pub use attribute_repository::{AttributeListing, AttributePersistenceError, AttributeRepository};
pub use image_store::{ImageStore, ImageStoreError};
pub use memory::MemoryStore;
pub use recipe_repository::{RecipePersistenceError, RecipeRepository};
pub use user_repository::{ProfileChanges, UserPersistenceError, UserRepository};
