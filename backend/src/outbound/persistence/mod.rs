//! PostgreSQL persistence adapters.
//!
//! Each repository implements one domain port on top of a shared
//! `diesel-async` connection pool. Row structs and the generated schema stay
//! private to this module; only the adapters and pool types are exported.

mod diesel_access_token_repository;
mod diesel_attribute_repository;
mod diesel_error;
mod diesel_recipe_repository;
mod diesel_user_repository;
mod models;
mod pool;
mod schema;

pub use diesel_access_token_repository::DieselAccessTokenRepository;
pub use diesel_attribute_repository::DieselAttributeRepository;
pub use diesel_recipe_repository::DieselRecipeRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
