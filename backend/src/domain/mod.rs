//! Domain primitives, aggregates, and use-case services.
//!
//! Purpose: define strongly typed entities shared by the API and persistence
//! layers. Types stay immutable; invariants and serialization contracts live
//! in each type's Rustdoc.

pub mod accounts;
pub mod attribute;
pub mod auth;
pub mod error;
pub mod password;
pub mod ports;
pub mod recipe;
pub mod trace_id;
pub mod user;

pub use self::accounts::AccountService;
pub use self::attribute::{Attribute, AttributeId, AttributeKind, AttributeName};
pub use self::auth::{AccessToken, LoginCredentials};
pub use self::error::{Error, ErrorCode};
pub use self::recipe::{
    ImageFormat, Recipe, RecipeDraft, RecipeFilter, RecipeId, RecipePatch,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{DisplayName, EmailAddress, Profile, User, UserId};
