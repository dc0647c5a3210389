//! HTTP inbound adapter exposing REST endpoints.

pub mod attributes;
pub mod auth;
pub mod error;
pub mod recipes;
pub mod routes;
pub mod state;
pub mod users;
pub mod validation;

pub use error::ApiResult;
