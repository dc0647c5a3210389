//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! Adapters are thin translators between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod persistence;
pub mod storage;
