//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::AccountService;
use crate::domain::ports::{AttributeRepository, ImageStore, MemoryStore, RecipeRepository};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: AccountService,
    pub attributes: Arc<dyn AttributeRepository>,
    pub recipes: Arc<dyn RecipeRepository>,
    pub images: Arc<dyn ImageStore>,
}

impl HttpState {
    /// Construct state from explicit port implementations.
    #[must_use]
    pub fn new(
        accounts: AccountService,
        attributes: Arc<dyn AttributeRepository>,
        recipes: Arc<dyn RecipeRepository>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            accounts,
            attributes,
            recipes,
            images,
        }
    }

    /// State backed entirely by one in-memory store. Used when no database
    /// is configured and throughout the handler tests.
    #[must_use]
    pub fn in_memory(store: MemoryStore) -> Self {
        let accounts =
            AccountService::new(Arc::new(store.clone()), Arc::new(store.clone()));
        Self::new(
            accounts,
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
        )
    }
}
