//! The access service: one handle over the store and its configuration.
//!
//! Operations are grouped by concern in sibling modules, each adding an
//! `impl` block to [`AccessService`].

use aic_core::repository::Store;

use crate::config::AccessConfig;

/// Access-control service.
///
/// Generic over the store implementation so that the access layer has
/// no dependency on the database crate.
#[derive(Clone)]
pub struct AccessService<S: Store> {
    pub(crate) store: S,
    pub(crate) config: AccessConfig,
}

impl<S: Store> AccessService<S> {
    pub fn new(store: S, config: AccessConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &AccessConfig {
        &self.config
    }
}
