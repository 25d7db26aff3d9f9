//! AIC Core: domain models, the permission catalog and repository
//! traits shared by the storage and access-control crates.

pub mod authz;
pub mod error;
pub mod models;
pub mod repository;

pub use error::{AicError, AicResult};
