//! AIC Access: permission checks, role assignment, notification
//! fan-out, activity logging and retention for AIC production tracking.

pub mod activity;
pub mod assignment;
pub mod authorization;
pub mod config;
pub mod context;
pub mod error;
pub mod notification;
pub mod retention;
pub mod roles;
pub mod seeding;
pub mod service;

pub use activity::ActivityEntry;
pub use authorization::{MatrixCell, MatrixRow};
pub use config::{AccessConfig, RetentionPolicy};
pub use context::RequestContext;
pub use error::AccessError;
pub use retention::PurgeReport;
pub use seeding::{DEFAULT_ROLES, SUPER_ADMINISTRATOR, SeedReport};
pub use service::AccessService;
