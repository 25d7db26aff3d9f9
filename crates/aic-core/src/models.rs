//! Domain models for the AIC access-control core.

pub mod account;
pub mod activity;
pub mod notification;
pub mod permission;
pub mod role;
pub mod role_history;
pub mod subject;
