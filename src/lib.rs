//! Elidune Circulation
//!
//! The loan lifecycle engine behind Elidune: item inventory, borrower
//! eligibility, per-category loan rules and fines on late returns.

pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use services::{LendingService, NotificationSink};
