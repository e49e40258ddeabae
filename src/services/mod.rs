//! Business logic services

pub mod lending;
pub mod notification;

pub use lending::LendingService;
pub use notification::NotificationSink;
