//! Outgoing borrower notifications

/// Capability the lending service uses to tell borrowers about their loans.
///
/// Delivery is best effort: the service never looks at the outcome.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink {
    fn send(&self, message: &str, recipient: &str);
}
