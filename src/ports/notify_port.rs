//! Notification delivery port trait.

/// Delivery channel for scan alerts. Returns true when the message was
/// accepted by the channel.
pub trait NotifyPort {
    fn notify(&self, message: &str) -> bool;
}
