//! Console notification adapter.

use crate::ports::notify_port::NotifyPort;

/// Prints alerts to stdout. Always reports success.
pub struct ConsoleNotifier;

impl NotifyPort for ConsoleNotifier {
    fn notify(&self, message: &str) -> bool {
        println!("{}", message);
        true
    }
}
