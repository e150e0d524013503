use tracing::{error, info, warn};

use crate::domain::{Notifier, NotifyLevel};

/// Notifier for hosts without a UI: operator messages go to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NotifyLevel, message: &str) {
        match level {
            NotifyLevel::Info => info!(target: "operator", "{}", message),
            NotifyLevel::Warn => warn!(target: "operator", "{}", message),
            NotifyLevel::Error => error!(target: "operator", "{}", message),
        }
    }
}
