use std::fmt;

/// Severity of an operator notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for NotifyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyLevel::Info => write!(f, "info"),
            NotifyLevel::Warn => write!(f, "warn"),
            NotifyLevel::Error => write!(f, "error"),
        }
    }
}

/// Operator-facing notification sink (toasts in the host UI).
///
/// Messages are short and must never contain full credentials.
pub trait Notifier: Send + Sync + fmt::Debug {
    fn notify(&self, level: NotifyLevel, message: &str);
}
