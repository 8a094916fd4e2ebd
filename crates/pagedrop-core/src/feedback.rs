//! User-facing notices (toasts) mirrored to the diagnostic log.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// Transient notice for the user. Not retained anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackEvent {
    pub message: String,
    pub severity: Severity,
}

impl FeedbackEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Info,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for FeedbackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Surface that shows notices to the user (a toast on mobile, stdout in the CLI).
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &FeedbackEvent);
}

/// Logs the event and hands it to the notifier. Fire-and-forget.
pub fn emit(notifier: &dyn Notifier, event: FeedbackEvent) {
    match event.severity {
        Severity::Info => tracing::info!(notice = %event.message, "feedback"),
        Severity::Error => tracing::error!(notice = %event.message, "feedback"),
    }
    notifier.notify(&event);
}

/// Notifier that only logs. Useful for headless hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyNotifier;

impl Notifier for LogOnlyNotifier {
    fn notify(&self, _event: &FeedbackEvent) {}
}
