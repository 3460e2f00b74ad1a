use std::{sync::Mutex, time::Duration};

/// How long a transient notification stays visible before auto-dismissing.
pub const DISMISS_AFTER: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient, auto-dismissing user-visible message reporting the outcome of
/// an action.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);

    fn info(&self, message: &str) {
        self.notify(Severity::Info, message);
    }

    fn success(&self, message: &str) {
        self.notify(Severity::Success, message);
    }

    fn warning(&self, message: &str) {
        self.notify(Severity::Warning, message);
    }

    fn error(&self, message: &str) {
        self.notify(Severity::Error, message);
    }
}

/// A [`Notifier`] that records notifications for later inspection.
#[derive(Default)]
pub struct BufferedNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl BufferedNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications recorded so far, in emission order.
    pub fn entries(&self) -> Vec<Notification> {
        let entries = self.entries.lock().expect("notifier mutex poisoned");
        entries.clone()
    }

    /// Remove and return all recorded notifications.
    pub fn drain(&self) -> Vec<Notification> {
        let mut entries = self.entries.lock().expect("notifier mutex poisoned");
        std::mem::take(&mut *entries)
    }
}

impl Notifier for BufferedNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        tracing::debug!(?severity, message, "notification");
        let mut entries = self.entries.lock().expect("notifier mutex poisoned");
        entries.push(Notification {
            severity,
            message: message.to_string(),
        });
    }
}
