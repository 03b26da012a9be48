//! User-facing outcome notifications.

/// Receives the outcome of every mutating editor action.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);

    /// The action completed only in part.
    fn warning(&self, message: &str);

    fn error(&self, message: &str);
}

/// Writes notifications to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!(notification = "success", "{message}");
    }

    fn warning(&self, message: &str) {
        tracing::warn!(notification = "warning", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(notification = "error", "{message}");
    }
}
