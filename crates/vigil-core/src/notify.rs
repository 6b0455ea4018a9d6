//! Notification seam between the alert store and platform toasts.

use crate::alert::Alert;

/// Receives each alert exactly once, at the moment the store first sees
/// its id. Implementations live near the UI (the CLI raises desktop
/// notifications); the store only needs something callable.
pub trait NotificationSink: Send + Sync {
  fn notify(&self, alert: &Alert);
}
