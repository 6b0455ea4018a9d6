//! Desktop notification sink backed by `notify-rust`.

use notify_rust::Notification;
use vigil_core::{alert::Alert, notify::NotificationSink};

/// Raises one desktop notification per newly-seen alert.
///
/// Display failures are logged and swallowed; a missing notification
/// daemon must never reach the poll loop.
pub struct DesktopNotifier;

impl NotificationSink for DesktopNotifier {
  fn notify(&self, alert: &Alert) {
    let result = Notification::new()
      .summary(&alert.display_kind())
      .body(&notification_body(alert))
      .show();
    if let Err(error) = result {
      tracing::warn!(%error, alert_id = alert.id, "desktop notification failed");
    }
  }
}

/// The alert message plus, when the service annotated the alert, a
/// second line with the savings estimate and detector confidence.
fn notification_body(alert: &Alert) -> String {
  let mut extras = Vec::new();
  if let Some(savings) = &alert.estimated_savings {
    extras.push(format!("Savings {savings}"));
  }
  if let Some(score) = &alert.probability_score {
    extras.push(format!("Confidence {score}"));
  }
  if extras.is_empty() {
    alert.message.clone()
  } else {
    format!("{}\n{}", alert.message, extras.join(" • "))
  }
}
