//! Fixed-interval fetch loop that keeps the stores current.

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use vigil_core::{
  notify::NotificationSink,
  store::{AlertStore, DeviceStateStore},
};

use crate::api::ApiClient;

/// Polls the service on a fixed period and forwards results into the
/// stores. Fetch failures are logged and skipped; the loop itself never
/// stops until [`PollerHandle::shutdown`].
pub struct Poller {
  client:   ApiClient,
  room:     String,
  period:   Duration,
  alerts:   Arc<AlertStore>,
  devices:  Arc<DeviceStateStore>,
  notifier: Option<Arc<dyn NotificationSink>>,
}

impl Poller {
  /// A zero `period` is clamped to one millisecond; the interval timer
  /// cannot run on a zero period.
  pub fn new(
    client: ApiClient,
    room: impl Into<String>,
    period: Duration,
    alerts: Arc<AlertStore>,
    devices: Arc<DeviceStateStore>,
    notifier: Option<Arc<dyn NotificationSink>>,
  ) -> Self {
    Self {
      client,
      room: room.into(),
      period: period.max(Duration::from_millis(1)),
      alerts,
      devices,
      notifier,
    }
  }

  /// Start polling on a background task. The first round runs
  /// immediately; subsequent rounds wait out the period.
  pub fn spawn(self) -> PollerHandle {
    PollerHandle {
      task: tokio::spawn(self.run()),
    }
  }

  async fn run(self) {
    let mut ticker = tokio::time::interval(self.period);
    // A slow round delays the next tick rather than stacking ticks, so
    // rounds never overlap.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
      ticker.tick().await;
      self.poll_once().await;
    }
  }

  /// One fetch round: alert history first, then device status, each
  /// applied to its store as soon as it arrives.
  pub(crate) async fn poll_once(&self) {
    match self.client.alert_history().await {
      Ok(batch) => {
        let fresh = self.alerts.update(&batch, self.notifier.as_deref());
        if fresh > 0 {
          tracing::info!(fresh, total = self.alerts.len(), "new alerts");
        } else {
          tracing::debug!(total = self.alerts.len(), "alert history unchanged");
        }
      }
      Err(error) => tracing::warn!(%error, "alert fetch failed"),
    }

    match self.client.room_status(&self.room).await {
      Ok(status) => {
        if self.devices.update(status) {
          tracing::info!(
            pump_on = status.pump_on,
            power_on = status.power_on,
            "device status changed"
          );
        }
      }
      Err(error) => tracing::warn!(%error, "status fetch failed"),
    }
  }
}

/// Owner's handle to a spawned [`Poller`]. Dropping it stops the loop.
pub struct PollerHandle {
  task: JoinHandle<()>,
}

impl PollerHandle {
  /// Stop polling. Idempotent, safe from any teardown path.
  pub fn shutdown(&self) {
    self.task.abort();
  }
}

impl Drop for PollerHandle {
  fn drop(&mut self) {
    self.task.abort();
  }
}
