//! Pump/mains state store — notifies only on actual change.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{device::DeviceStatus, store::Subscription};

type Listener = Arc<dyn Fn(DeviceStatus) + Send + Sync>;

/// The latest pump/mains snapshot for the monitored room.
///
/// `update` overwrites the snapshot wholesale and fans out to observers
/// only when a flag actually changed, so a steady-state poll loop
/// produces no repaint churn.
pub struct DeviceStateStore {
  inner: Mutex<Inner>,
}

struct Inner {
  status:    DeviceStatus,
  listeners: Vec<(Subscription, Listener)>,
}

impl DeviceStateStore {
  /// Store starting from the all-off snapshot.
  pub fn new() -> Self {
    Self {
      inner: Mutex::new(Inner {
        status:    DeviceStatus::default(),
        listeners: Vec::new(),
      }),
    }
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  // ── Mutation ──────────────────────────────────────────────────────────────

  /// Overwrite the snapshot; notify observers only if either flag
  /// differs from the pre-update value. Returns whether anything
  /// changed — repeated identical updates are silent no-ops.
  pub fn update(&self, status: DeviceStatus) -> bool {
    let listeners = {
      let mut inner = self.lock();
      if inner.status == status {
        return false;
      }
      inner.status = status;
      inner
        .listeners
        .iter()
        .map(|(_, l)| Arc::clone(l))
        .collect::<Vec<_>>()
    };

    for listener in &listeners {
      listener(status);
    }
    true
  }

  // ── Observation ───────────────────────────────────────────────────────────

  /// Register `listener` and synchronously hand it the current snapshot.
  pub fn observe<F>(&self, listener: F) -> Subscription
  where
    F: Fn(DeviceStatus) + Send + Sync + 'static,
  {
    let token = Subscription::next();
    let listener: Listener = Arc::new(listener);
    let current = {
      let mut inner = self.lock();
      inner.listeners.push((token, Arc::clone(&listener)));
      inner.status
    };
    listener(current);
    token
  }

  /// Remove a listener. Unknown or already-removed tokens are ignored.
  pub fn unobserve(&self, token: Subscription) {
    self.lock().listeners.retain(|(t, _)| *t != token);
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Current snapshot.
  pub fn status(&self) -> DeviceStatus {
    self.lock().status
  }
}

impl Default for DeviceStateStore {
  fn default() -> Self {
    Self::new()
  }
}
