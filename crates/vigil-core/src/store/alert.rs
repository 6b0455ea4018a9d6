//! Alert feed store — deduplicated, newest arrival first.

use std::{
  collections::{HashSet, VecDeque},
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{alert::Alert, notify::NotificationSink, store::Subscription};

type Listener = Arc<dyn Fn(&[Alert]) + Send + Sync>;

/// Every alert this process has seen, ordered by arrival (newest
/// first), plus the seen-id set that makes repeated history fetches
/// idempotent.
///
/// The visible list can be capped ([`AlertStore::with_cap`]). The
/// seen-id set is never trimmed: the service replays its full history
/// on every poll, and a forgotten id would re-enter the feed as "new".
pub struct AlertStore {
  inner: Mutex<Inner>,
  cap:   Option<usize>,
}

struct Inner {
  alerts:    VecDeque<Alert>,
  seen:      HashSet<i64>,
  listeners: Vec<(Subscription, Listener)>,
}

impl AlertStore {
  /// Empty store with an unbounded visible list.
  pub fn new() -> Self {
    Self::build(None)
  }

  /// Empty store that keeps only the `cap` newest arrivals visible.
  pub fn with_cap(cap: usize) -> Self {
    Self::build(Some(cap))
  }

  fn build(cap: Option<usize>) -> Self {
    Self {
      inner: Mutex::new(Inner {
        alerts:    VecDeque::new(),
        seen:      HashSet::new(),
        listeners: Vec::new(),
      }),
      cap,
    }
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  // ── Mutation ──────────────────────────────────────────────────────────────

  /// Merge a fetched batch into the feed.
  ///
  /// Each alert whose id has not been seen before is added to the
  /// seen-set and prepended to the list, in batch iteration order (so a
  /// batch's later entries land newer in the feed). When a `notifier`
  /// is supplied it is invoked once per newly-seen alert. Observers are
  /// notified once per call, and only if something was inserted.
  ///
  /// Returns the number of newly-inserted alerts.
  pub fn update(
    &self,
    batch: &[Alert],
    notifier: Option<&dyn NotificationSink>,
  ) -> usize {
    let mut fresh: Vec<Alert> = Vec::new();

    let (snapshot, listeners) = {
      let mut inner = self.lock();
      for alert in batch {
        if inner.seen.insert(alert.id) {
          inner.alerts.push_front(alert.clone());
          fresh.push(alert.clone());
        }
      }
      if fresh.is_empty() {
        return 0;
      }
      if let Some(cap) = self.cap {
        inner.alerts.truncate(cap);
      }
      (snapshot_of(&inner), listeners_of(&inner))
    };

    if let Some(sink) = notifier {
      for alert in &fresh {
        sink.notify(alert);
      }
    }
    for listener in &listeners {
      listener(&snapshot);
    }
    fresh.len()
  }

  // ── Observation ───────────────────────────────────────────────────────────

  /// Register `listener` and synchronously hand it the current feed.
  pub fn observe<F>(&self, listener: F) -> Subscription
  where
    F: Fn(&[Alert]) + Send + Sync + 'static,
  {
    let token = Subscription::next();
    let listener: Listener = Arc::new(listener);
    let snapshot = {
      let mut inner = self.lock();
      inner.listeners.push((token, Arc::clone(&listener)));
      snapshot_of(&inner)
    };
    listener(&snapshot);
    token
  }

  /// Remove a listener. Unknown or already-removed tokens are ignored.
  pub fn unobserve(&self, token: Subscription) {
    self.lock().listeners.retain(|(t, _)| *t != token);
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Current feed, newest arrival first.
  pub fn snapshot(&self) -> Vec<Alert> {
    snapshot_of(&self.lock())
  }

  /// Number of alerts currently visible.
  pub fn len(&self) -> usize {
    self.lock().alerts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl Default for AlertStore {
  fn default() -> Self {
    Self::new()
  }
}

fn snapshot_of(inner: &Inner) -> Vec<Alert> {
  inner.alerts.iter().cloned().collect()
}

fn listeners_of(inner: &Inner) -> Vec<Listener> {
  inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
}
