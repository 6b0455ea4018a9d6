//! Observable in-process state shared between the poll loop and the UI.
//!
//! Both stores follow the same discipline: mutation happens behind a
//! mutex, observers are plain closures registered with `observe` and
//! removed with the returned [`Subscription`] token, and every listener
//! is invoked once synchronously at registration so a late subscriber
//! starts from current state. Listeners always run after the lock has
//! been released, so a listener may re-enter `observe`, `unobserve`, or
//! any read without deadlocking.

mod alert;
mod device;

pub use alert::AlertStore;
pub use device::DeviceStateStore;


use std::sync::atomic::{AtomicU64, Ordering};

// ─── Subscription ────────────────────────────────────────────────────────────

/// Unregister token returned by `observe`.
///
/// Tokens are unique across every store in the process, so handing one
/// to the wrong store is a silent no-op rather than a misfire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

impl Subscription {
  pub(crate) fn next() -> Self {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    Self(NEXT.fetch_add(1, Ordering::Relaxed))
  }
}
