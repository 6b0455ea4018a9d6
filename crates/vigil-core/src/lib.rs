//! Core types and observable stores for the vigil telemetry client.
//!
//! This crate is deliberately free of HTTP and terminal dependencies.
//! It holds the wire models the remote service serves, the two
//! in-process stores the UI observes, and the notification seam. All
//! other crates depend on it; it depends on nothing heavier than serde.

pub mod alert;
pub mod command;
pub mod device;
pub mod notify;
pub mod store;
