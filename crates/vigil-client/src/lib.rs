//! Async client for the room-telemetry service.
//!
//! [`api::ApiClient`] wraps the service's three JSON endpoints;
//! [`poller::Poller`] is the fixed-interval loop that keeps a process's
//! stores fed from them.

pub mod api;
pub mod error;
pub mod poller;

#[cfg(test)]
mod tests;
