//! Error types for `vigil-client`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The request never produced an HTTP response (refused connection,
  /// timeout, interrupted transfer).
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  /// The service answered, but not with success.
  #[error("{method} {path} → {status}")]
  Status {
    method: &'static str,
    path:   String,
    status: reqwest::StatusCode,
  },

  /// The response body was not the JSON shape this client expects.
  #[error("decoding {path}: {source}")]
  Decode {
    path:   String,
    #[source]
    source: serde_json::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
