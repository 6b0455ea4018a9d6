//! Async HTTP client wrapping the telemetry service's JSON API.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use vigil_core::{alert::Alert, command::OverrideCommand, device::DeviceStatus};

use crate::error::{Error, Result};

/// Async HTTP client for the telemetry service's JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

impl ApiClient {
  /// Client against `base_url` (scheme + host + port, no trailing path).
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(10))
      .build()?;
    Ok(Self {
      client,
      base_url: base_url.into(),
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  /// Success check plus decode, split into distinct error cases so
  /// callers can tell a refusing service from a misshapen reply.
  async fn read_json<T: DeserializeOwned>(
    &self,
    method: &'static str,
    path: &str,
    resp: reqwest::Response,
  ) -> Result<T> {
    if !resp.status().is_success() {
      return Err(Error::Status {
        method,
        path:   path.to_string(),
        status: resp.status(),
      });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|source| Error::Decode {
      path: path.to_string(),
      source,
    })
  }

  // ── Telemetry ─────────────────────────────────────────────────────────────

  /// `GET /api/history/alerts` — the service's full alert history,
  /// oldest first as the service stores it.
  pub async fn alert_history(&self) -> Result<Vec<Alert>> {
    let path = "/history/alerts";
    let resp = self.client.get(self.url(path)).send().await?;
    self.read_json("GET", path, resp).await
  }

  /// `GET /api/status/{room}` — current pump/mains flags for a room.
  /// Room ids carry spaces, so the path segment is percent-encoded.
  pub async fn room_status(&self, room: &str) -> Result<DeviceStatus> {
    let path = format!("/status/{}", urlencoding::encode(room));
    let resp = self.client.get(self.url(&path)).send().await?;
    self.read_json("GET", &path, resp).await
  }

  // ── Control ───────────────────────────────────────────────────────────────

  /// `POST /api/control/override` — force a utility on or off.
  ///
  /// The service replies with a free-form receipt; only the status code
  /// is inspected.
  pub async fn send_override(&self, command: &OverrideCommand) -> Result<()> {
    let path = "/control/override";
    let resp = self
      .client
      .post(self.url(path))
      .json(command)
      .send()
      .await?;
    if !resp.status().is_success() {
      return Err(Error::Status {
        method: "POST",
        path:   path.to_string(),
        status: resp.status(),
      });
    }
    Ok(())
  }
}
