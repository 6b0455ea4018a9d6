//! Alert — the discrete event record produced by the telemetry service.
//!
//! Field names mirror the service's JSON exactly. Alerts are immutable
//! once fetched; the `id` is the sole deduplication key, nothing else
//! about an alert is ever compared.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The timestamp shape the service emits, e.g. `2025-03-14T09:26:53.589793`.
const SERVICE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

// ─── Severity ────────────────────────────────────────────────────────────────

/// Coarse classification derived from the alert category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
  /// Category contains `CRITICAL` — burst pipes, major leaks.
  Critical,
  /// Category contains `ENERGY` — waste findings.
  Warning,
  /// Everything else, including manual-override receipts.
  Info,
}

// ─── Alert ───────────────────────────────────────────────────────────────────

/// A detected utility anomaly, as served by `GET /api/history/alerts`.
///
/// The annotation fields are optional because older alerts in the
/// service's history omit them entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
  /// Service-assigned identifier, unique per alert.
  pub id:                i64,
  /// Source-formatted timestamp; see [`Alert::display_time`].
  pub time:              String,
  /// Category label, e.g. `CRITICAL_LEAK`, `ENERGY_WASTE`, `MANUAL_OVERRIDE`.
  #[serde(rename = "type")]
  pub kind:              String,
  pub message:           String,
  pub probable_wastage:  Option<String>,
  pub estimated_savings: Option<String>,
  /// Detector confidence, pre-rendered by the service (e.g. `87.5%`).
  pub probability_score: Option<String>,
  /// What the service did about it (e.g. `AUTO_CUTOFF (Solenoid Valve)`).
  pub action:            Option<String>,
  pub status:            Option<String>,
}

impl Alert {
  /// Severity bucket for this alert's category.
  pub fn severity(&self) -> Severity {
    if self.kind.contains("CRITICAL") {
      Severity::Critical
    } else if self.kind.contains("ENERGY") {
      Severity::Warning
    } else {
      Severity::Info
    }
  }

  /// The category with underscores replaced, for human-facing surfaces.
  pub fn display_kind(&self) -> String {
    self.kind.replace('_', " ")
  }

  /// The `time` field rendered as a 12-hour clock time (`09:26 AM`).
  ///
  /// Anything that fails to parse is returned raw rather than dropped —
  /// the feed must never lose an alert to a timestamp quirk.
  pub fn display_time(&self) -> String {
    match NaiveDateTime::parse_from_str(&self.time, SERVICE_TIME_FORMAT) {
      Ok(dt) => dt.format("%I:%M %p").to_string(),
      Err(_) => self.time.clone(),
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
