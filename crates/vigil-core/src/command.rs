//! Override command — the outbound "force this utility on/off" request.
//!
//! Constructed per user interaction, sent once via
//! `POST /api/control/override`, never retained.

use serde::{Deserialize, Serialize};

// ─── Utility ─────────────────────────────────────────────────────────────────

/// The controllable utility a command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Utility {
  Water,
  Power,
}

impl Utility {
  /// Human-facing label for status messages and switch rows.
  pub fn label(&self) -> &'static str {
    match self {
      Self::Water => "Water",
      Self::Power => "Power",
    }
  }
}

// ─── SwitchAction ────────────────────────────────────────────────────────────

/// Desired end-state for a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SwitchAction {
  On,
  Off,
}

impl SwitchAction {
  pub fn label(&self) -> &'static str {
    match self {
      Self::On => "ON",
      Self::Off => "OFF",
    }
  }
}

impl From<bool> for SwitchAction {
  fn from(on: bool) -> Self {
    if on { Self::On } else { Self::Off }
  }
}

// ─── OverrideCommand ─────────────────────────────────────────────────────────

/// A user-issued instruction to force a utility to a given state,
/// bypassing whatever the service's automatic control would do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideCommand {
  /// Actor label, e.g. `Resident` or `Admin`.
  pub user:    String,
  pub utility: Utility,
  pub action:  SwitchAction,
  pub room_id: String,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
