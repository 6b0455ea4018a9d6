//! Device status — the pump/mains snapshot for one monitored room.

use serde::{Deserialize, Serialize};

/// On/off state of the two controllable utilities in a room, as served
/// by `GET /api/status/{room}`. The all-off value doubles as the state
/// a fresh store starts from.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct DeviceStatus {
  pub pump_on:  bool,
  pub power_on: bool,
}
