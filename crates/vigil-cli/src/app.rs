//! Application state machine and event dispatcher.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use vigil_client::api::ApiClient;
use vigil_core::{
  alert::Alert,
  command::{OverrideCommand, SwitchAction, Utility},
  device::DeviceStatus,
  store::{AlertStore, DeviceStateStore, Subscription},
};

/// Rows on the control tab: water pump, mains power.
const SWITCH_ROWS: usize = 2;

// ─── Tab ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
  /// The alert feed, newest first.
  Alerts,
  /// The two override switches for the room.
  Control,
}

impl Tab {
  pub fn other(self) -> Self {
    match self {
      Self::Alerts => Self::Control,
      Self::Control => Self::Alerts,
    }
  }
}

// ─── Store events ─────────────────────────────────────────────────────────────

/// What the store listeners push at the event loop. Snapshots are
/// queued here and drained on the UI side before each frame.
enum StoreEvent {
  Feed(Vec<Alert>),
  Devices(DeviceStatus),
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  /// Active tab / keyboard focus.
  pub tab: Tab,

  /// Latest alert feed snapshot, newest arrival first.
  pub alerts: Vec<Alert>,

  /// Cursor position within the feed.
  pub feed_cursor: usize,

  /// Switch states as shown. Flipped optimistically when an override
  /// is sent; overwritten whenever a poll observes a change.
  pub displayed: DeviceStatus,

  /// Cursor row on the control tab (0 = water, 1 = power).
  pub control_cursor: usize,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Room whose devices this client watches and controls.
  pub room: String,

  /// Actor label stamped into outgoing override commands.
  pub user: String,

  /// Shared HTTP client.
  pub client: Arc<ApiClient>,

  events:       UnboundedReceiver<StoreEvent>,
  alert_store:  Arc<AlertStore>,
  device_store: Arc<DeviceStateStore>,
  tokens:       Vec<Subscription>,
}

impl App {
  /// Create an [`App`] subscribed to both stores. The registration-time
  /// listener calls deliver the initial snapshots through the channel,
  /// so the first [`App::drain_events`] populates the view.
  pub fn new(
    client: ApiClient,
    room: impl Into<String>,
    user: impl Into<String>,
    alerts: Arc<AlertStore>,
    devices: Arc<DeviceStateStore>,
  ) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    let feed_tx = tx.clone();
    let feed_token = alerts.observe(move |feed| {
      let _ = feed_tx.send(StoreEvent::Feed(feed.to_vec()));
    });
    let device_token = devices.observe(move |status| {
      let _ = tx.send(StoreEvent::Devices(status));
    });

    Self {
      tab: Tab::Alerts,
      alerts: Vec::new(),
      feed_cursor: 0,
      displayed: DeviceStatus::default(),
      control_cursor: 0,
      status_msg: String::new(),
      room: room.into(),
      user: user.into(),
      client: Arc::new(client),
      events: rx,
      alert_store: alerts,
      device_store: devices,
      tokens: vec![feed_token, device_token],
    }
  }

  // ── Store events ──────────────────────────────────────────────────────────

  /// Apply every store snapshot queued since the last frame.
  pub fn drain_events(&mut self) {
    while let Ok(event) = self.events.try_recv() {
      match event {
        StoreEvent::Feed(feed) => {
          self.alerts = feed;
          if self.feed_cursor >= self.alerts.len() {
            self.feed_cursor = self.alerts.len().saturating_sub(1);
          }
        }
        StoreEvent::Devices(status) => {
          // Poll results are authoritative; they overwrite whatever
          // optimistic flip is still showing.
          self.displayed = status;
        }
      }
    }
  }

  /// Drop the store subscriptions so no listener outlives the UI.
  /// Tokens are process-unique, so offering each to both stores is
  /// harmless.
  pub fn unsubscribe(&mut self) {
    for token in self.tokens.drain(..) {
      self.alert_store.unobserve(token);
      self.device_store.unobserve(token);
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> bool {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Tab => self.tab = self.tab.other(),
      KeyCode::Char('1') => self.tab = Tab::Alerts,
      KeyCode::Char('2') => self.tab = Tab::Control,
      _ => match self.tab {
        Tab::Alerts => self.handle_feed_key(key),
        Tab::Control => self.handle_control_key(key).await,
      },
    }
    true
  }

  fn handle_feed_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Down | KeyCode::Char('j') => {
        if self.feed_cursor + 1 < self.alerts.len() {
          self.feed_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        if self.feed_cursor > 0 {
          self.feed_cursor -= 1;
        }
      }
      // Jump back to the newest alert.
      KeyCode::Home | KeyCode::Char('g') => self.feed_cursor = 0,
      _ => {}
    }
  }

  async fn handle_control_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Down | KeyCode::Char('j') => {
        if self.control_cursor + 1 < SWITCH_ROWS {
          self.control_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        if self.control_cursor > 0 {
          self.control_cursor -= 1;
        }
      }
      KeyCode::Enter | KeyCode::Char(' ') => {
        let utility = if self.control_cursor == 0 {
          Utility::Water
        } else {
          Utility::Power
        };
        self.toggle(utility).await;
      }
      KeyCode::Char('w') => self.toggle(Utility::Water).await,
      KeyCode::Char('p') => self.toggle(Utility::Power).await,
      _ => {}
    }
  }

  // ── Command dispatch ──────────────────────────────────────────────────────

  /// Send an override flipping `utility` away from its displayed state.
  ///
  /// The switch is updated optimistically before the reply lands; on
  /// failure the flip is reverted and the error shown in the status
  /// bar. The stores are never written from here — the poll loop stays
  /// the only writer.
  async fn toggle(&mut self, utility: Utility) {
    let requested = match utility {
      Utility::Water => !self.displayed.pump_on,
      Utility::Power => !self.displayed.power_on,
    };
    let action = SwitchAction::from(requested);

    self.set_displayed(utility, requested);
    self.status_msg = format!("{} {}…", utility.label(), action.label());

    let command = OverrideCommand {
      user:    self.user.clone(),
      utility,
      action,
      room_id: self.room.clone(),
    };
    match self.client.send_override(&command).await {
      Ok(()) => {
        self.status_msg = format!("{} forced {}", utility.label(), action.label());
        tracing::info!(
          utility = utility.label(),
          action = action.label(),
          room = %self.room,
          "override sent"
        );
      }
      Err(error) => {
        self.set_displayed(utility, !requested);
        self.status_msg = format!("Override failed: {error}");
        tracing::warn!(%error, "override failed");
      }
    }
  }

  fn set_displayed(&mut self, utility: Utility, on: bool) {
    match utility {
      Utility::Water => self.displayed.pump_on = on,
      Utility::Power => self.displayed.power_on = on,
    }
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::net::SocketAddr;

  use axum::{Json, Router, http::StatusCode, routing::post};
  use serde_json::{Value, json};
  use tokio::net::TcpListener;

  use super::*;

  /// Mock that records override bodies and answers with `status`.
  async fn serve_override(
    status: StatusCode,
  ) -> (SocketAddr, Arc<std::sync::Mutex<Vec<Value>>>) {
    let sent: Arc<std::sync::Mutex<Vec<Value>>> = Arc::default();
    let recorded = Arc::clone(&sent);
    let router = Router::new().route(
      "/api/control/override",
      post(move |Json(body): Json<Value>| {
        let recorded = Arc::clone(&recorded);
        async move {
          recorded.lock().unwrap().push(body);
          (status, Json(json!({ "message": "Override received" })))
        }
      }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, router).await.unwrap();
    });
    (addr, sent)
  }

  fn app_for(addr: SocketAddr) -> App {
    let client = ApiClient::new(format!("http://{addr}")).unwrap();
    App::new(
      client,
      "Demo Room A",
      "Resident",
      Arc::new(AlertStore::new()),
      Arc::new(DeviceStateStore::new()),
    )
  }

  fn alert(id: i64) -> Alert {
    Alert {
      id,
      time: "2025-03-14T09:26:53.589793".to_string(),
      kind: "ENERGY_WASTE".to_string(),
      message: format!("alert {id}"),
      probable_wastage: None,
      estimated_savings: None,
      probability_score: None,
      action: None,
      status: None,
    }
  }

  #[tokio::test]
  async fn toggle_sends_command_and_keeps_optimistic_state() {
    let (addr, sent) = serve_override(StatusCode::OK).await;
    let mut app = app_for(addr);

    app.toggle(Utility::Water).await;

    assert!(app.displayed.pump_on);
    assert_eq!(app.status_msg, "Water forced ON");
    let sent = sent.lock().unwrap();
    assert_eq!(
      sent[0],
      json!({
        "user": "Resident",
        "utility": "WATER",
        "action": "ON",
        "room_id": "Demo Room A",
      })
    );
  }

  #[tokio::test]
  async fn failed_toggle_reverts_the_optimistic_flip() {
    let (addr, _sent) = serve_override(StatusCode::INTERNAL_SERVER_ERROR).await;
    let mut app = app_for(addr);

    app.toggle(Utility::Power).await;

    assert!(!app.displayed.power_on);
    assert!(
      app.status_msg.starts_with("Override failed"),
      "status: {}",
      app.status_msg
    );
  }

  #[tokio::test]
  async fn store_updates_reach_the_app_through_the_channel() {
    let alerts = Arc::new(AlertStore::new());
    let devices = Arc::new(DeviceStateStore::new());
    let client = ApiClient::new("http://127.0.0.1:9").unwrap();
    let mut app = App::new(
      client,
      "Demo Room A",
      "Resident",
      Arc::clone(&alerts),
      Arc::clone(&devices),
    );

    alerts.update(&[alert(1), alert(2)], None);
    devices.update(DeviceStatus {
      pump_on:  true,
      power_on: false,
    });
    app.drain_events();

    let ids: Vec<i64> = app.alerts.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![2, 1]);
    assert!(app.displayed.pump_on);

    // After unsubscribing, further store changes stay out of the app.
    app.unsubscribe();
    alerts.update(&[alert(3)], None);
    app.drain_events();
    assert_eq!(app.alerts.len(), 2);
  }
}
