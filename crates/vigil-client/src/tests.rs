//! Client and poller tests against an in-process mock of the service.

use std::{
  net::SocketAddr,
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
  time::Duration,
};

use axum::{
  Json, Router,
  extract::{Path, State},
  http::StatusCode,
  routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use vigil_core::{
  alert::Alert,
  command::{OverrideCommand, SwitchAction, Utility},
  device::DeviceStatus,
  notify::NotificationSink,
  store::{AlertStore, DeviceStateStore},
};

use crate::{api::ApiClient, error::Error, poller::Poller};

// ─── Mock service ────────────────────────────────────────────────────────────

/// Shared, mutable fixture state; the test keeps a clone and twiddles
/// it between requests.
#[derive(Clone, Default)]
struct ServiceState {
  alerts:    Arc<Mutex<Vec<Value>>>,
  status:    Arc<Mutex<DeviceStatus>>,
  rooms_hit: Arc<Mutex<Vec<String>>>,
  overrides: Arc<Mutex<Vec<Value>>>,
  broken:    Arc<AtomicBool>,
  garbled:   Arc<AtomicBool>,
}

async fn serve(state: ServiceState) -> SocketAddr {
  let app = Router::new()
    .route("/api/history/alerts", get(alert_history))
    .route("/api/status/{room}", get(room_status))
    .route("/api/control/override", post(control_override))
    .with_state(state);

  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });
  addr
}

async fn alert_history(
  State(state): State<ServiceState>,
) -> Result<Json<Value>, StatusCode> {
  if state.broken.load(Ordering::SeqCst) {
    return Err(StatusCode::INTERNAL_SERVER_ERROR);
  }
  if state.garbled.load(Ordering::SeqCst) {
    return Ok(Json(json!({ "unexpected": "shape" })));
  }
  Ok(Json(Value::Array(state.alerts.lock().unwrap().clone())))
}

async fn room_status(
  State(state): State<ServiceState>,
  Path(room): Path<String>,
) -> Json<DeviceStatus> {
  state.rooms_hit.lock().unwrap().push(room);
  Json(*state.status.lock().unwrap())
}

async fn control_override(
  State(state): State<ServiceState>,
  Json(body): Json<Value>,
) -> Json<Value> {
  state.overrides.lock().unwrap().push(body);
  Json(json!({ "message": "Override accepted" }))
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn wire_alert(id: i64) -> Value {
  json!({
    "id": id,
    "time": "2025-03-14T09:26:53.589793",
    "type": "CRITICAL_LEAK",
    "message": format!("leak {id}"),
  })
}

fn client_for(addr: SocketAddr) -> ApiClient {
  ApiClient::new(format!("http://{addr}")).unwrap()
}

fn poller_for(
  addr: SocketAddr,
  alerts: &Arc<AlertStore>,
  devices: &Arc<DeviceStateStore>,
  notifier: Option<Arc<dyn NotificationSink>>,
) -> Poller {
  Poller::new(
    client_for(addr),
    "Demo Room A",
    Duration::from_millis(3000),
    Arc::clone(alerts),
    Arc::clone(devices),
    notifier,
  )
}

/// Sink that records the id of every alert it is asked to announce.
#[derive(Default)]
struct RecordingSink {
  announced: Mutex<Vec<i64>>,
}

impl RecordingSink {
  fn ids(&self) -> Vec<i64> {
    self.announced.lock().unwrap().clone()
  }
}

impl NotificationSink for RecordingSink {
  fn notify(&self, alert: &Alert) {
    self.announced.lock().unwrap().push(alert.id);
  }
}

// ─── ApiClient ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn alert_history_decodes_wire_list() {
  let state = ServiceState::default();
  state
    .alerts
    .lock()
    .unwrap()
    .extend([wire_alert(1), wire_alert(2)]);
  let addr = serve(state).await;

  let fetched = client_for(addr).alert_history().await.unwrap();
  assert_eq!(fetched.len(), 2);
  assert_eq!(fetched[0].id, 1);
  assert_eq!(fetched[0].kind, "CRITICAL_LEAK");
  assert_eq!(fetched[0].message, "leak 1");
}

#[tokio::test]
async fn room_status_percent_encodes_the_room() {
  let state = ServiceState::default();
  state.status.lock().unwrap().pump_on = true;
  let rooms = Arc::clone(&state.rooms_hit);
  let addr = serve(state).await;

  let status = client_for(addr).room_status("Demo Room A").await.unwrap();
  assert!(status.pump_on);
  assert!(!status.power_on);
  // A raw space would never have survived the request line.
  assert_eq!(*rooms.lock().unwrap(), vec!["Demo Room A".to_string()]);
}

#[tokio::test]
async fn send_override_posts_exact_wire_body() {
  let state = ServiceState::default();
  let sent = Arc::clone(&state.overrides);
  let addr = serve(state).await;

  let command = OverrideCommand {
    user:    "Resident".to_string(),
    utility: Utility::Water,
    action:  SwitchAction::On,
    room_id: "Demo Room A".to_string(),
  };
  client_for(addr).send_override(&command).await.unwrap();

  let sent = sent.lock().unwrap();
  assert_eq!(sent.len(), 1);
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
async fn non_success_maps_to_status_error() {
  let state = ServiceState::default();
  state.broken.store(true, Ordering::SeqCst);
  let addr = serve(state).await;

  let err = client_for(addr).alert_history().await.unwrap_err();
  match err {
    Error::Status { method, status, .. } => {
      assert_eq!(method, "GET");
      assert_eq!(status.as_u16(), 500);
    }
    other => panic!("expected status error, got {other:?}"),
  }
}

#[tokio::test]
async fn malformed_body_maps_to_decode_error() {
  let state = ServiceState::default();
  state.garbled.store(true, Ordering::SeqCst);
  let addr = serve(state).await;

  let err = client_for(addr).alert_history().await.unwrap_err();
  assert!(matches!(err, Error::Decode { .. }), "got {err:?}");
}

#[tokio::test]
async fn connection_refused_maps_to_transport_error() {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);

  let err = client_for(addr).alert_history().await.unwrap_err();
  assert!(matches!(err, Error::Transport(_)), "got {err:?}");
}

// ─── Poller ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn replayed_history_yields_one_fresh_alert_per_poll() {
  let state = ServiceState::default();
  state.alerts.lock().unwrap().push(wire_alert(1));
  let addr = serve(state.clone()).await;

  let alerts = Arc::new(AlertStore::new());
  let devices = Arc::new(DeviceStateStore::new());
  let sink = Arc::new(RecordingSink::default());
  let notifier: Option<Arc<dyn NotificationSink>> = Some(sink.clone());
  let poller = poller_for(addr, &alerts, &devices, notifier);

  let events = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&events);
  alerts.observe(move |_| {
    counter.fetch_add(1, Ordering::SeqCst);
  });

  poller.poll_once().await;
  assert_eq!(alerts.len(), 1);
  // Registration call plus the first changed batch.
  assert_eq!(events.load(Ordering::SeqCst), 2);
  assert_eq!(sink.ids(), vec![1]);

  // The service replays its whole history; only the new id lands.
  state.alerts.lock().unwrap().push(wire_alert(2));
  poller.poll_once().await;

  let ids: Vec<i64> = alerts.snapshot().iter().map(|a| a.id).collect();
  assert_eq!(ids, vec![2, 1]);
  assert_eq!(events.load(Ordering::SeqCst), 3);
  assert_eq!(sink.ids(), vec![1, 2]);
}

#[tokio::test]
async fn device_flip_notifies_exactly_once() {
  let state = ServiceState::default();
  let addr = serve(state.clone()).await;

  let alerts = Arc::new(AlertStore::new());
  let devices = Arc::new(DeviceStateStore::new());
  let poller = poller_for(addr, &alerts, &devices, None);

  let events = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&events);
  devices.observe(move |_| {
    counter.fetch_add(1, Ordering::SeqCst);
  });

  // First round reports the same all-off snapshot the store starts with.
  poller.poll_once().await;
  assert_eq!(events.load(Ordering::SeqCst), 1);

  state.status.lock().unwrap().pump_on = true;
  poller.poll_once().await;
  poller.poll_once().await;
  assert_eq!(events.load(Ordering::SeqCst), 2);
  assert!(devices.status().pump_on);
}

#[tokio::test]
async fn poller_survives_a_failing_tick() {
  let state = ServiceState::default();
  state.alerts.lock().unwrap().push(wire_alert(1));
  state.broken.store(true, Ordering::SeqCst);
  let addr = serve(state.clone()).await;

  let alerts = Arc::new(AlertStore::new());
  let devices = Arc::new(DeviceStateStore::new());
  let poller = poller_for(addr, &alerts, &devices, None);

  poller.poll_once().await;
  assert!(alerts.is_empty());

  state.broken.store(false, Ordering::SeqCst);
  poller.poll_once().await;
  assert_eq!(alerts.len(), 1);
}

#[tokio::test]
async fn spawned_loop_polls_until_shutdown() {
  let state = ServiceState::default();
  state.alerts.lock().unwrap().push(wire_alert(1));
  let addr = serve(state.clone()).await;

  let alerts = Arc::new(AlertStore::new());
  let devices = Arc::new(DeviceStateStore::new());
  let handle = Poller::new(
    client_for(addr),
    "Demo Room A",
    Duration::from_millis(20),
    Arc::clone(&alerts),
    Arc::clone(&devices),
    None,
  )
  .spawn();

  for _ in 0..50 {
    if !alerts.is_empty() {
      break;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
  }
  assert_eq!(alerts.len(), 1);

  handle.shutdown();
  tokio::time::sleep(Duration::from_millis(50)).await;
  state.alerts.lock().unwrap().push(wire_alert(2));
  tokio::time::sleep(Duration::from_millis(100)).await;
  assert_eq!(alerts.len(), 1, "poller kept fetching after shutdown");
}

#[tokio::test]
async fn zero_period_is_clamped_and_still_polls() {
  let state = ServiceState::default();
  state.alerts.lock().unwrap().push(wire_alert(1));
  let addr = serve(state).await;

  let alerts = Arc::new(AlertStore::new());
  let devices = Arc::new(DeviceStateStore::new());
  let handle = Poller::new(
    client_for(addr),
    "Demo Room A",
    Duration::ZERO,
    Arc::clone(&alerts),
    Arc::clone(&devices),
    None,
  )
  .spawn();

  // The clamped loop keeps running instead of panicking in the task.
  for _ in 0..50 {
    if !alerts.is_empty() {
      break;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
  }
  assert_eq!(alerts.len(), 1);

  handle.shutdown();
}
