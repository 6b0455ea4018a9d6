//! Alert feed pane — one card per alert, newest first.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use vigil_core::alert::{Alert, Severity};

use crate::app::App;

/// Render the alert feed into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(format!(" Alerts ({}) ", app.alerts.len()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  if app.alerts.is_empty() {
    f.render_widget(
      Paragraph::new("No alerts yet; the feed fills in as the service reports.")
        .style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  let items: Vec<ListItem> = app.alerts.iter().map(card).collect();

  let mut state = ListState::default();
  state.select(Some(app.feed_cursor));

  f.render_stateful_widget(
    List::new(items).highlight_style(Style::default().bg(Color::Blue)),
    inner,
    &mut state,
  );
}

/// Three-line card: time + category, message, annotations.
fn card(alert: &Alert) -> ListItem<'static> {
  let color = severity_color(alert.severity());

  let head = Line::from(vec![
    Span::styled(alert.display_time(), Style::default().fg(Color::DarkGray)),
    Span::raw("  "),
    Span::styled(
      alert.display_kind(),
      Style::default().fg(color).add_modifier(Modifier::BOLD),
    ),
  ]);
  let message = Line::from(format!("  {}", alert.message));
  let annotations = Line::from(Span::styled(
    format!("  {}", annotation_line(alert)),
    Style::default().fg(Color::DarkGray),
  ));

  ListItem::new(vec![head, message, annotations, Line::from("")])
}

fn severity_color(severity: Severity) -> Color {
  match severity {
    Severity::Critical => Color::Red,
    Severity::Warning => Color::Yellow,
    Severity::Info => Color::Green,
  }
}

/// Wastage / savings / confidence / taken action, with `—` standing in
/// for whatever the service left out.
fn annotation_line(alert: &Alert) -> String {
  let field = |value: &Option<String>| {
    value.clone().unwrap_or_else(|| "—".to_string())
  };
  let taken = alert
    .action
    .clone()
    .or_else(|| alert.status.clone())
    .unwrap_or_else(|| "—".to_string());

  format!(
    "Wastage {}  Savings {}  Confidence {}  {}",
    field(&alert.probable_wastage),
    field(&alert.estimated_savings),
    field(&alert.probability_score),
    taken,
  )
}
