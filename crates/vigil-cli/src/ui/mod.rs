//! TUI rendering — orchestrates all panes.

pub mod alert_feed;
pub mod control;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};

use crate::app::{App, Tab};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  match app.tab {
    Tab::Alerts => alert_feed::draw(f, rows[1], app),
    Tab::Control => control::draw(f, rows[1], app),
  }
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let date = Local::now().format("%Y-%m-%d").to_string();

  let active = Style::default()
    .fg(Color::Black)
    .bg(Color::Cyan)
    .add_modifier(Modifier::BOLD);
  let inactive = Style::default().fg(Color::White);
  let tab_style = |tab: Tab| if app.tab == tab { active } else { inactive };

  let left = vec![
    Span::styled(
      " vigil ",
      Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    Span::styled(" 1 Alerts ", tab_style(Tab::Alerts)),
    Span::raw(" "),
    Span::styled(" 2 Control ", tab_style(Tab::Control)),
  ];
  let right = Span::styled(format!("{date} "), Style::default().fg(Color::Gray));

  // Simple left-right header: pad the middle.
  let left_width: usize = left.iter().map(|s| s.content.len()).sum();
  let pad = area
    .width
    .saturating_sub(left_width as u16)
    .saturating_sub(right.content.len() as u16);

  let mut spans = left;
  spans.push(Span::raw(" ".repeat(pad as usize)));
  spans.push(right);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(Line::from(spans)), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = match app.tab {
    Tab::Alerts => ("ALERTS", "↑↓/jk scroll  g newest  Tab/1/2 tab  q quit"),
    Tab::Control => (
      "CONTROL",
      "↑↓/jk pick  Enter/Space toggle  w water  p power  q quit",
    ),
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(
    format!("  {status}"),
    Style::default().fg(Color::DarkGray),
  );

  let line = Line::from(vec![mode_span, hint_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
