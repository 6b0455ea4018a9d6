//! Control pane — the room's two override switches.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::App;

/// Render the control tab into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(format!(" {} ", app.room))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let lines = vec![
    Line::from(""),
    switch_row("Water pump", app.displayed.pump_on, app.control_cursor == 0),
    Line::from(""),
    switch_row("Mains power", app.displayed.power_on, app.control_cursor == 1),
    Line::from(""),
    Line::from(Span::styled(
      "  Overrides are sent immediately; the next poll confirms them.",
      Style::default().fg(Color::DarkGray),
    )),
  ];

  f.render_widget(Paragraph::new(lines), inner);
}

fn switch_row(label: &str, on: bool, selected: bool) -> Line<'static> {
  let cursor = if selected { "▸ " } else { "  " };
  let label_style = if selected {
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD)
  } else {
    Style::default()
  };
  let state = if on {
    Span::styled(
      " ON ",
      Style::default()
        .fg(Color::Black)
        .bg(Color::Green)
        .add_modifier(Modifier::BOLD),
    )
  } else {
    Span::styled(
      " OFF ",
      Style::default()
        .fg(Color::White)
        .bg(Color::Red)
        .add_modifier(Modifier::BOLD),
    )
  };

  Line::from(vec![
    Span::raw(format!("  {cursor}")),
    Span::styled(format!("{label:<14}"), label_style),
    state,
  ])
}
