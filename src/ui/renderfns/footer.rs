use crate::notify::{Level, Notification};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the footer bar: view breadcrumb on the left, latest notification
/// on the right
pub fn draw_footer(
  frame: &mut Frame,
  area: Rect,
  breadcrumb: &[String],
  notification: Option<&Notification>,
) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i == breadcrumb.len() - 1 {
      // Current view - highlighted
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };

    spans.push(Span::styled(part.clone(), style));
  }

  let chunks = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
    .split(area);

  frame.render_widget(
    Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black)),
    chunks[0],
  );

  let note = match notification {
    Some(n) => Line::from(Span::styled(
      format!("{} ", n.message),
      Style::default().fg(level_color(n.level)),
    )),
    None => Line::from(""),
  };
  frame.render_widget(
    Paragraph::new(note)
      .alignment(Alignment::Right)
      .style(Style::default().bg(Color::Black)),
    chunks[1],
  );
}

pub fn level_color(level: Level) -> Color {
  match level {
    Level::Info => Color::Cyan,
    Level::Success => Color::Green,
    Level::Error => Color::Red,
  }
}
