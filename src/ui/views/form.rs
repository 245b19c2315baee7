//! Shared layout for the modal forms.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::ui::components::TextInput;

/// One labelled input row; the focused row shows a cursor
pub fn field_line<'a>(label: &'a str, value: &'a str, focused: bool) -> Line<'a> {
  let label_style = if focused {
    Style::default().fg(Color::Yellow).bold()
  } else {
    Style::default().fg(Color::White)
  };
  let mut spans = vec![
    Span::styled(format!("{:>16}: ", label), label_style),
    Span::raw(value),
  ];
  if focused {
    spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
  }
  Line::from(spans)
}

pub fn input_line<'a>(label: &'a str, input: &'a TextInput, focused: bool) -> Line<'a> {
  field_line(label, input.value(), focused)
}

/// Render a centered form body with an error line and key help
pub fn render_form(
  frame: &mut Frame,
  area: Rect,
  title: &str,
  mut lines: Vec<Line>,
  error: Option<&str>,
  busy: bool,
  help: &str,
) {
  let width = 64.min(area.width);
  let height = (lines.len() as u16 + 6).min(area.height);
  let x = area.x + area.width.saturating_sub(width) / 2;
  let y = area.y + area.height.saturating_sub(height) / 2;
  let form_area = Rect::new(x, y, width, height);

  frame.render_widget(Clear, form_area);

  lines.push(Line::from(""));
  match (busy, error) {
    (true, _) => lines.push(Line::styled(
      "Submitting...",
      Style::default().fg(Color::Yellow),
    )),
    (false, Some(err)) => lines.push(Line::styled(
      err.to_string(),
      Style::default().fg(Color::Red),
    )),
    (false, None) => lines.push(Line::from("")),
  }
  lines.push(Line::styled(
    help.to_string(),
    Style::default().fg(Color::DarkGray),
  ));

  let block = Block::default()
    .title(format!(" {} ", title))
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Yellow));

  frame.render_widget(
    Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
    form_area,
  );
}
