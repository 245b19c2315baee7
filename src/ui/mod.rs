pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::context::AppContext;
use components::CommandInput;
use ratatui::prelude::*;
use ratatui::widgets::TableState;
use view::View;

/// Main draw function
pub fn draw(
  frame: &mut Frame,
  ctx: &AppContext,
  views: &mut [Box<dyn View>],
  command: &CommandInput,
) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  let breadcrumb: Vec<String> = views.iter().map(|v| v.breadcrumb_label()).collect();
  let shortcuts = views.last().map(|v| v.shortcuts()).unwrap_or_default();

  renderfns::draw_header(frame, chunks[0], ctx, &shortcuts);

  if let Some(view) = views.last_mut() {
    view.render(frame, chunks[1], ctx);
  }
  command.render_overlay(frame, chunks[1]);

  renderfns::draw_footer(frame, chunks[2], &breadcrumb, ctx.notifications.latest());
}

/// Keep a table selection inside `0..len`, selecting the first row when
/// nothing is selected
pub fn ensure_valid_selection(state: &mut TableState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    Some(i) if i >= len => state.select(Some(len - 1)),
    None => state.select(Some(0)),
    _ => {}
  }
}
