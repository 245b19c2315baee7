use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by search input that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
  /// Enter pressed; an empty term means "back to the listing"
  Submitted(String),
  /// Overlay closed without changing the search
  Cancelled,
}

/// Search prompt opened with `/`
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
  input: TextInput,
  active: bool,
}

impl SearchInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn query(&self) -> &str {
    self.input.value()
  }

  /// Open the prompt pre-filled with the current term
  pub fn activate(&mut self, current: Option<&str>) {
    self.active = true;
    self.input = TextInput::with_value(current.unwrap_or_default());
  }

  /// Handle a key event
  /// Call this regardless of active state - it handles activation too
  pub fn handle_key(&mut self, key: KeyEvent, current: Option<&str>) -> KeyResult<SearchEvent> {
    if !self.active {
      if key.code == KeyCode::Char('/') {
        self.activate(current);
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    // While open, every key belongs to the prompt
    match self.input.handle_key(key) {
      InputResult::Submitted(term) => {
        self.active = false;
        KeyResult::Event(SearchEvent::Submitted(term))
      }
      InputResult::Cancelled => {
        self.active = false;
        KeyResult::Event(SearchEvent::Cancelled)
      }
      InputResult::Consumed | InputResult::NotHandled => KeyResult::Handled,
    }
  }

  /// Render the search overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width.saturating_sub(1), 3);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Search (empty to clear) ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let input_line = Line::from(vec![
      Span::styled("/", Style::default().fg(Color::Yellow)),
      Span::raw(self.input.value()),
      Span::styled("_", Style::default().fg(Color::Yellow)), // Cursor
    ]);
    frame.render_widget(Paragraph::new(input_line), inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_slash_activates() {
    let mut search = SearchInput::new();
    assert_eq!(search.handle_key(key(KeyCode::Char('x')), None), KeyResult::NotHandled);
    assert_eq!(search.handle_key(key(KeyCode::Char('/')), None), KeyResult::Handled);
    assert!(search.is_active());
  }

  #[test]
  fn test_submit_returns_term() {
    let mut search = SearchInput::new();
    search.activate(None);
    search.handle_key(key(KeyCode::Char('d')), None);
    search.handle_key(key(KeyCode::Char('b')), None);
    assert_eq!(
      search.handle_key(key(KeyCode::Enter), None),
      KeyResult::Event(SearchEvent::Submitted("db".into()))
    );
    assert!(!search.is_active());
  }

  #[test]
  fn test_prefilled_with_current_term() {
    let mut search = SearchInput::new();
    search.handle_key(key(KeyCode::Char('/')), Some("web"));
    assert_eq!(search.query(), "web");
    assert_eq!(
      search.handle_key(key(KeyCode::Esc), Some("web")),
      KeyResult::Event(SearchEvent::Cancelled)
    );
  }
}
