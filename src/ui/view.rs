use crate::context::AppContext;
use crate::mutation::MutationOutcome;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// Actions that a view can request in response to user input
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
}

/// Trait for view behavior
///
/// Views handle their own input modes (search, confirm, form fields) and
/// return actions for the App to execute: App → View → Components.
///
/// Views that show server data own `QueryObserver`s and sync them against
/// the shared store in `tick()`.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &AppContext);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Called on each tick while this view is on top of the stack
  fn tick(&mut self, _ctx: &mut AppContext) {}

  /// Called for every mutation that finished while this view was on top
  fn mutation_finished(&mut self, _outcome: &MutationOutcome) -> ViewAction {
    ViewAction::None
  }

  /// Called when the view leaves the stack; drop interest in its fetches
  fn unmount(&mut self, _ctx: &mut AppContext) {}

  /// True while a text prompt or dialog owns the keyboard, so global keys
  /// like `:` and `q` go to the view instead
  fn captures_input(&self) -> bool {
    false
  }

  /// Get keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
