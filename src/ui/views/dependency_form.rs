use crate::context::AppContext;
use crate::elder::forms::{next_dependency_type, DependencyDraft, DEPENDENCY_TYPES};
use crate::elder::{keys, ElderClient, Resource};
use crate::mutation::{MutationId, MutationOutcome, MutationRequest};
use crate::ui::components::{InputResult, TextInput};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::form::{field_line, input_line, render_form};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Source,
  Target,
  Type,
}

impl Field {
  fn next(self) -> Self {
    match self {
      Field::Source => Field::Target,
      Field::Target => Field::Type,
      Field::Type => Field::Source,
    }
  }

  fn previous(self) -> Self {
    match self {
      Field::Source => Field::Type,
      Field::Target => Field::Source,
      Field::Type => Field::Target,
    }
  }
}

/// Form for linking two entities
pub struct DependencyFormView {
  client: ElderClient,
  source: TextInput,
  target: TextInput,
  dependency_type: &'static str,
  focus: Field,
  error: Option<String>,
  in_flight: Option<MutationId>,
}

impl DependencyFormView {
  pub fn new(ctx: &AppContext) -> Self {
    Self {
      client: ctx.client.clone(),
      source: TextInput::new(),
      target: TextInput::new(),
      dependency_type: DEPENDENCY_TYPES[0],
      focus: Field::Source,
      error: None,
      in_flight: None,
    }
  }

  fn draft(&self) -> DependencyDraft {
    DependencyDraft {
      source: self.source.value().to_string(),
      target: self.target.value().to_string(),
      dependency_type: self.dependency_type.to_string(),
    }
  }

  /// Validate locally, then send. Invalid input never reaches the server.
  fn submit(&mut self, ctx: &mut AppContext) {
    let new = match self.draft().validate() {
      Ok(new) => new,
      Err(e) => {
        self.error = Some(e.to_string());
        return;
      }
    };
    self.error = None;

    let description = format!(
      "dependency #{} -> #{} ({})",
      new.source_entity_id, new.target_entity_id, new.dependency_type
    );
    let request = keys::dependency_create_invalidations().into_iter().fold(
      MutationRequest::create(Resource::Dependencies.tag(), description),
      |req, target| req.invalidates(target),
    );

    let client = self.client.clone();
    match ctx.dispatch(request, async move { client.create_dependency(&new).await }) {
      Ok(id) => self.in_flight = Some(id),
      Err(e) => self.error = Some(e.to_string()),
    }
  }
}

impl View for DependencyFormView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> ViewAction {
    if self.in_flight.is_some() {
      // Wait for the outcome; the request cannot be recalled
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Esc => return ViewAction::Pop,
      KeyCode::Tab | KeyCode::Down => {
        self.focus = self.focus.next();
        return ViewAction::None;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focus = self.focus.previous();
        return ViewAction::None;
      }
      KeyCode::Enter => {
        self.submit(ctx);
        return ViewAction::None;
      }
      _ => {}
    }

    match self.focus {
      Field::Source => {
        if self.source.handle_key(key) == InputResult::Consumed {
          self.error = None;
        }
      }
      Field::Target => {
        if self.target.handle_key(key) == InputResult::Consumed {
          self.error = None;
        }
      }
      Field::Type => {
        if matches!(
          key.code,
          KeyCode::Char(' ') | KeyCode::Right | KeyCode::Left
        ) {
          self.dependency_type = next_dependency_type(self.dependency_type);
          self.error = None;
        }
      }
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, _ctx: &AppContext) {
    let type_value = format!("< {} >", self.dependency_type);
    let lines = vec![
      input_line(
        "Source entity",
        &self.source,
        self.focus == Field::Source,
      ),
      input_line(
        "Target entity",
        &self.target,
        self.focus == Field::Target,
      ),
      field_line("Type", &type_value, self.focus == Field::Type),
    ];
    render_form(
      frame,
      area,
      "New Dependency",
      lines,
      self.error.as_deref(),
      self.in_flight.is_some(),
      "tab: next field  space: change type  enter: create  esc: cancel",
    );
  }

  fn breadcrumb_label(&self) -> String {
    "New Dependency".to_string()
  }

  fn mutation_finished(&mut self, outcome: &MutationOutcome) -> ViewAction {
    if self.in_flight != Some(outcome.id()) {
      return ViewAction::None;
    }
    self.in_flight = None;
    match outcome {
      MutationOutcome::Succeeded { .. } => ViewAction::Pop,
      // Keep the input so it can be corrected
      MutationOutcome::Failed { message, .. } => {
        self.error = Some(message.clone());
        ViewAction::None
      }
    }
  }

  fn captures_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("enter", "create").with_priority(10),
      ShortcutInfo::new("esc", "cancel").with_priority(90),
    ]
  }
}
