use chrono::{Duration, Utc};

use crate::context::AppContext;
use crate::elder::export::{export_date, export_file_name, save_audit_export};
use crate::elder::forms::AuditExportDraft;
use crate::elder::{ElderClient, Resource};
use crate::mutation::{MutationId, MutationOutcome, MutationRequest};
use crate::ui::components::{InputResult, TextInput};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::form::{field_line, input_line, render_form};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;

/// Export a date range of the audit log to a JSON file
pub struct AuditExportView {
  client: ElderClient,
  start: TextInput,
  end: TextInput,
  /// true = end date field focused
  on_end: bool,
  error: Option<String>,
  in_flight: Option<MutationId>,
  export_dir: std::path::PathBuf,
}

impl AuditExportView {
  pub fn new(ctx: &AppContext) -> Self {
    let today = Utc::now().date_naive();
    let month_ago = today - Duration::days(30);
    Self {
      client: ctx.client.clone(),
      start: TextInput::with_value(month_ago.format("%Y-%m-%d").to_string()),
      end: TextInput::with_value(today.format("%Y-%m-%d").to_string()),
      on_end: false,
      error: None,
      in_flight: None,
      export_dir: ctx.config.export_dir(),
    }
  }

  fn submit(&mut self, ctx: &mut AppContext) {
    let draft = AuditExportDraft {
      start_date: self.start.value().to_string(),
      end_date: self.end.value().to_string(),
    };
    let request_body = match draft.validate() {
      Ok(body) => body,
      Err(e) => {
        self.error = Some(e.to_string());
        return;
      }
    };
    self.error = None;

    let date = export_date(Utc::now());
    let dir = self.export_dir.clone();
    let path = dir.join(export_file_name(date));
    let request = MutationRequest::run(
      Resource::AuditLogs.tag(),
      format!(
        "audit export {} to {}",
        request_body.start_date, request_body.end_date
      ),
    )
    .with_success_message(format!("Exported audit logs to {}", path.display()));

    let client = self.client.clone();
    let future = async move {
      let document = client
        .export_audit_logs(&request_body)
        .await
        .map_err(|e| e.to_string())?;
      save_audit_export(dir, document, date)
        .await
        .map_err(|e| e.to_string())
    };

    match ctx.dispatch(request, future) {
      Ok(id) => self.in_flight = Some(id),
      Err(e) => self.error = Some(e.to_string()),
    }
  }
}

impl View for AuditExportView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> ViewAction {
    if self.in_flight.is_some() {
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Esc => ViewAction::Pop,
      KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
        self.on_end = !self.on_end;
        ViewAction::None
      }
      KeyCode::Enter => {
        self.submit(ctx);
        ViewAction::None
      }
      _ => {
        let input = if self.on_end {
          &mut self.end
        } else {
          &mut self.start
        };
        if input.handle_key(key) == InputResult::Consumed {
          self.error = None;
        }
        ViewAction::None
      }
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, _ctx: &AppContext) {
    let dir = self.export_dir.display().to_string();
    let lines = vec![
      input_line("Start date", &self.start, !self.on_end),
      input_line("End date", &self.end, self.on_end),
      field_line("Format", "json", false),
      field_line("Directory", &dir, false),
    ];
    render_form(
      frame,
      area,
      "Export Audit Logs",
      lines,
      self.error.as_deref(),
      self.in_flight.is_some(),
      "dates as YYYY-MM-DD  tab: switch field  enter: export  esc: cancel",
    );
  }

  fn breadcrumb_label(&self) -> String {
    "Export".to_string()
  }

  fn mutation_finished(&mut self, outcome: &MutationOutcome) -> ViewAction {
    if self.in_flight != Some(outcome.id()) {
      return ViewAction::None;
    }
    self.in_flight = None;
    match outcome {
      MutationOutcome::Succeeded { .. } => ViewAction::Pop,
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
      ShortcutInfo::new("enter", "export").with_priority(10),
      ShortcutInfo::new("esc", "cancel").with_priority(90),
    ]
  }
}
