use crate::context::AppContext;
use crate::elder::api_types::LogsResponse;
use crate::elder::{keys, ElderClient};
use crate::filter::SearchState;
use crate::query::{QueryObserver, QuerySnapshot};
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::renderfns::status_color;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Lines requested from the server per fetch
const TAIL_LINES: u32 = 200;

/// Server log tail with search
pub struct LogsView {
  client: ElderClient,
  tail: QueryObserver<LogsResponse>,
  matches: QueryObserver<LogsResponse>,
  search: SearchState,
  search_input: SearchInput,
  scroll: u16,
}

impl LogsView {
  pub fn new(ctx: &AppContext) -> Self {
    let client = ctx.client.clone();
    // Auto-refresh only applies to the tail; search results stay put
    let c = client.clone();
    let tail = QueryObserver::new(keys::logs_key(TAIL_LINES), move || {
      let c = c.clone();
      async move { c.logs(TAIL_LINES).await }
    })
    .with_refetch_interval(ctx.config.refresh_interval());

    let c = client.clone();
    let matches = QueryObserver::new(keys::logs_search_key("", TAIL_LINES), move || {
      let c = c.clone();
      async move { c.search_logs("", TAIL_LINES).await }
    })
    .disabled();

    Self {
      client,
      tail,
      matches,
      search: SearchState::new(),
      search_input: SearchInput::new(),
      scroll: 0,
    }
  }

  fn active(&self) -> &QueryObserver<LogsResponse> {
    if self.search.is_searching() {
      &self.matches
    } else {
      &self.tail
    }
  }

  fn active_mut(&mut self) -> &mut QueryObserver<LogsResponse> {
    if self.search.is_searching() {
      &mut self.matches
    } else {
      &mut self.tail
    }
  }

  fn submit_search(&mut self, term: &str) {
    self.search.submit(term);
    self.scroll = 0;
    match self.search.term().map(str::to_string) {
      Some(term) => {
        let key = keys::logs_search_key(&term, TAIL_LINES);
        let client = self.client.clone();
        self.matches.set_query(key, move || {
          let client = client.clone();
          let term = term.clone();
          async move { client.search_logs(&term, TAIL_LINES).await }
        });
        self.matches.set_enabled(true);
        self.tail.set_enabled(false);
      }
      None => {
        self.matches.set_enabled(false);
        self.tail.set_enabled(true);
      }
    }
  }

  fn summary(&self, snapshot: &QuerySnapshot<LogsResponse>) -> String {
    let Some(resp) = snapshot.data() else {
      return String::new();
    };
    match self.search.term() {
      Some(term) => format!(
        "{} matches for '{}'",
        resp.total_matches.unwrap_or(resp.lines.len() as u64),
        resp.query.as_deref().unwrap_or(term)
      ),
      None => {
        let total = resp.total.unwrap_or(resp.lines.len() as u64);
        match &resp.log_file {
          Some(file) => format!("last {} of {} lines in {}", resp.lines.len(), total, file),
          None => format!("last {} of {} lines", resp.lines.len(), total),
        }
      }
    }
  }

  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
    let current = self.search.term().map(str::to_string);
    match self.search_input.handle_key(key, current.as_deref()) {
      KeyResult::Event(SearchEvent::Submitted(term)) => {
        self.submit_search(&term);
        Some(ViewAction::None)
      }
      KeyResult::Event(SearchEvent::Cancelled) | KeyResult::Handled => Some(ViewAction::None),
      KeyResult::NotHandled => None,
    }
  }

  fn handle_actions(&mut self, key: KeyEvent, ctx: &mut AppContext) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.scroll = self.scroll.saturating_add(1);
        Some(ViewAction::None)
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.scroll = self.scroll.saturating_sub(1);
        Some(ViewAction::None)
      }
      KeyCode::PageDown => {
        self.scroll = self.scroll.saturating_add(20);
        Some(ViewAction::None)
      }
      KeyCode::PageUp => {
        self.scroll = self.scroll.saturating_sub(20);
        Some(ViewAction::None)
      }
      KeyCode::Char('g') => {
        self.scroll = 0;
        Some(ViewAction::None)
      }
      KeyCode::Char('r') => {
        self.active_mut().refetch(&mut ctx.store);
        Some(ViewAction::None)
      }
      KeyCode::Esc if self.search.is_searching() => {
        self.submit_search("");
        Some(ViewAction::None)
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }
}

impl View for LogsView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> ViewAction {
    self
      .handle_overlays(key)
      .or_else(|| self.handle_actions(key, ctx))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &AppContext) {
    let snapshot = self.active().snapshot(&ctx.store);

    let mut title = format!(" Logs {} ", self.summary(&snapshot));
    if snapshot.is_loading() {
      title.push_str("(loading...) ");
    }

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(status_color(snapshot.status)));

    let text: Vec<Line> = match (snapshot.data(), snapshot.error()) {
      (Some(resp), _) if resp.lines.is_empty() => vec![Line::styled(
        "No log lines.",
        Style::default().fg(Color::DarkGray),
      )],
      (Some(resp), err) => {
        let mut lines: Vec<Line> = Vec::with_capacity(resp.lines.len() + 1);
        if let Some(err) = err {
          lines.push(Line::styled(
            format!("refresh failed: {}", err),
            Style::default().fg(Color::Red),
          ));
        }
        lines.extend(resp.lines.iter().map(|l| Line::from(l.as_str())));
        lines
      }
      (None, Some(err)) => vec![
        Line::styled(err.to_string(), Style::default().fg(Color::Red)),
        Line::styled("Press 'r' to retry.", Style::default().fg(Color::DarkGray)),
      ],
      (None, None) => vec![Line::styled(
        "Loading...",
        Style::default().fg(Color::DarkGray),
      )],
    };

    let paragraph = Paragraph::new(text).block(block).scroll((self.scroll, 0));
    frame.render_widget(paragraph, area);
    self.search_input.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    match self.search.term() {
      Some(term) => format!("Logs /{}", term),
      None => "Logs".to_string(),
    }
  }

  fn tick(&mut self, ctx: &mut AppContext) {
    self.tail.sync(&mut ctx.store);
    self.matches.sync(&mut ctx.store);
  }

  fn unmount(&mut self, ctx: &mut AppContext) {
    self.tail.cancel(&mut ctx.store);
    self.matches.cancel(&mut ctx.store);
  }

  fn captures_input(&self) -> bool {
    self.search_input.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("j/k", "scroll").with_priority(30),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
