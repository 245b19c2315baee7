use std::future::Future;

use crate::context::AppContext;
use crate::elder::api_types::ListResponse;
use crate::elder::keys::{self, ListParams};
use crate::elder::{ApiError, ElderClient, Listable};
use crate::filter::{FilterState, SearchState};
use crate::mutation::{MutationRequest, PendingConfirmation};
use crate::pagination::Pagination;
use crate::query::{Gate, QueryObserver, QuerySnapshot};
use crate::ui::components::{ConfirmDialog, ConfirmEvent, KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{status_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{AuditExportView, DependencyFormView};
use crossterm::event::{KeyCode, KeyEvent};
use futures::future::BoxFuture;
use futures::FutureExt;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};

type ListFetcher<T> =
  Box<dyn Fn() -> BoxFuture<'static, Result<ListResponse<T>, ApiError>> + Send + Sync>;

fn list_fetcher<T: Listable>(client: ElderClient, params: ListParams) -> ListFetcher<T> {
  Box::new(move || {
    let client = client.clone();
    let params = params.clone();
    async move { client.list::<T>(&params).await }.boxed()
  })
}

fn search_fetcher<T: Listable>(
  client: ElderClient,
  term: String,
  params: ListParams,
) -> ListFetcher<T> {
  Box::new(move || {
    let client = client.clone();
    let term = term.clone();
    let params = params.clone();
    async move { client.search::<T>(&term, &params).await }.boxed()
  })
}

/// Operation on the selected row beyond delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
  /// `POST backup/jobs/{id}/run`
  RunJob,
  /// Validate a restore without applying it
  RestoreDryRun,
  Restore,
}

impl RowAction {
  fn key(&self) -> char {
    match self {
      RowAction::RunJob => 'x',
      RowAction::RestoreDryRun => 't',
      RowAction::Restore => 'R',
    }
  }

  fn shortcut(&self) -> ShortcutInfo {
    match self {
      RowAction::RunJob => ShortcutInfo::new("x", "run"),
      RowAction::RestoreDryRun => ShortcutInfo::new("t", "dry-run restore"),
      RowAction::Restore => ShortcutInfo::new("R", "restore"),
    }
    .with_priority(60)
  }
}

/// Form that can be opened from a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormLauncher {
  NewDependency,
  AuditExport,
}

impl FormLauncher {
  fn key(&self) -> char {
    match self {
      FormLauncher::NewDependency => 'c',
      FormLauncher::AuditExport => 'e',
    }
  }

  fn shortcut(&self) -> ShortcutInfo {
    match self {
      FormLauncher::NewDependency => ShortcutInfo::new("c", "create"),
      FormLauncher::AuditExport => ShortcutInfo::new("e", "export"),
    }
    .with_priority(55)
  }
}

/// Paginated table over one Elder resource
pub struct ResourceListView<T: Listable> {
  client: ElderClient,
  pagination: Pagination,
  filters: FilterState,
  search: SearchState,
  search_input: SearchInput,
  searchable: bool,
  list: QueryObserver<ListResponse<T>>,
  results: QueryObserver<ListResponse<T>>,
  /// Admin gate for administrator-only resources
  access: Gate,
  confirm: ConfirmDialog,
  pending: Option<PendingConfirmation>,
  table_state: TableState,
  row_actions: Vec<RowAction>,
  forms: Vec<FormLauncher>,
  /// Opens a related listing for the selected row's id on Enter
  drilldown: Option<Drilldown>,
}

pub type Drilldown = fn(&AppContext, i64) -> Box<dyn View>;

impl<T: Listable> ResourceListView<T> {
  pub fn new(ctx: &AppContext, page: u64) -> Self {
    let pagination = Pagination::from_page(page, ctx.config.page_size);
    let filters = FilterState::new();
    let params = ListParams::from_state(&pagination, &filters);
    let client = ctx.client.clone();

    let list = QueryObserver::new(
      params.to_key(T::RESOURCE),
      list_fetcher::<T>(client.clone(), params.clone()),
    )
    .with_refetch_interval(ctx.config.refresh_interval());

    // Replaced on the first submitted search
    let results = QueryObserver::new(
      keys::search_key(T::RESOURCE, "", &params),
      search_fetcher::<T>(client.clone(), String::new(), params),
    )
    .disabled();

    let access = if T::RESOURCE.admin_only() {
      Gate::Pending
    } else {
      Gate::Resolved
    };

    Self {
      client,
      pagination,
      filters,
      search: SearchState::new(),
      search_input: SearchInput::new(),
      searchable: false,
      list,
      results,
      access,
      confirm: ConfirmDialog::new(),
      pending: None,
      table_state: TableState::default(),
      row_actions: Vec::new(),
      forms: Vec::new(),
      drilldown: None,
    }
  }

  /// Enable `/` search against the resource's search endpoint
  pub fn searchable(mut self) -> Self {
    self.searchable = true;
    self
  }

  pub fn with_row_action(mut self, action: RowAction) -> Self {
    self.row_actions.push(action);
    self
  }

  pub fn with_form(mut self, form: FormLauncher) -> Self {
    self.forms.push(form);
    self
  }

  pub fn with_drilldown(mut self, open: Drilldown) -> Self {
    self.drilldown = Some(open);
    self
  }

  /// Start with a server-side filter applied
  pub fn with_filter(mut self, name: &str, value: &str) -> Self {
    self.filters = FilterState::new().with_default(name, value);
    self.update_queries();
    self
  }

  fn active(&self) -> &QueryObserver<ListResponse<T>> {
    if self.search.is_searching() {
      &self.results
    } else {
      &self.list
    }
  }

  fn active_mut(&mut self) -> &mut QueryObserver<ListResponse<T>> {
    if self.search.is_searching() {
      &mut self.results
    } else {
      &mut self.list
    }
  }

  fn snapshot(&self, ctx: &AppContext) -> QuerySnapshot<ListResponse<T>> {
    self.active().snapshot(&ctx.store)
  }

  /// Rebuild both keys from the current pagination, filters and term
  fn update_queries(&mut self) {
    let params = ListParams::from_state(&self.pagination, &self.filters);
    self.list.set_query(
      params.to_key(T::RESOURCE),
      list_fetcher::<T>(self.client.clone(), params.clone()),
    );
    if let Some(term) = self.search.term() {
      self.results.set_query(
        keys::search_key(T::RESOURCE, term, &params),
        search_fetcher::<T>(self.client.clone(), term.to_string(), params),
      );
    }
  }

  /// Only one mode's observer may fetch, and neither without access
  fn apply_gates(&mut self, ctx: &AppContext) {
    if T::RESOURCE.admin_only() {
      self.access = ctx.admin_gate();
    }
    let permitted = self.access.is_resolved();
    let searching = self.search.is_searching();
    self.list.set_enabled(permitted && !searching);
    self.results.set_enabled(permitted && searching);
  }

  fn selected_row(&self, ctx: &AppContext) -> Option<T> {
    let idx = self.table_state.selected()?;
    self
      .snapshot(ctx)
      .data()
      .and_then(|resp| resp.items.get(idx))
      .cloned()
  }

  fn change_page(&mut self, forward: bool, ctx: &mut AppContext) {
    let moved = if forward {
      self.pagination.next()
    } else {
      self.pagination.previous()
    };
    if moved {
      self.table_state.select(Some(0));
      self.update_queries();
      self.apply_gates(ctx);
    }
  }

  fn submit_search(&mut self, term: &str, ctx: &mut AppContext) {
    let before = self.search.clone();
    self.search.submit(term);
    if self.search == before {
      return;
    }
    self.pagination.offset = 0;
    self.table_state.select(Some(0));
    self.update_queries();
    self.apply_gates(ctx);
  }

  /// Confirmation-gated mutations wait in the dialog; others go out now
  fn submit<Fut, R>(&mut self, ctx: &mut AppContext, request: MutationRequest, future: Fut)
  where
    Fut: Future<Output = Result<R, ApiError>> + Send + 'static,
    R: Send + 'static,
  {
    if request.requires_confirmation() {
      let pending = PendingConfirmation::new(request, future);
      self.confirm.show(pending.prompt());
      self.pending = Some(pending);
    } else if let Err(e) = ctx.dispatch(request, future) {
      ctx.notifications.error(e.to_string());
    }
  }

  fn request_delete(&mut self, row: T, ctx: &mut AppContext) {
    let request = keys::delete_invalidations(T::RESOURCE).into_iter().fold(
      MutationRequest::delete(T::RESOURCE.tag(), row.label()),
      |req, target| req.invalidates(target),
    );
    let client = self.client.clone();
    let id = row.id();
    self.submit(ctx, request, async move {
      client.delete(T::RESOURCE, id).await
    });
  }

  fn run_row_action(&mut self, action: RowAction, row: T, ctx: &mut AppContext) {
    let client = self.client.clone();
    let id = row.id();
    let label = row.label();
    match action {
      RowAction::RunJob => {
        let request = keys::backup_run_invalidations().into_iter().fold(
          MutationRequest::run(T::RESOURCE.tag(), label.clone())
            .with_success_message(format!("Started {}", label)),
          |req, target| req.invalidates(target),
        );
        self.submit(ctx, request, async move { client.run_backup_job(id).await });
      }
      RowAction::RestoreDryRun | RowAction::Restore => {
        let dry_run = action == RowAction::RestoreDryRun;
        let (description, done) = if dry_run {
          (
            format!("dry-run restore from {}", label),
            format!("Dry run of restore from {} passed, nothing changed", label),
          )
        } else {
          (
            format!("restore from {}", label),
            format!("Restored from {}", label),
          )
        };
        let mut request = keys::restore_invalidations(dry_run).into_iter().fold(
          MutationRequest::run(T::RESOURCE.tag(), description).with_success_message(done),
          |req, target| req.invalidates(target),
        );
        if !dry_run {
          request = request.destructive();
        }
        self.submit(ctx, request, async move {
          client.restore_backup(id, dry_run).await
        });
      }
    }
  }

  // Key handling helpers for or_else chain pattern
  fn handle_overlays(&mut self, key: KeyEvent, ctx: &mut AppContext) -> Option<ViewAction> {
    match self.confirm.handle_key(key) {
      KeyResult::Event(ConfirmEvent::Confirmed) => {
        if let Some(pending) = self.pending.take() {
          ctx.dispatch_confirmed(pending.confirm());
        }
        return Some(ViewAction::None);
      }
      KeyResult::Event(ConfirmEvent::Declined) => {
        // Dropping the pending future means the request is never sent
        self.pending = None;
        return Some(ViewAction::None);
      }
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::NotHandled => {}
    }

    if !self.searchable {
      return None;
    }
    let current = self.search.term().map(str::to_string);
    match self.search_input.handle_key(key, current.as_deref()) {
      KeyResult::Event(SearchEvent::Submitted(term)) => {
        self.submit_search(&term, ctx);
        Some(ViewAction::None)
      }
      KeyResult::Event(SearchEvent::Cancelled) | KeyResult::Handled => Some(ViewAction::None),
      KeyResult::NotHandled => None,
    }
  }

  fn handle_navigation(&mut self, key: KeyEvent, ctx: &mut AppContext) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.table_state.select_next();
        Some(ViewAction::None)
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.table_state.select_previous();
        Some(ViewAction::None)
      }
      KeyCode::Char('n') | KeyCode::Right => {
        self.change_page(true, ctx);
        Some(ViewAction::None)
      }
      KeyCode::Char('p') | KeyCode::Left => {
        self.change_page(false, ctx);
        Some(ViewAction::None)
      }
      _ => None,
    }
  }

  fn handle_actions(&mut self, key: KeyEvent, ctx: &mut AppContext) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('r') => {
        self.apply_gates(ctx);
        if !self.active_mut().refetch(&mut ctx.store) {
          ctx.notifications.info("Nothing to refresh");
        }
        Some(ViewAction::None)
      }
      KeyCode::Char('d') if T::RESOURCE.deletable() => {
        if let Some(row) = self.selected_row(ctx) {
          self.request_delete(row, ctx);
        }
        Some(ViewAction::None)
      }
      KeyCode::Char(c) if self.row_actions.iter().any(|a| a.key() == c) => {
        let action = self.row_actions.iter().copied().find(|a| a.key() == c)?;
        if let Some(row) = self.selected_row(ctx) {
          self.run_row_action(action, row, ctx);
        }
        Some(ViewAction::None)
      }
      KeyCode::Char(c) if self.forms.iter().any(|f| f.key() == c) => {
        let form = self.forms.iter().copied().find(|f| f.key() == c)?;
        let view: Box<dyn View> = match form {
          FormLauncher::NewDependency => Box::new(DependencyFormView::new(ctx)),
          FormLauncher::AuditExport => Box::new(AuditExportView::new(ctx)),
        };
        Some(ViewAction::Push(view))
      }
      KeyCode::Enter => {
        let open = self.drilldown?;
        let row = self.selected_row(ctx)?;
        Some(ViewAction::Push(open(ctx, row.id())))
      }
      KeyCode::Esc if self.search.is_searching() => {
        self.submit_search("", ctx);
        Some(ViewAction::None)
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }

  fn title(&self, snapshot: &QuerySnapshot<ListResponse<T>>) -> String {
    let mut title = format!(" {}", T::RESOURCE.title());
    if let Some(term) = self.search.term() {
      title.push_str(&format!(" matching '{}'", term));
    }
    if let Some(resp) = snapshot.data() {
      title.push_str(&format!(
        " [{}]",
        self.pagination.with_total(resp.total).range_label()
      ));
    }
    if snapshot.is_loading() {
      title.push_str(" (loading...)");
    } else if let (Some(err), Some(_)) = (snapshot.error(), snapshot.data()) {
      // Stale data stays on screen; the error goes in the title
      title.push_str(&format!(" (refresh failed: {})", err));
    }
    title.push(' ');
    title
  }

  fn empty_message(&self, snapshot: &QuerySnapshot<ListResponse<T>>) -> Option<String> {
    match self.access {
      Gate::Pending => return Some("Checking permissions...".to_string()),
      Gate::Disabled => return Some("Administrator access required.".to_string()),
      Gate::Resolved => {}
    }
    match snapshot.data() {
      Some(resp) if resp.items.is_empty() => Some(match self.search.term() {
        Some(term) => format!("No {} match '{}'.", T::RESOURCE.title().to_lowercase(), term),
        None => format!("No {} found.", T::RESOURCE.title().to_lowercase()),
      }),
      Some(_) => None,
      None => match snapshot.error() {
        Some(err) => Some(format!("{}\n\nPress 'r' to retry.", err)),
        None => Some("Loading...".to_string()),
      },
    }
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect, ctx: &AppContext) {
    let snapshot = self.snapshot(ctx);
    let block = Block::default()
      .title(self.title(&snapshot))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(status_color(snapshot.status)));

    if let Some(message) = self.empty_message(&snapshot) {
      let style = if snapshot.is_error() || self.access.is_disabled() {
        Style::default().fg(Color::Red)
      } else {
        Style::default().fg(Color::DarkGray)
      };
      let paragraph = Paragraph::new(message)
        .block(block)
        .style(style)
        .wrap(Wrap { trim: true });
      frame.render_widget(paragraph, area);
      return;
    }

    let items = snapshot
      .data()
      .map(|resp| resp.items.as_slice())
      .unwrap_or(&[]);
    ensure_valid_selection(&mut self.table_state, items.len());

    let columns = T::columns();
    let header = Row::new(columns.iter().map(|c| {
      Cell::from(c.title).style(Style::default().fg(Color::Yellow).bold())
    }));
    let rows: Vec<Row> = items
      .iter()
      .map(|item| {
        Row::new(
          item
            .cells()
            .into_iter()
            .zip(columns)
            .map(|(text, col)| Cell::from(truncate(&text, col.width as usize))),
        )
      })
      .collect();
    let widths: Vec<Constraint> = columns.iter().map(|c| Constraint::Length(c.width)).collect();

    let table = Table::new(rows, widths)
      .header(header)
      .block(block)
      .row_highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.table_state);
  }
}

impl<T: Listable> View for ResourceListView<T> {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> ViewAction {
    self
      .handle_overlays(key, ctx)
      .or_else(|| self.handle_navigation(key, ctx))
      .or_else(|| self.handle_actions(key, ctx))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &AppContext) {
    self.render_table(frame, area, ctx);
    self.search_input.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    let mut label = T::RESOURCE.title().to_string();
    let filters: Vec<String> = self
      .filters
      .params()
      .map(|(k, v)| format!("{}={}", k, v))
      .collect();
    if !filters.is_empty() {
      label.push_str(&format!(" [{}]", filters.join(",")));
    }
    if let Some(term) = self.search.term() {
      label.push_str(&format!(" /{}", term));
    }
    label
  }

  fn tick(&mut self, ctx: &mut AppContext) {
    self.apply_gates(ctx);
    self.list.sync(&mut ctx.store);
    self.results.sync(&mut ctx.store);

    let total = self.snapshot(ctx).data().map(|resp| resp.total);
    if let Some(total) = total {
      self.pagination.total = total;
      let page = self.pagination.page();
      self.pagination.clamp();
      if self.pagination.page() != page {
        self.update_queries();
      }
    }
  }

  fn unmount(&mut self, ctx: &mut AppContext) {
    self.list.cancel(&mut ctx.store);
    self.results.cancel(&mut ctx.store);
    self.pending = None;
  }

  fn captures_input(&self) -> bool {
    self.search_input.is_active() || self.confirm.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    let mut shortcuts = vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("n/p", "page").with_priority(30),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ];
    if self.searchable {
      shortcuts.push(ShortcutInfo::new("/", "search").with_priority(20));
    }
    if self.drilldown.is_some() {
      shortcuts.push(ShortcutInfo::new("enter", "open").with_priority(25));
    }
    if T::RESOURCE.deletable() {
      shortcuts.push(ShortcutInfo::new("d", "delete").with_priority(50));
    }
    shortcuts.extend(self.forms.iter().map(FormLauncher::shortcut));
    shortcuts.extend(self.row_actions.iter().map(RowAction::shortcut));
    shortcuts
  }
}
