//! Listing/searching switches on real pages: which requests go out and
//! which rows end up on screen.

mod common;

use common::FakeElder;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use elder_console::config::Config;
use elder_console::context::AppContext;
use elder_console::elder::types::Organization;
use elder_console::ui::view::View;
use elder_console::ui::views::{LogsView, ResourceListView};
use ratatui::backend::TestBackend;
use ratatui::Terminal;

const ORG_SEARCH: &str = "GET /api/v1/organizations/search";
const ORG_LIST: &str = "GET /api/v1/organizations?";
const LOG_SEARCH: &str = "GET /api/v1/logs/search";
const LOG_TAIL: &str = "GET /api/v1/logs?";

fn context(server: &FakeElder) -> AppContext {
  AppContext::new(server.client(), Config::with_url(server.base_url.clone()))
}

/// One event-loop tick, then wait for every fetch it started.
async fn tick(ctx: &mut AppContext, view: &mut dyn View) {
  ctx.tick();
  view.tick(ctx);
  while ctx.store.settle().await.is_some() {}
}

fn press(ctx: &mut AppContext, view: &mut dyn View, keys: &str) {
  for c in keys.chars() {
    view.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE), ctx);
  }
}

fn key(ctx: &mut AppContext, view: &mut dyn View, code: KeyCode) {
  view.handle_key(KeyEvent::new(code, KeyModifiers::NONE), ctx);
}

/// Submit `term` through the `/` prompt.
fn search(ctx: &mut AppContext, view: &mut dyn View, term: &str) {
  press(ctx, view, "/");
  press(ctx, view, term);
  key(ctx, view, KeyCode::Enter);
}

fn screen(ctx: &AppContext, view: &mut dyn View) -> String {
  let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
  terminal
    .draw(|frame| {
      let area = frame.area();
      view.render(frame, area, ctx)
    })
    .unwrap();
  terminal
    .backend()
    .buffer()
    .content()
    .iter()
    .map(|cell| cell.symbol())
    .collect()
}

#[tokio::test]
async fn test_blank_search_stays_on_listing() {
  let server = FakeElder::start().await;
  let mut ctx = context(&server);
  let mut page = ResourceListView::<Organization>::new(&ctx, 1).searchable();

  tick(&mut ctx, &mut page).await;
  assert_eq!(server.count(ORG_LIST), 1);

  search(&mut ctx, &mut page, "   ");
  tick(&mut ctx, &mut page).await;

  assert_eq!(server.count(ORG_SEARCH), 0);
  assert_eq!(server.count(ORG_LIST), 1);
  assert_eq!(page.breadcrumb_label(), "Organizations");
  assert!(screen(&ctx, &mut page).contains("Acme"));
}

#[tokio::test]
async fn test_clearing_search_shows_listing_rows_only() {
  let server = FakeElder::start().await;
  let mut ctx = context(&server);
  let mut page = ResourceListView::<Organization>::new(&ctx, 1).searchable();
  tick(&mut ctx, &mut page).await;

  search(&mut ctx, &mut page, "Umb");
  tick(&mut ctx, &mut page).await;
  assert_eq!(server.count(ORG_SEARCH), 1);
  let searching = screen(&ctx, &mut page);
  assert!(searching.contains("Umb Corp"));
  assert!(!searching.contains("Acme"));

  // Esc clears the term; the cached listing comes back without a refetch
  key(&mut ctx, &mut page, KeyCode::Esc);
  tick(&mut ctx, &mut page).await;
  let listing = screen(&ctx, &mut page);
  assert!(listing.contains("Acme"));
  assert!(!listing.contains("Umb Corp"));
  assert_eq!(page.breadcrumb_label(), "Organizations");
  assert_eq!(server.count(ORG_LIST), 1);
  assert_eq!(server.count(ORG_SEARCH), 1);

  // Listing key is live again: a refresh goes to the list endpoint
  press(&mut ctx, &mut page, "r");
  tick(&mut ctx, &mut page).await;
  assert_eq!(server.count(ORG_LIST), 2);
  assert_eq!(server.count(ORG_SEARCH), 1);
}

#[tokio::test]
async fn test_logs_search_round_trip() {
  let server = FakeElder::start().await;
  let mut ctx = context(&server);
  let mut logs = LogsView::new(&ctx);
  tick(&mut ctx, &mut logs).await;
  assert!(screen(&ctx, &mut logs).contains("INFO sync job finished"));

  search(&mut ctx, &mut logs, "  ");
  tick(&mut ctx, &mut logs).await;
  assert_eq!(server.count(LOG_SEARCH), 0);

  search(&mut ctx, &mut logs, "timeout");
  tick(&mut ctx, &mut logs).await;
  assert_eq!(server.count(LOG_SEARCH), 1);
  let matches = screen(&ctx, &mut logs);
  assert!(matches.contains("ERROR worker: timeout in sync job"));
  assert!(!matches.contains("INFO started"));

  key(&mut ctx, &mut logs, KeyCode::Esc);
  tick(&mut ctx, &mut logs).await;
  let tail = screen(&ctx, &mut logs);
  assert!(tail.contains("INFO started"));
  assert!(!tail.contains("timeout in sync job"));
  assert_eq!(server.count(LOG_TAIL), 1);
}
