use crate::commands::CommandTarget;
use crate::config::Config;
use crate::context::AppContext;
use crate::elder::{ElderClient, Resource};
use crate::event::{Event, EventHandler};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{resource_page, LogsView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::{debug, info};

/// First page shown, and where `:logout` returns to
const HOME: Resource = Resource::Organizations;

/// Main application state
pub struct App {
  ctx: AppContext,
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,
  command: CommandInput,
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, start_page: u64) -> Result<Self> {
    let client = ElderClient::new(&config)?;
    info!(api = %client.base_url(), "starting elder-console");
    let ctx = AppContext::new(client, config);
    let root = resource_page(HOME, &ctx, start_page);

    Ok(Self {
      ctx,
      view_stack: vec![root],
      command: CommandInput::new(),
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));

    // First tick issues the initial fetches before anything is drawn
    self.tick();

    let result = self.event_loop(&mut terminal, &mut events).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| {
        ui::draw(frame, &self.ctx, &mut self.view_stack, &self.command)
      })?;

      match events.next().await {
        Some(Event::Key(key)) => {
          self.handle_key(key);
          // Apply the key's effect on queries before the next draw
          self.tick();
        }
        Some(Event::Resize) => {}
        Some(Event::Tick) => self.tick(),
        None => break,
      }
    }

    // Nothing in flight may outlive the UI
    let mut views = std::mem::take(&mut self.view_stack);
    for view in views.iter_mut() {
      view.unmount(&mut self.ctx);
    }
    Ok(())
  }

  fn tick(&mut self) {
    let outcomes = self.ctx.tick();
    for outcome in &outcomes {
      let action = match self.view_stack.last_mut() {
        Some(view) => view.mutation_finished(outcome),
        None => ViewAction::None,
      };
      self.apply(action);
    }
    if let Some(view) = self.view_stack.last_mut() {
      view.tick(&mut self.ctx);
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let view_owns_keyboard = self
      .view_stack
      .last()
      .is_some_and(|v| v.captures_input());

    if !view_owns_keyboard {
      let result = self.command.handle_key(key);
      if result.is_consumed() {
        if let KeyResult::Event(event) = result {
          self.command_event(event);
        }
        return;
      }
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key, &mut self.ctx),
      None => ViewAction::None,
    };
    self.apply(action);
  }

  fn command_event(&mut self, event: CommandEvent) {
    match event {
      CommandEvent::Run(cmd) => self.run_command(cmd.target),
      CommandEvent::Unknown(input) if !input.is_empty() => {
        self
          .ctx
          .notifications
          .error(format!("Unknown command: {}", input));
      }
      CommandEvent::Unknown(_) | CommandEvent::Cancelled => {}
    }
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => {
        debug!(view = %view.breadcrumb_label(), "push view");
        self.view_stack.push(view);
      }
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          if let Some(mut view) = self.view_stack.pop() {
            view.unmount(&mut self.ctx);
          }
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  /// Replace the whole stack with a new root
  fn reset_to(&mut self, root: Box<dyn View>) {
    for mut view in self.view_stack.drain(..) {
      view.unmount(&mut self.ctx);
    }
    self.view_stack.push(root);
  }

  fn run_command(&mut self, target: CommandTarget) {
    debug!(?target, "command");
    match target {
      CommandTarget::Page(resource) => {
        let root = resource_page(resource, &self.ctx, 1);
        self.reset_to(root);
      }
      CommandTarget::Logs => {
        let root: Box<dyn View> = Box::new(LogsView::new(&self.ctx));
        self.reset_to(root);
      }
      CommandTarget::Logout => {
        let views = std::mem::take(&mut self.view_stack);
        for mut view in views {
          view.unmount(&mut self.ctx);
        }
        self.ctx.logout();
        let root = resource_page(HOME, &self.ctx, 1);
        self.view_stack.push(root);
      }
      CommandTarget::Quit => self.should_quit = true,
    }
  }
}
