use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Terminal was resized; redraw
  Resize,
  /// Periodic tick: apply finished fetches and mutations, expire notifications
  Tick,
}

/// Produces events from terminal input and a tick timer.
///
/// Terminal reads block, so the reader runs on a blocking thread and stops
/// once the receiver is dropped.
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::task::spawn_blocking(move || {
      let mut last_tick = Instant::now();
      loop {
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout).unwrap_or(false) {
          let forwarded = match event::read() {
            // Windows reports releases too
            Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
              tx.send(Event::Key(key))
            }
            Ok(CrosstermEvent::Resize(_, _)) => tx.send(Event::Resize),
            _ => Ok(()),
          };
          if forwarded.is_err() {
            break;
          }
        }

        if last_tick.elapsed() >= tick_rate {
          if tx.send(Event::Tick).is_err() {
            break;
          }
          last_tick = Instant::now();
        }
      }
    });

    Self { rx }
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
