//! Transient user notifications ("toasts").

use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
  Info,
  Success,
  Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
  pub level: Level,
  pub message: String,
  raised_at: Instant,
}

impl Notification {
  pub fn age(&self) -> Duration {
    self.raised_at.elapsed()
  }
}

/// Bounded queue of notifications that expire after a fixed time.
#[derive(Debug)]
pub struct Notifications {
  queue: VecDeque<Notification>,
  ttl: Duration,
  capacity: usize,
}

impl Default for Notifications {
  fn default() -> Self {
    Self::new(Duration::from_secs(5))
  }
}

impl Notifications {
  pub fn new(ttl: Duration) -> Self {
    Self {
      queue: VecDeque::new(),
      ttl,
      capacity: 16,
    }
  }

  pub fn push(&mut self, level: Level, message: impl Into<String>) {
    if self.queue.len() == self.capacity {
      self.queue.pop_front();
    }
    self.queue.push_back(Notification {
      level,
      message: message.into(),
      raised_at: Instant::now(),
    });
  }

  pub fn info(&mut self, message: impl Into<String>) {
    self.push(Level::Info, message);
  }

  pub fn success(&mut self, message: impl Into<String>) {
    self.push(Level::Success, message);
  }

  pub fn error(&mut self, message: impl Into<String>) {
    self.push(Level::Error, message);
  }

  /// Most recent notification still alive.
  pub fn latest(&self) -> Option<&Notification> {
    self.queue.back().filter(|n| n.age() < self.ttl)
  }

  /// Drop everything older than the TTL.
  pub fn expire(&mut self) {
    let ttl = self.ttl;
    self.queue.retain(|n| n.age() < ttl);
  }

  pub fn iter(&self) -> impl Iterator<Item = &Notification> {
    self.queue.iter()
  }

  pub fn len(&self) -> usize {
    self.queue.len()
  }

  pub fn is_empty(&self) -> bool {
    self.queue.is_empty()
  }
}
