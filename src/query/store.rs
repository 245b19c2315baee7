//! Process-wide store of query results.
//!
//! The store is owned by the event loop and mutated only there. Fetches run
//! as spawned tasks and report back through a channel; `poll()` applies
//! finished results on each tick. Every fetch gets a generation number and
//! only the newest generation for a key may write its entry, so a slow
//! response can never overwrite a newer one.

use chrono::Utc;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use super::entry::{CacheEntry, Payload, QueryStatus};
use super::key::{InvalidationTarget, QueryKey};

/// A type-erased fetch. Errors are already rendered for display.
pub type PayloadFuture = BoxFuture<'static, Result<Payload, String>>;

/// Result of a finished fetch task, tagged with the generation that issued it.
struct Completion {
  key: QueryKey,
  generation: u64,
  result: Result<Payload, String>,
}

struct InFlight {
  generation: u64,
  handle: AbortHandle,
}

/// Shared cache of query results keyed by [`QueryKey`].
pub struct QueryStore {
  entries: HashMap<QueryKey, CacheEntry>,
  in_flight: HashMap<QueryKey, InFlight>,
  generation: u64,
  stale_time: Duration,
  tx: mpsc::UnboundedSender<Completion>,
  rx: mpsc::UnboundedReceiver<Completion>,
}

impl Default for QueryStore {
  fn default() -> Self {
    Self::new()
  }
}

impl QueryStore {
  /// Create an empty store. Data is considered fresh for one minute.
  pub fn new() -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      entries: HashMap::new(),
      in_flight: HashMap::new(),
      generation: 0,
      stale_time: Duration::from_secs(60),
      tx,
      rx,
    }
  }

  /// Set how long a settled entry counts as fresh for new observers.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  pub fn stale_time(&self) -> Duration {
    self.stale_time
  }

  pub fn entry(&self, key: &QueryKey) -> Option<&CacheEntry> {
    self.entries.get(key)
  }

  pub fn is_in_flight(&self, key: &QueryKey) -> bool {
    self.in_flight.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// True when a newly observed key should be fetched: nothing in flight,
  /// and the entry is missing, invalidated or older than the stale time.
  pub fn needs_fetch(&self, key: &QueryKey) -> bool {
    if self.in_flight.contains_key(key) {
      return false;
    }
    self
      .entries
      .get(key)
      .map_or(true, |e| e.is_stale(self.stale_time))
  }

  /// Start a fetch unless one is already in flight for this key.
  ///
  /// The fetcher is only invoked when a fetch is actually issued. Returns
  /// the new generation, or None when the request was coalesced.
  pub fn fetch<F>(&mut self, key: &QueryKey, fetcher: F) -> Option<u64>
  where
    F: FnOnce() -> PayloadFuture,
  {
    if self.in_flight.contains_key(key) {
      debug!(key = %key, "fetch coalesced with in-flight request");
      return None;
    }
    Some(self.start(key, fetcher()))
  }

  /// Start a fetch, superseding any in-flight one for the same key.
  pub fn refetch(&mut self, key: &QueryKey, future: PayloadFuture) -> u64 {
    self.start(key, future)
  }

  fn start(&mut self, key: &QueryKey, future: PayloadFuture) -> u64 {
    if let Some(previous) = self.in_flight.remove(key) {
      previous.handle.abort();
      debug!(key = %key, generation = previous.generation, "superseded in-flight fetch");
    }

    self.generation += 1;
    let generation = self.generation;
    let tx = self.tx.clone();
    let task_key = key.clone();

    let handle = tokio::spawn(async move {
      let result = future.await;
      // Receiver is gone once the store is dropped
      let _ = tx.send(Completion {
        key: task_key,
        generation,
        result,
      });
    });

    self.in_flight.insert(
      key.clone(),
      InFlight {
        generation,
        handle: handle.abort_handle(),
      },
    );
    self.entries.entry(key.clone()).or_default().status = QueryStatus::Loading;

    debug!(key = %key, fingerprint = %key.fingerprint(), generation, "fetch started");
    generation
  }

  /// Apply every finished fetch. Returns the keys whose entries changed.
  pub fn poll(&mut self) -> Vec<QueryKey> {
    let mut changed = Vec::new();
    while let Ok(completion) = self.rx.try_recv() {
      let key = completion.key.clone();
      if self.apply(completion) {
        changed.push(key);
      }
    }
    changed
  }

  /// Wait until the next in-flight fetch is applied.
  ///
  /// Returns None immediately when nothing is in flight.
  pub async fn settle(&mut self) -> Option<QueryKey> {
    while !self.in_flight.is_empty() {
      let completion = self.rx.recv().await?;
      let key = completion.key.clone();
      if self.apply(completion) {
        return Some(key);
      }
    }
    None
  }

  fn apply(&mut self, completion: Completion) -> bool {
    let current = self.in_flight.get(&completion.key).map(|f| f.generation);
    if current != Some(completion.generation) {
      debug!(
        key = %completion.key,
        generation = completion.generation,
        "dropping result of superseded fetch"
      );
      return false;
    }
    self.in_flight.remove(&completion.key);

    let now = Instant::now();
    let entry = self.entries.entry(completion.key.clone()).or_default();
    entry.settled_at = Some(now);
    entry.invalidated = false;

    match completion.result {
      Ok(payload) => {
        entry.data = Some(payload);
        entry.status = QueryStatus::Success;
        entry.error = None;
        entry.fetched_at = Some(now);
        entry.updated_at = Some(Utc::now());
        debug!(key = %completion.key, generation = completion.generation, "fetch applied");
      }
      Err(message) => {
        // Stale-while-error: keep whatever data we had
        warn!(key = %completion.key, error = %message, "fetch failed");
        entry.status = QueryStatus::Error;
        entry.error = Some(message);
      }
    }
    true
  }

  /// Mark every matching entry stale and drop interest in its in-flight fetch.
  ///
  /// Observers of these keys refetch on their next sync. Returns the keys
  /// that were affected.
  pub fn invalidate(&mut self, target: &InvalidationTarget) -> Vec<QueryKey> {
    let keys: Vec<QueryKey> = self
      .entries
      .keys()
      .filter(|k| target.matches(k))
      .cloned()
      .collect();

    for key in &keys {
      self.abandon(key);
      if let Some(entry) = self.entries.get_mut(key) {
        entry.invalidated = true;
      }
    }

    debug!(target = %target, count = keys.len(), "invalidated");
    keys
  }

  /// Drop interest in the in-flight fetch for a key, if any.
  pub fn cancel(&mut self, key: &QueryKey) -> bool {
    let cancelled = self.abandon(key);
    if cancelled {
      debug!(key = %key, "fetch cancelled");
    }
    cancelled
  }

  fn abandon(&mut self, key: &QueryKey) -> bool {
    match self.in_flight.remove(key) {
      Some(in_flight) => {
        in_flight.handle.abort();
        if let Some(entry) = self.entries.get_mut(key) {
          entry.status = entry.settle_status();
        }
        true
      }
      None => false,
    }
  }

  /// Tear the store down: abort every fetch and forget every entry.
  pub fn clear(&mut self) {
    for (_, in_flight) in self.in_flight.drain() {
      in_flight.handle.abort();
    }
    self.entries.clear();
    while self.rx.try_recv().is_ok() {}
    debug!("query store cleared");
  }
}

impl Drop for QueryStore {
  fn drop(&mut self) {
    for in_flight in self.in_flight.values() {
      in_flight.handle.abort();
    }
  }
}
