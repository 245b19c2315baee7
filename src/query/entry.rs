//! Cache entries and typed read views over them.

use chrono::{DateTime, Utc};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::gate::Gate;

/// Type-erased payload shared between every reader of an entry.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Lifecycle status of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
  /// Nothing requested yet (or the only request was cancelled)
  #[default]
  Idle,
  /// A fetch is in flight
  Loading,
  /// Last fetch succeeded
  Success,
  /// Last fetch failed; previous data (if any) is kept
  Error,
}

/// Last known result for a query key.
#[derive(Clone, Default)]
pub struct CacheEntry {
  pub(crate) data: Option<Payload>,
  pub(crate) status: QueryStatus,
  pub(crate) error: Option<String>,
  /// When data was last replaced by a successful fetch
  pub(crate) fetched_at: Option<Instant>,
  /// Wall-clock twin of `fetched_at`, for display
  pub(crate) updated_at: Option<DateTime<Utc>>,
  /// When the last fetch (successful or not) was applied
  pub(crate) settled_at: Option<Instant>,
  pub(crate) invalidated: bool,
}

impl CacheEntry {
  /// Downcast the payload. Returns None when empty or of another type.
  pub fn data<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.data.clone()?.downcast::<T>().ok()
  }

  pub fn has_data(&self) -> bool {
    self.data.is_some()
  }

  pub fn status(&self) -> QueryStatus {
    self.status
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn fetched_at(&self) -> Option<Instant> {
    self.fetched_at
  }

  pub fn updated_at(&self) -> Option<DateTime<Utc>> {
    self.updated_at
  }

  pub fn settled_at(&self) -> Option<Instant> {
    self.settled_at
  }

  /// Marked stale by a mutation and not refetched since.
  pub fn is_invalidated(&self) -> bool {
    self.invalidated
  }

  /// Whether a new observer of this entry should trigger a fetch.
  pub fn is_stale(&self, stale_time: Duration) -> bool {
    if self.invalidated {
      return true;
    }
    match self.settled_at {
      Some(t) => t.elapsed() >= stale_time,
      None => true,
    }
  }

  /// Status an entry falls back to when its in-flight fetch is abandoned.
  pub(crate) fn settle_status(&self) -> QueryStatus {
    if self.error.is_some() {
      QueryStatus::Error
    } else if self.data.is_some() {
      QueryStatus::Success
    } else {
      QueryStatus::Idle
    }
  }
}

impl fmt::Debug for CacheEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheEntry")
      .field("has_data", &self.data.is_some())
      .field("status", &self.status)
      .field("error", &self.error)
      .field("updated_at", &self.updated_at)
      .field("invalidated", &self.invalidated)
      .finish_non_exhaustive()
  }
}

/// What a page sees when it reads its query: `{data, isLoading, error}`.
#[derive(Debug)]
pub struct QuerySnapshot<T> {
  pub data: Option<Arc<T>>,
  pub status: QueryStatus,
  pub error: Option<String>,
  pub gate: Gate,
  pub updated_at: Option<DateTime<Utc>>,
}

impl<T> QuerySnapshot<T> {
  pub(crate) fn from_entry(entry: Option<&CacheEntry>, gate: Gate) -> Self
  where
    T: Any + Send + Sync,
  {
    match entry {
      Some(e) => Self {
        data: e.data::<T>(),
        status: e.status,
        error: e.error.clone(),
        gate,
        updated_at: e.updated_at,
      },
      None => Self {
        data: None,
        status: QueryStatus::Idle,
        error: None,
        gate,
        updated_at: None,
      },
    }
  }

  pub fn data(&self) -> Option<&T> {
    self.data.as_deref()
  }

  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading
  }

  pub fn is_error(&self) -> bool {
    self.status == QueryStatus::Error
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_data_downcasts_to_stored_type() {
    let entry = CacheEntry {
      data: Some(Arc::new(vec![1u32, 2, 3])),
      status: QueryStatus::Success,
      ..Default::default()
    };
    assert_eq!(entry.data::<Vec<u32>>().as_deref(), Some(&vec![1, 2, 3]));
    assert!(entry.data::<String>().is_none());
  }

  #[test]
  fn test_never_settled_entry_is_stale() {
    let entry = CacheEntry::default();
    assert!(entry.is_stale(Duration::from_secs(3600)));
  }

  #[test]
  fn test_invalidated_entry_is_stale() {
    let entry = CacheEntry {
      settled_at: Some(Instant::now()),
      invalidated: true,
      ..Default::default()
    };
    assert!(entry.is_stale(Duration::from_secs(3600)));
  }

  #[test]
  fn test_recent_entry_is_fresh() {
    let entry = CacheEntry {
      settled_at: Some(Instant::now()),
      ..Default::default()
    };
    assert!(!entry.is_stale(Duration::from_secs(3600)));
    assert!(entry.is_stale(Duration::ZERO));
  }
}
