//! Per-page view of a query in the shared store.
//!
//! Inspired by TanStack Query's `useQuery`: a page owns a `QueryObserver<T>`
//! holding the current key and fetch function, calls `sync()` on every tick
//! and reads a typed [`QuerySnapshot`] when rendering.
//!
//! # Example
//!
//! ```ignore
//! let client = elder.clone();
//! let mut labels = QueryObserver::new(params.to_key(Resource::Labels), move || {
//!     let client = client.clone();
//!     let params = params.clone();
//!     async move { client.list::<Label>(&params).await }
//! });
//!
//! // In the tick handler
//! labels.sync(&mut store);
//!
//! // In render
//! let snapshot = labels.snapshot(&store);
//! ```

use futures::FutureExt;
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use super::entry::{Payload, QuerySnapshot};
use super::gate::Gate;
use super::key::QueryKey;
use super::store::{PayloadFuture, QueryStore};

type FetcherFn = Box<dyn Fn() -> PayloadFuture + Send + Sync>;

fn erase<T, F, Fut, E>(fetcher: F) -> FetcherFn
where
  T: Any + Send + Sync,
  F: Fn() -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<T, E>> + Send + 'static,
  E: Display + Send + 'static,
{
  Box::new(move || {
    fetcher()
      .map(|result| {
        result
          .map(|value| Arc::new(value) as Payload)
          .map_err(|e| e.to_string())
      })
      .boxed()
  })
}

/// Binds a key, a fetch function and an enable predicate to the store.
///
/// A fetch is issued when the key is first observed or changes (unless a
/// fresh result or in-flight fetch already exists), when the entry has been
/// invalidated, or when the optional refetch interval has elapsed.
pub struct QueryObserver<T> {
  key: QueryKey,
  fetcher: FetcherFn,
  enabled: bool,
  refetch_interval: Option<Duration>,
  /// Key seen by the last `sync()`; differs from `key` after a change
  observed: Option<QueryKey>,
  _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> QueryObserver<T> {
  /// Create an enabled observer. Nothing is fetched until `sync()`.
  pub fn new<F, Fut, E>(key: QueryKey, fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: Display + Send + 'static,
  {
    Self {
      key,
      fetcher: erase(fetcher),
      enabled: true,
      refetch_interval: None,
      observed: None,
      _marker: PhantomData,
    }
  }

  /// Refetch whenever this much time has passed since the last result.
  pub fn with_refetch_interval(mut self, interval: Option<Duration>) -> Self {
    self.refetch_interval = interval;
    self
  }

  /// Start disabled; see [`QueryObserver::set_enabled`].
  pub fn disabled(mut self) -> Self {
    self.enabled = false;
    self
  }

  pub fn key(&self) -> &QueryKey {
    &self.key
  }

  pub fn is_enabled(&self) -> bool {
    self.enabled
  }

  /// Replace the key and the fetch function together.
  ///
  /// The next `sync()` treats the new key as newly observed.
  pub fn set_query<F, Fut, E>(&mut self, key: QueryKey, fetcher: F)
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: Display + Send + 'static,
  {
    self.key = key;
    self.fetcher = erase(fetcher);
  }

  /// Gate fetching on a predicate. Enabling counts as a fresh observation.
  pub fn set_enabled(&mut self, enabled: bool) {
    if enabled && !self.enabled {
      self.observed = None;
    }
    self.enabled = enabled;
  }

  pub fn set_refetch_interval(&mut self, interval: Option<Duration>) {
    self.refetch_interval = interval;
  }

  /// Issue a fetch if one is due. Returns true when a request was started.
  pub fn sync(&mut self, store: &mut QueryStore) -> bool {
    if !self.enabled {
      return false;
    }

    let fetcher = &self.fetcher;

    if self.observed.as_ref() != Some(&self.key) {
      self.observed = Some(self.key.clone());
      if !store.needs_fetch(&self.key) {
        return false;
      }
      return store.fetch(&self.key, || fetcher()).is_some();
    }

    if store.is_in_flight(&self.key) {
      return false;
    }

    let due = match store.entry(&self.key) {
      // Store was torn down underneath us
      None => true,
      Some(entry) if entry.is_invalidated() => true,
      // Another observer cancelled the shared fetch before it settled
      Some(entry) if entry.settled_at().is_none() => true,
      Some(entry) => match (self.refetch_interval, entry.settled_at()) {
        (Some(interval), Some(settled)) => settled.elapsed() >= interval,
        _ => false,
      },
    };

    due && store.fetch(&self.key, || fetcher()).is_some()
  }

  /// Force a fetch, superseding any in-flight one (user-requested refresh).
  pub fn refetch(&mut self, store: &mut QueryStore) -> bool {
    if !self.enabled {
      return false;
    }
    self.observed = Some(self.key.clone());
    store.refetch(&self.key, (self.fetcher)());
    true
  }

  /// Drop interest in the in-flight fetch, e.g. when the page goes away.
  pub fn cancel(&mut self, store: &mut QueryStore) {
    store.cancel(&self.key);
    self.observed = None;
  }

  pub fn gate(&self, store: &QueryStore) -> Gate {
    if !self.enabled {
      return Gate::Disabled;
    }
    match store.entry(&self.key).and_then(|e| e.settled_at()) {
      Some(_) => Gate::Resolved,
      None => Gate::Pending,
    }
  }

  /// Typed read of the current entry.
  pub fn snapshot(&self, store: &QueryStore) -> QuerySnapshot<T> {
    QuerySnapshot::from_entry(store.entry(&self.key), self.gate(store))
  }
}

impl<T> std::fmt::Debug for QueryObserver<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("QueryObserver")
      .field("key", &self.key)
      .field("enabled", &self.enabled)
      .field("refetch_interval", &self.refetch_interval)
      .finish_non_exhaustive()
  }
}
