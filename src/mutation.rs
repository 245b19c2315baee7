//! Write operations and the cache invalidation that follows them.
//!
//! A mutation runs exactly once per dispatch. On success every target it
//! lists is invalidated in the [`QueryStore`] and a success notification is
//! raised; on failure the store is left untouched and the error message is
//! raised instead. Destructive mutations can only be dispatched through a
//! [`PendingConfirmation`].

use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::future::Future;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::notify::Notifications;
use crate::query::{InvalidationTarget, QueryKey, QueryStore};

/// A type-erased write. Errors are already rendered for display.
pub type MutationFuture = BoxFuture<'static, Result<(), String>>;

fn erase<Fut, T, E>(future: Fut) -> MutationFuture
where
  Fut: Future<Output = Result<T, E>> + Send + 'static,
  T: Send + 'static,
  E: Display + Send + 'static,
{
  future
    .map(|result| result.map(|_| ()).map_err(|e| e.to_string()))
    .boxed()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
  Create,
  Update,
  Delete,
  /// Server-side operation such as running a backup job
  Run,
}

impl MutationKind {
  fn verb(&self) -> &'static str {
    match self {
      MutationKind::Create => "Create",
      MutationKind::Update => "Update",
      MutationKind::Delete => "Delete",
      MutationKind::Run => "Run",
    }
  }

  fn past_tense(&self) -> &'static str {
    match self {
      MutationKind::Create => "Created",
      MutationKind::Update => "Updated",
      MutationKind::Delete => "Deleted",
      MutationKind::Run => "Completed",
    }
  }
}

/// Description of a pending write and what it invalidates.
#[derive(Debug, Clone)]
pub struct MutationRequest {
  resource: String,
  kind: MutationKind,
  description: String,
  invalidates: Vec<InvalidationTarget>,
  success_message: Option<String>,
  destructive: bool,
}

impl MutationRequest {
  /// Deletes are destructive by default; everything else is not.
  pub fn new(kind: MutationKind, resource: impl Into<String>, description: impl Into<String>) -> Self {
    Self {
      resource: resource.into(),
      kind,
      description: description.into(),
      invalidates: Vec::new(),
      success_message: None,
      destructive: kind == MutationKind::Delete,
    }
  }

  pub fn create(resource: impl Into<String>, description: impl Into<String>) -> Self {
    Self::new(MutationKind::Create, resource, description)
  }

  pub fn update(resource: impl Into<String>, description: impl Into<String>) -> Self {
    Self::new(MutationKind::Update, resource, description)
  }

  pub fn delete(resource: impl Into<String>, description: impl Into<String>) -> Self {
    Self::new(MutationKind::Delete, resource, description)
  }

  pub fn run(resource: impl Into<String>, description: impl Into<String>) -> Self {
    Self::new(MutationKind::Run, resource, description)
  }

  pub fn invalidates(mut self, target: impl Into<InvalidationTarget>) -> Self {
    self.invalidates.push(target.into());
    self
  }

  pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
    self.success_message = Some(message.into());
    self
  }

  /// Require confirmation before dispatch.
  pub fn destructive(mut self) -> Self {
    self.destructive = true;
    self
  }

  pub fn requires_confirmation(&self) -> bool {
    self.destructive
  }

  pub fn kind(&self) -> MutationKind {
    self.kind
  }

  pub fn resource(&self) -> &str {
    &self.resource
  }

  pub fn description(&self) -> &str {
    &self.description
  }

  pub fn targets(&self) -> &[InvalidationTarget] {
    &self.invalidates
  }

  pub fn success_message(&self) -> String {
    self
      .success_message
      .clone()
      .unwrap_or_else(|| format!("{} {}", self.kind.past_tense(), self.description))
  }
}

impl fmt::Display for MutationRequest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.kind.verb(), self.description)
  }
}

#[derive(Debug, Error)]
pub enum MutationError {
  #[error("{0} needs confirmation before it is sent")]
  ConfirmationRequired(String),
}

/// A destructive mutation waiting for the user to say yes.
///
/// The request future is not started until [`PendingConfirmation::confirm`]
/// and the result is handed to [`MutationDispatcher::dispatch_confirmed`].
/// Dropping it cancels the operation.
pub struct PendingConfirmation {
  request: MutationRequest,
  future: MutationFuture,
}

impl PendingConfirmation {
  pub fn new<Fut, T, E>(request: MutationRequest, future: Fut) -> Self
  where
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
  {
    Self {
      request,
      future: erase(future),
    }
  }

  pub fn request(&self) -> &MutationRequest {
    &self.request
  }

  /// Question shown to the user, e.g. "Delete organization 'Acme'?".
  pub fn prompt(&self) -> String {
    format!("{}?", self.request)
  }

  pub fn confirm(self) -> Confirmed {
    Confirmed {
      request: self.request,
      future: self.future,
    }
  }
}

impl fmt::Debug for PendingConfirmation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PendingConfirmation")
      .field("request", &self.request)
      .finish_non_exhaustive()
  }
}

/// Proof that the user confirmed a destructive mutation.
pub struct Confirmed {
  request: MutationRequest,
  future: MutationFuture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationId(u64);

#[derive(Debug, Clone)]
pub enum MutationOutcome {
  Succeeded {
    id: MutationId,
    request: MutationRequest,
    invalidated: Vec<QueryKey>,
  },
  Failed {
    id: MutationId,
    request: MutationRequest,
    message: String,
  },
}

impl MutationOutcome {
  pub fn id(&self) -> MutationId {
    match self {
      MutationOutcome::Succeeded { id, .. } | MutationOutcome::Failed { id, .. } => *id,
    }
  }

  pub fn is_success(&self) -> bool {
    matches!(self, MutationOutcome::Succeeded { .. })
  }
}

struct Finished {
  id: MutationId,
  result: Result<(), String>,
}

/// Runs mutations and applies their outcome to the store.
pub struct MutationDispatcher {
  pending: HashMap<MutationId, MutationRequest>,
  next_id: u64,
  tx: mpsc::UnboundedSender<Finished>,
  rx: mpsc::UnboundedReceiver<Finished>,
}

impl Default for MutationDispatcher {
  fn default() -> Self {
    Self::new()
  }
}

impl MutationDispatcher {
  pub fn new() -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      pending: HashMap::new(),
      next_id: 0,
      tx,
      rx,
    }
  }

  /// Dispatch a non-destructive mutation.
  pub fn dispatch<Fut, T, E>(
    &mut self,
    request: MutationRequest,
    future: Fut,
  ) -> Result<MutationId, MutationError>
  where
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
  {
    if request.requires_confirmation() {
      return Err(MutationError::ConfirmationRequired(request.to_string()));
    }
    Ok(self.spawn(request, erase(future)))
  }

  /// Dispatch a mutation the user has confirmed.
  pub fn dispatch_confirmed(&mut self, confirmed: Confirmed) -> MutationId {
    self.spawn(confirmed.request, confirmed.future)
  }

  fn spawn(&mut self, request: MutationRequest, future: MutationFuture) -> MutationId {
    self.next_id += 1;
    let id = MutationId(self.next_id);
    let tx = self.tx.clone();

    info!(mutation = %request, resource = request.resource(), "dispatching mutation");
    self.pending.insert(id, request);

    tokio::spawn(async move {
      let result = future.await;
      let _ = tx.send(Finished { id, result });
    });
    id
  }

  pub fn pending_count(&self) -> usize {
    self.pending.len()
  }

  pub fn is_pending(&self, id: MutationId) -> bool {
    self.pending.contains_key(&id)
  }

  /// Apply every finished mutation.
  pub fn poll(
    &mut self,
    store: &mut QueryStore,
    notifications: &mut Notifications,
  ) -> Vec<MutationOutcome> {
    let mut outcomes = Vec::new();
    while let Ok(finished) = self.rx.try_recv() {
      if let Some(outcome) = self.finish(finished, store, notifications) {
        outcomes.push(outcome);
      }
    }
    outcomes
  }

  /// Wait for the next mutation to finish and apply it.
  ///
  /// Returns None immediately when nothing is pending.
  pub async fn settle(
    &mut self,
    store: &mut QueryStore,
    notifications: &mut Notifications,
  ) -> Option<MutationOutcome> {
    while !self.pending.is_empty() {
      let finished = self.rx.recv().await?;
      if let Some(outcome) = self.finish(finished, store, notifications) {
        return Some(outcome);
      }
    }
    None
  }

  fn finish(
    &mut self,
    finished: Finished,
    store: &mut QueryStore,
    notifications: &mut Notifications,
  ) -> Option<MutationOutcome> {
    let request = self.pending.remove(&finished.id)?;

    match finished.result {
      Ok(()) => {
        let invalidated: Vec<QueryKey> = request
          .targets()
          .iter()
          .flat_map(|target| store.invalidate(target))
          .collect();
        info!(mutation = %request, invalidated = invalidated.len(), "mutation succeeded");
        notifications.success(request.success_message());
        Some(MutationOutcome::Succeeded {
          id: finished.id,
          request,
          invalidated,
        })
      }
      Err(message) => {
        warn!(mutation = %request, error = %message, "mutation failed");
        notifications.error(message.clone());
        Some(MutationOutcome::Failed {
          id: finished.id,
          request,
          message,
        })
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::notify::Level;
  use crate::query::{Payload, PayloadFuture};
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;

  fn ready(value: u32) -> PayloadFuture {
    async move { Ok::<Payload, String>(Arc::new(value)) }.boxed()
  }

  async fn seeded_store(keys: &[&QueryKey]) -> QueryStore {
    let mut store = QueryStore::new();
    for key in keys {
      store.fetch(key, || ready(1));
      store.settle().await;
    }
    store
  }

  #[tokio::test]
  async fn test_success_invalidates_listed_keys_only() {
    let k1 = QueryKey::new("dependencies").with("page", 1);
    let k2 = QueryKey::new("entities").with("page", 1);
    let k3 = QueryKey::new("labels").with("page", 1);
    let mut store = seeded_store(&[&k1, &k2, &k3]).await;
    let mut notes = Notifications::default();
    let mut dispatcher = MutationDispatcher::new();

    let request = MutationRequest::create("dependencies", "dependency 1 -> 2")
      .invalidates(k1.clone())
      .invalidates(k2.clone());
    dispatcher
      .dispatch(request, async { Ok::<_, String>(()) })
      .unwrap();

    let outcome = dispatcher.settle(&mut store, &mut notes).await.unwrap();
    match outcome {
      MutationOutcome::Succeeded { invalidated, .. } => assert_eq!(invalidated.len(), 2),
      other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(store.entry(&k1).unwrap().is_invalidated());
    assert!(store.entry(&k2).unwrap().is_invalidated());
    assert!(!store.entry(&k3).unwrap().is_invalidated());

    let note = notes.latest().unwrap();
    assert_eq!(note.level, Level::Success);
    assert_eq!(note.message, "Created dependency 1 -> 2");
  }

  #[tokio::test]
  async fn test_failure_leaves_store_untouched() {
    let key = QueryKey::new("organizations").with("page", 1);
    let mut store = seeded_store(&[&key]).await;
    let mut notes = Notifications::default();
    let mut dispatcher = MutationDispatcher::new();

    let request = MutationRequest::create("organizations", "organization 'Acme'")
      .invalidates(InvalidationTarget::resource("organizations"));
    dispatcher
      .dispatch(request, async {
        Err::<(), _>("Organization name already exists".to_string())
      })
      .unwrap();

    let outcome = dispatcher.settle(&mut store, &mut notes).await.unwrap();
    assert!(!outcome.is_success());
    assert!(!store.entry(&key).unwrap().is_invalidated());

    let note = notes.latest().unwrap();
    assert_eq!(note.level, Level::Error);
    assert_eq!(note.message, "Organization name already exists");
  }

  #[tokio::test]
  async fn test_failed_mutation_is_not_retried() {
    let mut store = QueryStore::new();
    let mut notes = Notifications::default();
    let mut dispatcher = MutationDispatcher::new();
    let attempts = Arc::new(AtomicU32::new(0));

    let counter = attempts.clone();
    dispatcher
      .dispatch(MutationRequest::create("labels", "label"), async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>("nope".to_string())
      })
      .unwrap();

    dispatcher.settle(&mut store, &mut notes).await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(dispatcher.poll(&mut store, &mut notes).is_empty());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(dispatcher.pending_count(), 0);
  }

  #[tokio::test]
  async fn test_delete_requires_confirmation() {
    let mut store = QueryStore::new();
    let mut notes = Notifications::default();
    let mut dispatcher = MutationDispatcher::new();
    let attempts = Arc::new(AtomicU32::new(0));

    let counter = attempts.clone();
    let request = MutationRequest::delete("labels", "label 'prod'");
    let err = dispatcher
      .dispatch(request.clone(), async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok::<_, String>(())
      })
      .unwrap_err();
    assert!(matches!(err, MutationError::ConfirmationRequired(_)));

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert_eq!(attempts.load(Ordering::SeqCst), 0);

    let counter = attempts.clone();
    let pending = PendingConfirmation::new(request, async move {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok::<_, String>(())
    });
    assert_eq!(pending.prompt(), "Delete label 'prod'?");

    dispatcher.dispatch_confirmed(pending.confirm());
    let outcome = dispatcher.settle(&mut store, &mut notes).await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_dropped_confirmation_never_runs() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let pending = PendingConfirmation::new(
      MutationRequest::delete("tenants", "tenant 'legacy'"),
      async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok::<_, String>(())
      },
    );
    drop(pending);
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert_eq!(attempts.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn test_custom_success_message() {
    let request = MutationRequest::run("backup_jobs", "backup job 'nightly'")
      .with_success_message("Dry run completed");
    assert_eq!(request.success_message(), "Dry run completed");
    assert!(!request.requires_confirmation());
    assert!(request.clone().destructive().requires_confirmation());
  }
}
