//! State shared by every page: the API client, the query store, the
//! mutation dispatcher and the notification queue.

use crate::config::Config;
use crate::elder::api_types::Health;
use crate::elder::keys;
use crate::elder::types::Profile;
use crate::elder::ElderClient;
use crate::mutation::{
  Confirmed, MutationDispatcher, MutationError, MutationId, MutationOutcome, MutationRequest,
};
use crate::notify::Notifications;
use crate::query::{Gate, QueryObserver, QuerySnapshot, QueryStore};
use std::fmt::Display;
use std::future::Future;
use tracing::info;

pub struct AppContext {
  pub client: ElderClient,
  pub config: Config,
  pub store: QueryStore,
  pub mutations: MutationDispatcher,
  pub notifications: Notifications,
  profile: QueryObserver<Profile>,
  health: QueryObserver<Health>,
}

impl AppContext {
  pub fn new(client: ElderClient, config: Config) -> Self {
    let store = QueryStore::new().with_stale_time(config.stale_time());
    let notifications = Notifications::new(config.notification_ttl());

    let c = client.clone();
    let profile = QueryObserver::new(keys::profile_key(), move || {
      let c = c.clone();
      async move { c.profile().await }
    });

    let c = client.clone();
    let health = QueryObserver::new(keys::health_key(), move || {
      let c = c.clone();
      async move { c.health().await }
    });

    Self {
      client,
      config,
      store,
      mutations: MutationDispatcher::new(),
      notifications,
      profile,
      health,
    }
  }

  /// Apply finished fetches and mutations. Called once per event-loop tick
  /// before the active page syncs its own observers.
  pub fn tick(&mut self) -> Vec<MutationOutcome> {
    self.store.poll();
    let outcomes = self
      .mutations
      .poll(&mut self.store, &mut self.notifications);
    self.profile.sync(&mut self.store);
    self.health.sync(&mut self.store);
    self.notifications.expire();
    outcomes
  }

  pub fn profile(&self) -> QuerySnapshot<Profile> {
    self.profile.snapshot(&self.store)
  }

  pub fn health(&self) -> QuerySnapshot<Health> {
    self.health.snapshot(&self.store)
  }

  /// Whether administrator pages may fetch.
  ///
  /// Pending until the profile request settles. A failed profile lookup
  /// counts as not an administrator.
  pub fn admin_gate(&self) -> Gate {
    admin_gate(&self.profile())
  }

  /// Send a mutation, or report that it first needs confirmation.
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
    self.mutations.dispatch(request, future)
  }

  pub fn dispatch_confirmed(&mut self, confirmed: Confirmed) -> MutationId {
    self.mutations.dispatch_confirmed(confirmed)
  }

  /// Tear down every cached result and in-flight fetch.
  pub fn logout(&mut self) {
    info!(entries = self.store.len(), "clearing query store");
    self.store.clear();
    self.notifications.info("Signed out, cached data cleared");
  }
}

pub(crate) fn admin_gate(profile: &QuerySnapshot<Profile>) -> Gate {
  match profile.gate {
    Gate::Resolved => match profile.data() {
      Some(p) if p.is_admin() => Gate::Resolved,
      _ => Gate::Disabled,
    },
    other => other,
  }
}
