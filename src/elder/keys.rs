//! Query keys for Elder endpoints and the invalidation sets mutations use.
//!
//! Listing and search keys for a resource share its tag, so invalidating
//! the resource refreshes whichever mode a page is in.

use std::collections::BTreeMap;

use crate::filter::FilterState;
use crate::pagination::Pagination;
use crate::query::{InvalidationTarget, QueryKey};

use super::types::Resource;

/// Parameters of a paginated listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
  pub page: u64,
  pub per_page: u64,
  pub filters: BTreeMap<String, String>,
}

impl ListParams {
  pub fn new(page: u64, per_page: u64) -> Self {
    Self {
      page: page.max(1),
      per_page: per_page.max(1),
      filters: BTreeMap::new(),
    }
  }

  /// Snapshot the page's pagination and filter state.
  pub fn from_state(pagination: &Pagination, filters: &FilterState) -> Self {
    let mut params = Self::new(pagination.page(), pagination.per_page());
    params.filters = filters
      .params()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    params
  }

  pub fn filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.filters.insert(name.into(), value.into());
    self
  }

  /// Query-string pairs in a stable order.
  pub fn query_pairs(&self) -> Vec<(String, String)> {
    let mut pairs = vec![
      ("page".to_string(), self.page.to_string()),
      ("per_page".to_string(), self.per_page.to_string()),
    ];
    pairs.extend(self.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
    pairs
  }

  pub fn to_key(&self, resource: Resource) -> QueryKey {
    self
      .filters
      .iter()
      .fold(QueryKey::new(resource.tag()), |key, (k, v)| key.with(k.as_str(), v))
      .with("page", self.page)
      .with("per_page", self.per_page)
  }
}

impl Default for ListParams {
  fn default() -> Self {
    Self::new(1, crate::pagination::DEFAULT_PAGE_SIZE)
  }
}

/// Key of a search over a resource. The term is part of the identity.
pub fn search_key(resource: Resource, term: &str, params: &ListParams) -> QueryKey {
  params.to_key(resource).with("q", term)
}

pub fn profile_key() -> QueryKey {
  QueryKey::new("profile")
}

pub fn health_key() -> QueryKey {
  QueryKey::new("health")
}

pub fn logs_key(lines: u32) -> QueryKey {
  QueryKey::new("logs").with("lines", lines)
}

pub fn logs_search_key(term: &str, lines: u32) -> QueryKey {
  logs_key(lines).with("q", term)
}

// ============================================================================
// Invalidation sets
// ============================================================================

/// What deleting a row of `resource` makes stale.
pub fn delete_invalidations(resource: Resource) -> Vec<InvalidationTarget> {
  let mut targets = vec![InvalidationTarget::Resource(resource.tag().to_string())];
  let related: &[Resource] = match resource {
    Resource::Organizations => &[Resource::Entities],
    Resource::Entities => &[Resource::Dependencies],
    Resource::BackupJobs => &[Resource::Backups],
    _ => &[],
  };
  targets.extend(
    related
      .iter()
      .map(|r| InvalidationTarget::Resource(r.tag().to_string())),
  );
  targets
}

pub fn dependency_create_invalidations() -> Vec<InvalidationTarget> {
  vec![InvalidationTarget::Resource(
    Resource::Dependencies.tag().to_string(),
  )]
}

pub fn backup_run_invalidations() -> Vec<InvalidationTarget> {
  vec![
    InvalidationTarget::Resource(Resource::BackupJobs.tag().to_string()),
    InvalidationTarget::Resource(Resource::Backups.tag().to_string()),
  ]
}

/// A dry run changes nothing; a real restore can change every resource.
pub fn restore_invalidations(dry_run: bool) -> Vec<InvalidationTarget> {
  if dry_run {
    return Vec::new();
  }
  Resource::ALL
    .iter()
    .map(|r| InvalidationTarget::Resource(r.tag().to_string()))
    .collect()
}
