//! Ephemeral per-page filter and search state.
//!
//! Nothing here is persisted: a page creates its state on mount and drops it
//! on unmount. Changing a value changes the page's query key, which is what
//! makes the page refetch.

use std::collections::BTreeMap;

use crate::query::QueryKey;

/// Named filter values with defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
  defaults: BTreeMap<String, String>,
  values: BTreeMap<String, String>,
}

impl FilterState {
  pub fn new() -> Self {
    Self::default()
  }

  /// Declare a filter with its default value.
  pub fn with_default(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    let name = name.into();
    let value = value.into();
    self.values.insert(name.clone(), value.clone());
    self.defaults.insert(name, value);
    self
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.values.get(name).map(String::as_str)
  }

  /// Set a value. Returns true when it actually changed.
  pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
    let name = name.into();
    let value = value.into();
    if self.values.get(&name) == Some(&value) {
      return false;
    }
    self.values.insert(name, value);
    true
  }

  /// Revert a single filter to its default (or remove it).
  pub fn unset(&mut self, name: &str) -> bool {
    let before = self.values.get(name).cloned();
    match self.defaults.get(name) {
      Some(default) => {
        self.values.insert(name.to_string(), default.clone());
      }
      None => {
        self.values.remove(name);
      }
    }
    before.as_ref() != self.values.get(name)
  }

  /// Back to defaults, as on a fresh mount.
  pub fn reset(&mut self) {
    self.values = self.defaults.clone();
  }

  pub fn is_default(&self) -> bool {
    self.values == self.defaults
  }

  /// Non-empty values as request parameters.
  pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .values
      .iter()
      .filter(|(_, v)| !v.is_empty())
      .map(|(k, v)| (k.as_str(), v.as_str()))
  }

  /// Fold the non-empty values into a query key.
  pub fn apply_to(&self, key: QueryKey) -> QueryKey {
    self.params().fold(key, |key, (name, value)| key.with(name, value))
  }
}

/// Retrieval mode of a page that has both a listing and a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
  #[default]
  Listing,
  Searching,
}

/// `Listing` / `Searching` state machine.
///
/// `Listing -> Searching` on a non-empty submission, `Searching -> Listing`
/// when the term is cleared. An empty submission never enters `Searching`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
  mode: SearchMode,
  term: String,
}

impl SearchState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn mode(&self) -> SearchMode {
    self.mode
  }

  pub fn is_searching(&self) -> bool {
    self.mode == SearchMode::Searching
  }

  /// The active term; None while listing.
  pub fn term(&self) -> Option<&str> {
    match self.mode {
      SearchMode::Searching => Some(&self.term),
      SearchMode::Listing => None,
    }
  }

  /// Submit a term. Blank terms behave like `clear()`.
  pub fn submit(&mut self, term: &str) -> SearchMode {
    let term = term.trim();
    if term.is_empty() {
      self.clear();
    } else {
      self.term = term.to_string();
      self.mode = SearchMode::Searching;
    }
    self.mode
  }

  pub fn clear(&mut self) {
    self.term.clear();
    self.mode = SearchMode::Listing;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_search_starts_listing() {
    let state = SearchState::new();
    assert_eq!(state.mode(), SearchMode::Listing);
    assert_eq!(state.term(), None);
  }

  #[test]
  fn test_non_empty_submit_enters_searching() {
    let mut state = SearchState::new();
    assert_eq!(state.submit("  postgres "), SearchMode::Searching);
    assert_eq!(state.term(), Some("postgres"));
  }

  #[test]
  fn test_empty_submit_stays_listing() {
    let mut state = SearchState::new();
    assert_eq!(state.submit("   "), SearchMode::Listing);
    assert_eq!(state.term(), None);
  }

  #[test]
  fn test_clear_returns_to_listing() {
    let mut state = SearchState::new();
    state.submit("redis");
    state.clear();
    assert_eq!(state.mode(), SearchMode::Listing);
    assert_eq!(state.term(), None);

    state.submit("redis");
    assert_eq!(state.submit(""), SearchMode::Listing);
  }

  #[test]
  fn test_filter_set_reports_change() {
    let mut filters = FilterState::new().with_default("entity_type", "");
    assert!(filters.set("entity_type", "service"));
    assert!(!filters.set("entity_type", "service"));
    assert_eq!(filters.get("entity_type"), Some("service"));
  }

  #[test]
  fn test_filter_reset_restores_defaults() {
    let mut filters = FilterState::new().with_default("status", "active");
    filters.set("status", "archived");
    filters.set("owner", "ops");
    assert!(!filters.is_default());

    filters.reset();
    assert!(filters.is_default());
    assert_eq!(filters.get("owner"), None);
  }

  #[test]
  fn test_filter_unset() {
    let mut filters = FilterState::new().with_default("status", "active");
    filters.set("status", "archived");
    filters.set("owner", "ops");
    assert!(filters.unset("status"));
    assert!(filters.unset("owner"));
    assert!(!filters.unset("owner"));
    assert_eq!(filters.get("status"), Some("active"));
  }

  #[test]
  fn test_apply_to_skips_empty_values() {
    let mut filters = FilterState::new().with_default("entity_type", "");
    let base = QueryKey::new("entities").with("page", 1);
    assert_eq!(filters.apply_to(base.clone()), base);

    filters.set("entity_type", "database");
    assert_eq!(
      filters.apply_to(base.clone()),
      base.with("entity_type", "database")
    );
  }
}
