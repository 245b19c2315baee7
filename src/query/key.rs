//! Structural identity for cached server-state fetches.
//!
//! A [`QueryKey`] is a resource tag plus a sorted map of parameters. Two keys
//! built from the same tag and values are equal no matter in which order the
//! parameters were added, so pages that ask for the same data share one
//! cache entry.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Identity of a cached fetch: resource tag + parameter values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
  resource: String,
  params: BTreeMap<String, String>,
}

impl QueryKey {
  /// Create a key for a resource with no parameters.
  pub fn new(resource: impl Into<String>) -> Self {
    Self {
      resource: resource.into(),
      params: BTreeMap::new(),
    }
  }

  /// Add (or replace) a parameter.
  pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
    self.params.insert(name.into(), value.to_string());
    self
  }

  /// Add a parameter only when a value is present.
  pub fn with_opt<V: ToString>(self, name: impl Into<String>, value: Option<V>) -> Self {
    match value {
      Some(v) => self.with(name, v),
      None => self,
    }
  }

  pub fn resource(&self) -> &str {
    &self.resource
  }

  pub fn param(&self, name: &str) -> Option<&str> {
    self.params.get(name).map(String::as_str)
  }

  pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
    self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  /// Short stable digest of the key, used to correlate log lines.
  pub fn fingerprint(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.to_string().as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..12].to_string()
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.resource)?;
    if self.params.is_empty() {
      return Ok(());
    }
    write!(f, "{{")?;
    for (i, (name, value)) in self.params.iter().enumerate() {
      if i > 0 {
        write!(f, ",")?;
      }
      write!(f, "{}={}", name, value)?;
    }
    write!(f, "}}")
  }
}

/// Which cache entries a successful mutation marks stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationTarget {
  /// Exactly this key
  Key(QueryKey),
  /// Every key whose resource tag matches (all pages, all filters)
  Resource(String),
}

impl InvalidationTarget {
  pub fn resource(tag: impl Into<String>) -> Self {
    Self::Resource(tag.into())
  }

  pub fn matches(&self, key: &QueryKey) -> bool {
    match self {
      Self::Key(k) => k == key,
      Self::Resource(tag) => key.resource() == tag,
    }
  }
}

impl From<QueryKey> for InvalidationTarget {
  fn from(key: QueryKey) -> Self {
    Self::Key(key)
  }
}

impl fmt::Display for InvalidationTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Key(k) => write!(f, "{}", k),
      Self::Resource(tag) => write!(f, "{}/*", tag),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn test_equality_ignores_construction_order() {
    let a = QueryKey::new("entities").with("page", 2).with("type", "service");
    let b = QueryKey::new("entities").with("type", "service").with("page", 2);
    assert_eq!(a, b);

    let mut set = HashSet::new();
    set.insert(a);
    assert!(set.contains(&b));
  }

  #[test]
  fn test_different_values_are_different_keys() {
    let a = QueryKey::new("entities").with("page", 1);
    let b = QueryKey::new("entities").with("page", 2);
    let c = QueryKey::new("organizations").with("page", 1);
    assert_ne!(a, b);
    assert_ne!(a, c);
  }

  #[test]
  fn test_with_opt_skips_missing_values() {
    let key = QueryKey::new("logs").with_opt("q", None::<&str>);
    assert_eq!(key, QueryKey::new("logs"));
    assert_eq!(key.param("q"), None);
  }

  #[test]
  fn test_display_is_canonical() {
    let key = QueryKey::new("labels").with("per_page", 50).with("page", 1);
    assert_eq!(key.to_string(), "labels{page=1,per_page=50}");
    assert_eq!(QueryKey::new("health").to_string(), "health");
  }

  #[test]
  fn test_fingerprint_is_stable() {
    let a = QueryKey::new("entities").with("page", 1).with("q", "db");
    let b = QueryKey::new("entities").with("q", "db").with("page", 1);
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.fingerprint().len(), 12);
  }

  #[test]
  fn test_resource_target_matches_every_page() {
    let target = InvalidationTarget::resource("dependencies");
    assert!(target.matches(&QueryKey::new("dependencies").with("page", 1)));
    assert!(target.matches(&QueryKey::new("dependencies").with("page", 3)));
    assert!(!target.matches(&QueryKey::new("entities").with("page", 1)));
  }

  #[test]
  fn test_key_target_matches_exactly() {
    let key = QueryKey::new("dependencies").with("page", 1);
    let target = InvalidationTarget::from(key.clone());
    assert!(target.matches(&key));
    assert!(!target.matches(&QueryKey::new("dependencies").with("page", 2)));
  }
}
