/// Whether a query is allowed to fetch, and whether it ever has.
///
/// Keeps "never fetched" apart from "fetched and empty", which a boolean
/// `enabled` flag cannot do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
  /// Predicate does not hold; no network call is made
  Disabled,
  /// Enabled, but no fetch has settled for the current key yet
  Pending,
  /// At least one fetch for the current key has settled
  Resolved,
}

impl Gate {
  pub fn is_disabled(&self) -> bool {
    matches!(self, Gate::Disabled)
  }

  pub fn is_resolved(&self) -> bool {
    matches!(self, Gate::Resolved)
  }
}
