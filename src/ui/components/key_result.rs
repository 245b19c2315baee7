/// What a component did with a key.
///
/// Prompts and dialogs return this so the owning view (or the app, for the
/// command prompt) can tell "swallowed" apart from "yours to handle".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed with nothing to report
  Handled,
  /// Consumed, and the parent has something to act on
  Event(T),
  /// Not for this component
  NotHandled,
}

impl<T> KeyResult<T> {
  /// True unless the key should fall through to the next handler
  pub fn is_consumed(&self) -> bool {
    !matches!(self, KeyResult::NotHandled)
  }
}
