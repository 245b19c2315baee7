use crate::query::QueryStatus;
use ratatui::prelude::Color;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Border colour for a panel showing a query in this state
pub fn status_color(status: QueryStatus) -> Color {
  match status {
    QueryStatus::Loading => Color::Yellow,
    QueryStatus::Error => Color::Red,
    QueryStatus::Success | QueryStatus::Idle => Color::Blue,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("überwachung", 6), "übe...");
  }

  #[test]
  fn test_status_color() {
    assert_eq!(status_color(QueryStatus::Error), Color::Red);
    assert_eq!(status_color(QueryStatus::Loading), Color::Yellow);
    assert_eq!(status_color(QueryStatus::Success), Color::Blue);
  }
}
