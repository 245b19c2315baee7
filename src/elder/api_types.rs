//! Serde models for Elder API requests and responses.
//!
//! Every endpoint decodes into one of these at the client boundary, so a
//! malformed payload becomes an error there instead of travelling into the
//! pages.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
  pub status: String,
  pub service: String,
}

/// Paginated listing: `{items, total}`. Extra fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
  pub items: Vec<T>,
  pub total: u64,
}

impl<T> Default for ListResponse<T> {
  fn default() -> Self {
    Self {
      items: Vec::new(),
      total: 0,
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogsResponse {
  pub lines: Vec<String>,
  #[serde(default)]
  pub total: Option<u64>,
  #[serde(default)]
  pub total_matches: Option<u64>,
  #[serde(default)]
  pub query: Option<String>,
  #[serde(default)]
  pub log_file: Option<String>,
}

/// Response of backup run/restore: `{dry_run, ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRunResponse {
  #[serde(default)]
  pub dry_run: bool,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}

/// Structured error body. Elder services are not consistent about the field.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
  #[serde(default)]
  pub error: Option<Value>,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub detail: Option<String>,
}

impl ErrorBody {
  pub fn into_message(self) -> Option<String> {
    let from_error = match self.error {
      Some(Value::String(s)) => Some(s),
      Some(Value::Object(map)) => map
        .get("message")
        .and_then(Value::as_str)
        .map(String::from),
      _ => None,
    };
    from_error
      .or(self.message)
      .or(self.detail)
      .filter(|m| !m.trim().is_empty())
  }
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewDependency {
  pub source_entity_id: i64,
  pub target_entity_id: i64,
  pub dependency_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditExportRequest {
  pub start_date: String,
  pub end_date: String,
  pub format: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RestoreRequest {
  pub dry_run: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_list_response_requires_items() {
    let ok: ListResponse<Value> =
      serde_json::from_str(r#"{"items": [{"id": 1}], "total": 1, "page": 1}"#).unwrap();
    assert_eq!(ok.items.len(), 1);

    let missing = serde_json::from_str::<ListResponse<Value>>(r#"{"total": 1}"#);
    assert!(missing.is_err());
  }

  #[test]
  fn test_logs_optional_fields() {
    let logs: LogsResponse = serde_json::from_str(r#"{"lines": ["a", "b"]}"#).unwrap();
    assert_eq!(logs.lines.len(), 2);
    assert_eq!(logs.total_matches, None);
  }

  #[test]
  fn test_backup_response_keeps_extra_fields() {
    let resp: BackupRunResponse =
      serde_json::from_str(r#"{"dry_run": true, "restored_tables": 4}"#).unwrap();
    assert!(resp.dry_run);
    assert_eq!(resp.extra.get("restored_tables"), Some(&Value::from(4)));
  }

  #[test]
  fn test_error_body_variants() {
    let nested: ErrorBody =
      serde_json::from_str(r#"{"error": {"message": "quota exceeded"}}"#).unwrap();
    assert_eq!(nested.into_message().as_deref(), Some("quota exceeded"));

    let blank: ErrorBody = serde_json::from_str(r#"{"message": "  "}"#).unwrap();
    assert_eq!(blank.into_message(), None);
  }
}
