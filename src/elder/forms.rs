//! Client-side validation of form input before any request is built.

use chrono::NaiveDate;
use thiserror::Error;

use super::api_types::{AuditExportRequest, NewDependency};

pub const DEPENDENCY_TYPES: [&str; 5] = ["depends_on", "related_to", "part_of", "calls", "hosts"];

pub const EXPORT_FORMAT: &str = "json";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
  #[error("{0} is required")]
  Missing(&'static str),

  #[error("{field} must be a number, got '{value}'")]
  NotANumber { field: &'static str, value: String },

  #[error("Source and target must be different entities")]
  SameEntity,

  #[error("Unknown dependency type '{0}'")]
  UnknownType(String),

  #[error("{field} must be a date (YYYY-MM-DD), got '{value}'")]
  InvalidDate { field: &'static str, value: String },

  #[error("End date is before start date")]
  EndBeforeStart,
}

fn parse_id(field: &'static str, raw: &str) -> Result<i64, FormError> {
  let raw = raw.trim();
  if raw.is_empty() {
    return Err(FormError::Missing(field));
  }
  raw
    .trim_start_matches('#')
    .parse()
    .map_err(|_| FormError::NotANumber {
      field,
      value: raw.to_string(),
    })
}

/// Raw text of the dependency form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDraft {
  pub source: String,
  pub target: String,
  pub dependency_type: String,
}

impl Default for DependencyDraft {
  fn default() -> Self {
    Self {
      source: String::new(),
      target: String::new(),
      dependency_type: DEPENDENCY_TYPES[0].to_string(),
    }
  }
}

impl DependencyDraft {
  pub fn validate(&self) -> Result<NewDependency, FormError> {
    let source = parse_id("Source entity", &self.source)?;
    let target = parse_id("Target entity", &self.target)?;
    if source == target {
      return Err(FormError::SameEntity);
    }

    let kind = self.dependency_type.trim();
    if kind.is_empty() {
      return Err(FormError::Missing("Dependency type"));
    }
    if !DEPENDENCY_TYPES.contains(&kind) {
      return Err(FormError::UnknownType(kind.to_string()));
    }

    Ok(NewDependency {
      source_entity_id: source,
      target_entity_id: target,
      dependency_type: kind.to_string(),
    })
  }
}

/// Cycle to the next dependency type; unknown values restart the list.
pub fn next_dependency_type(current: &str) -> &'static str {
  match DEPENDENCY_TYPES.iter().position(|t| *t == current) {
    Some(i) => DEPENDENCY_TYPES[(i + 1) % DEPENDENCY_TYPES.len()],
    None => DEPENDENCY_TYPES[0],
  }
}

/// Raw text of the audit export form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditExportDraft {
  pub start_date: String,
  pub end_date: String,
}

fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, FormError> {
  let raw = raw.trim();
  if raw.is_empty() {
    return Err(FormError::Missing(field));
  }
  NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| FormError::InvalidDate {
    field,
    value: raw.to_string(),
  })
}

impl AuditExportDraft {
  pub fn validate(&self) -> Result<AuditExportRequest, FormError> {
    let start = parse_date("Start date", &self.start_date)?;
    let end = parse_date("End date", &self.end_date)?;
    if end < start {
      return Err(FormError::EndBeforeStart);
    }
    Ok(AuditExportRequest {
      start_date: start.format("%Y-%m-%d").to_string(),
      end_date: end.format("%Y-%m-%d").to_string(),
      format: EXPORT_FORMAT.to_string(),
    })
  }
}
