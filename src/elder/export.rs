//! Writing exported audit documents to disk.

use chrono::{DateTime, NaiveDate, Utc};
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// `audit-logs-<YYYY-MM-DD>.json`
pub fn export_file_name(date: NaiveDate) -> String {
  format!("audit-logs-{}.json", date.format("%Y-%m-%d"))
}

/// Date an export is named for: the UTC calendar day it was taken.
pub fn export_date(now: DateTime<Utc>) -> NaiveDate {
  now.date_naive()
}

/// Write `document` off the async runtime, named for `date`.
pub async fn save_audit_export(dir: PathBuf, document: Value, date: NaiveDate) -> Result<PathBuf> {
  tokio::task::spawn_blocking(move || write_audit_export_on(&dir, &document, date))
    .await
    .map_err(|e| eyre!("Export writer stopped: {}", e))?
}

pub fn write_audit_export_on(dir: &Path, document: &Value, date: NaiveDate) -> Result<PathBuf> {
  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create export directory {}: {}", dir.display(), e))?;

  let path = dir.join(export_file_name(date));
  let contents = serde_json::to_string_pretty(document)?;
  std::fs::write(&path, contents)
    .map_err(|e| eyre!("Failed to write {}: {}", path.display(), e))?;
  Ok(path)
}
