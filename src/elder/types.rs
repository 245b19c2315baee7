//! Domain rows for each Elder resource.
//!
//! The backend owns these shapes; the console only needs an id, a label for
//! prompts and a handful of columns. Unknown fields are ignored.

use chrono::{DateTime, Local};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

// ============================================================================
// Resources
// ============================================================================

/// Every listable resource the console has a page for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
  Organizations,
  Entities,
  Dependencies,
  Labels,
  Rotations,
  AuditLogs,
  BackupJobs,
  Backups,
  SbomComponents,
  Tenants,
  Users,
}

impl Resource {
  pub const ALL: [Resource; 11] = [
    Resource::Organizations,
    Resource::Entities,
    Resource::Dependencies,
    Resource::Labels,
    Resource::Rotations,
    Resource::AuditLogs,
    Resource::BackupJobs,
    Resource::Backups,
    Resource::SbomComponents,
    Resource::Tenants,
    Resource::Users,
  ];

  /// Resource tag used in query keys.
  pub fn tag(&self) -> &'static str {
    match self {
      Resource::Organizations => "organizations",
      Resource::Entities => "entities",
      Resource::Dependencies => "dependencies",
      Resource::Labels => "labels",
      Resource::Rotations => "rotations",
      Resource::AuditLogs => "audit_logs",
      Resource::BackupJobs => "backup_jobs",
      Resource::Backups => "backups",
      Resource::SbomComponents => "sbom_components",
      Resource::Tenants => "tenants",
      Resource::Users => "users",
    }
  }

  /// Path below `/api/v1/`.
  pub fn path(&self) -> &'static str {
    match self {
      Resource::Organizations => "organizations",
      Resource::Entities => "entities",
      Resource::Dependencies => "dependencies",
      Resource::Labels => "labels",
      Resource::Rotations => "on-call/rotations",
      Resource::AuditLogs => "audit/logs",
      Resource::BackupJobs => "backup/jobs",
      Resource::Backups => "backup",
      Resource::SbomComponents => "sbom/components",
      Resource::Tenants => "admin/tenants",
      Resource::Users => "admin/users",
    }
  }

  /// Dedicated search endpoint, for resources that have one.
  pub fn search_path(&self) -> Option<&'static str> {
    match self {
      Resource::Organizations => Some("organizations/search"),
      Resource::Entities => Some("entities/search"),
      Resource::SbomComponents => Some("sbom/components/search"),
      _ => None,
    }
  }

  pub fn title(&self) -> &'static str {
    match self {
      Resource::Organizations => "Organizations",
      Resource::Entities => "Entities",
      Resource::Dependencies => "Dependencies",
      Resource::Labels => "Labels",
      Resource::Rotations => "On-Call Rotations",
      Resource::AuditLogs => "Audit Logs",
      Resource::BackupJobs => "Backup Jobs",
      Resource::Backups => "Backups",
      Resource::SbomComponents => "SBOM Components",
      Resource::Tenants => "Tenants",
      Resource::Users => "Users",
    }
  }

  /// Only fetched when the current user is an administrator.
  pub fn admin_only(&self) -> bool {
    matches!(self, Resource::Tenants | Resource::Users)
  }

  pub fn deletable(&self) -> bool {
    !matches!(self, Resource::AuditLogs | Resource::SbomComponents)
  }
}

/// A column in a resource table.
#[derive(Debug, Clone, Copy)]
pub struct Column {
  pub title: &'static str,
  pub width: u16,
}

const fn col(title: &'static str, width: u16) -> Column {
  Column { title, width }
}

/// Row type of a resource listing.
pub trait Listable: Clone + Send + Sync + DeserializeOwned + 'static {
  const RESOURCE: Resource;

  fn id(&self) -> i64;

  /// Human label used in prompts and notifications, e.g. "label 'prod'".
  fn label(&self) -> String;

  fn columns() -> &'static [Column];

  fn cells(&self) -> Vec<String>;
}

/// Render an ISO-8601 timestamp in local time. Unparseable input is shown as-is.
pub fn display_time(iso: &str) -> String {
  DateTime::parse_from_rfc3339(iso)
    .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
    .or_else(|_| {
      chrono::NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|dt| dt.and_utc().with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
    })
    .unwrap_or_else(|_| iso.to_string())
}

fn opt_time(iso: &Option<String>) -> String {
  iso.as_deref().map(display_time).unwrap_or_default()
}

fn opt(value: &Option<String>) -> String {
  value.clone().unwrap_or_default()
}

fn opt_id(value: &Option<i64>) -> String {
  value.map(|v| v.to_string()).unwrap_or_default()
}

fn yes_no(value: bool) -> String {
  if value { "yes" } else { "no" }.to_string()
}

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub parent_id: Option<i64>,
  #[serde(default)]
  pub created_at: Option<String>,
}

impl Listable for Organization {
  const RESOURCE: Resource = Resource::Organizations;

  fn id(&self) -> i64 {
    self.id
  }

  fn label(&self) -> String {
    format!("organization '{}'", self.name)
  }

  fn columns() -> &'static [Column] {
    const COLUMNS: &[Column] = &[
      col("ID", 6),
      col("Name", 28),
      col("Parent", 8),
      col("Created", 17),
      col("Description", 40),
    ];
    COLUMNS
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.id.to_string(),
      self.name.clone(),
      opt_id(&self.parent_id),
      opt_time(&self.created_at),
      opt(&self.description),
    ]
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub entity_type: String,
  #[serde(default)]
  pub organization_id: Option<i64>,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub updated_at: Option<String>,
}

impl Listable for Entity {
  const RESOURCE: Resource = Resource::Entities;

  fn id(&self) -> i64 {
    self.id
  }

  fn label(&self) -> String {
    format!("entity '{}'", self.name)
  }

  fn columns() -> &'static [Column] {
    const COLUMNS: &[Column] = &[
      col("ID", 6),
      col("Name", 28),
      col("Type", 14),
      col("Org", 6),
      col("Updated", 17),
    ];
    COLUMNS
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.id.to_string(),
      self.name.clone(),
      self.entity_type.clone(),
      opt_id(&self.organization_id),
      opt_time(&self.updated_at),
    ]
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
  pub id: i64,
  pub source_entity_id: i64,
  pub target_entity_id: i64,
  pub dependency_type: String,
  #[serde(default)]
  pub created_at: Option<String>,
}

impl Listable for Dependency {
  const RESOURCE: Resource = Resource::Dependencies;

  fn id(&self) -> i64 {
    self.id
  }

  fn label(&self) -> String {
    format!(
      "dependency {} -> {} ({})",
      self.source_entity_id, self.target_entity_id, self.dependency_type
    )
  }

  fn columns() -> &'static [Column] {
    const COLUMNS: &[Column] = &[
      col("ID", 6),
      col("Source", 8),
      col("Target", 8),
      col("Type", 14),
      col("Created", 17),
    ];
    COLUMNS
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.id.to_string(),
      format!("#{}", self.source_entity_id),
      format!("#{}", self.target_entity_id),
      self.dependency_type.clone(),
      opt_time(&self.created_at),
    ]
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub color: Option<String>,
  #[serde(default)]
  pub description: Option<String>,
}

impl Listable for Label {
  const RESOURCE: Resource = Resource::Labels;

  fn id(&self) -> i64 {
    self.id
  }

  fn label(&self) -> String {
    format!("label '{}'", self.name)
  }

  fn columns() -> &'static [Column] {
    const COLUMNS: &[Column] = &[
      col("ID", 6),
      col("Name", 24),
      col("Color", 9),
      col("Description", 40),
    ];
    COLUMNS
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.id.to_string(),
      self.name.clone(),
      opt(&self.color),
      opt(&self.description),
    ]
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub organization_id: Option<i64>,
  #[serde(default)]
  pub schedule_type: Option<String>,
  #[serde(default)]
  pub is_active: bool,
}

impl Listable for Rotation {
  const RESOURCE: Resource = Resource::Rotations;

  fn id(&self) -> i64 {
    self.id
  }

  fn label(&self) -> String {
    format!("rotation '{}'", self.name)
  }

  fn columns() -> &'static [Column] {
    const COLUMNS: &[Column] = &[
      col("ID", 6),
      col("Name", 28),
      col("Org", 6),
      col("Schedule", 12),
      col("Active", 7),
    ];
    COLUMNS
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.id.to_string(),
      self.name.clone(),
      opt_id(&self.organization_id),
      opt(&self.schedule_type),
      yes_no(self.is_active),
    ]
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
  pub id: i64,
  pub action: String,
  #[serde(default)]
  pub resource_type: Option<String>,
  #[serde(default)]
  pub resource_id: Option<i64>,
  #[serde(default)]
  pub identity: Option<String>,
  #[serde(default)]
  pub created_at: Option<String>,
}

impl Listable for AuditLog {
  const RESOURCE: Resource = Resource::AuditLogs;

  fn id(&self) -> i64 {
    self.id
  }

  fn label(&self) -> String {
    format!("audit entry {}", self.id)
  }

  fn columns() -> &'static [Column] {
    const COLUMNS: &[Column] = &[
      col("Time", 17),
      col("Action", 16),
      col("Resource", 16),
      col("ID", 8),
      col("Identity", 24),
    ];
    COLUMNS
  }

  fn cells(&self) -> Vec<String> {
    vec![
      opt_time(&self.created_at),
      self.action.clone(),
      opt(&self.resource_type),
      opt_id(&self.resource_id),
      opt(&self.identity),
    ]
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupJob {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub schedule: Option<String>,
  #[serde(default)]
  pub enabled: bool,
  #[serde(default)]
  pub retention_days: Option<i64>,
  #[serde(default)]
  pub last_run_at: Option<String>,
}

impl Listable for BackupJob {
  const RESOURCE: Resource = Resource::BackupJobs;

  fn id(&self) -> i64 {
    self.id
  }

  fn label(&self) -> String {
    format!("backup job '{}'", self.name)
  }

  fn columns() -> &'static [Column] {
    const COLUMNS: &[Column] = &[
      col("ID", 6),
      col("Name", 24),
      col("Schedule", 14),
      col("Enabled", 8),
      col("Retention", 10),
      col("Last Run", 17),
    ];
    COLUMNS
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.id.to_string(),
      self.name.clone(),
      opt(&self.schedule),
      yes_no(self.enabled),
      self
        .retention_days
        .map(|d| format!("{}d", d))
        .unwrap_or_default(),
      opt_time(&self.last_run_at),
    ]
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
  pub id: i64,
  #[serde(default)]
  pub job_id: Option<i64>,
  #[serde(default)]
  pub filename: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub size_bytes: Option<u64>,
  #[serde(default)]
  pub completed_at: Option<String>,
}

impl Listable for Backup {
  const RESOURCE: Resource = Resource::Backups;

  fn id(&self) -> i64 {
    self.id
  }

  fn label(&self) -> String {
    match &self.filename {
      Some(name) => format!("backup '{}'", name),
      None => format!("backup {}", self.id),
    }
  }

  fn columns() -> &'static [Column] {
    const COLUMNS: &[Column] = &[
      col("ID", 6),
      col("Job", 6),
      col("File", 32),
      col("Status", 10),
      col("Size", 10),
      col("Completed", 17),
    ];
    COLUMNS
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.id.to_string(),
      opt_id(&self.job_id),
      opt(&self.filename),
      opt(&self.status),
      self.size_bytes.map(human_size).unwrap_or_default(),
      opt_time(&self.completed_at),
    ]
  }
}

fn human_size(bytes: u64) -> String {
  const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
  let mut size = bytes as f64;
  let mut unit = 0;
  while size >= 1024.0 && unit < UNITS.len() - 1 {
    size /= 1024.0;
    unit += 1;
  }
  if unit == 0 {
    format!("{} B", bytes)
  } else {
    format!("{:.1} {}", size, UNITS[unit])
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SbomComponent {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub version: Option<String>,
  #[serde(default)]
  pub purl: Option<String>,
  #[serde(default)]
  pub license: Option<String>,
  #[serde(default)]
  pub parent_type: Option<String>,
  #[serde(default)]
  pub parent_id: Option<i64>,
}

impl Listable for SbomComponent {
  const RESOURCE: Resource = Resource::SbomComponents;

  fn id(&self) -> i64 {
    self.id
  }

  fn label(&self) -> String {
    format!("component '{}'", self.name)
  }

  fn columns() -> &'static [Column] {
    const COLUMNS: &[Column] = &[
      col("Name", 28),
      col("Version", 12),
      col("License", 14),
      col("Parent", 14),
      col("PURL", 40),
    ];
    COLUMNS
  }

  fn cells(&self) -> Vec<String> {
    let parent = match (&self.parent_type, self.parent_id) {
      (Some(kind), Some(id)) => format!("{}#{}", kind, id),
      _ => String::new(),
    };
    vec![
      self.name.clone(),
      opt(&self.version),
      opt(&self.license),
      parent,
      opt(&self.purl),
    ]
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub slug: Option<String>,
  #[serde(default)]
  pub is_active: bool,
}

impl Listable for Tenant {
  const RESOURCE: Resource = Resource::Tenants;

  fn id(&self) -> i64 {
    self.id
  }

  fn label(&self) -> String {
    format!("tenant '{}'", self.name)
  }

  fn columns() -> &'static [Column] {
    const COLUMNS: &[Column] = &[
      col("ID", 6),
      col("Name", 28),
      col("Slug", 20),
      col("Active", 7),
    ];
    COLUMNS
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.id.to_string(),
      self.name.clone(),
      opt(&self.slug),
      yes_no(self.is_active),
    ]
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id: i64,
  pub username: String,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub full_name: Option<String>,
  #[serde(default)]
  pub role: Option<String>,
  #[serde(default)]
  pub is_active: bool,
}

impl Listable for User {
  const RESOURCE: Resource = Resource::Users;

  fn id(&self) -> i64 {
    self.id
  }

  fn label(&self) -> String {
    format!("user '{}'", self.username)
  }

  fn columns() -> &'static [Column] {
    const COLUMNS: &[Column] = &[
      col("ID", 6),
      col("Username", 18),
      col("Name", 24),
      col("Email", 28),
      col("Role", 10),
      col("Active", 7),
    ];
    COLUMNS
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.id.to_string(),
      self.username.clone(),
      opt(&self.full_name),
      opt(&self.email),
      opt(&self.role),
      yes_no(self.is_active),
    ]
  }
}

/// The signed-in identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
  pub id: i64,
  pub username: String,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub role: Option<String>,
  #[serde(default)]
  pub is_superuser: bool,
}

impl Profile {
  pub fn is_admin(&self) -> bool {
    self.is_superuser
      || self
        .role
        .as_deref()
        .is_some_and(|r| r.eq_ignore_ascii_case("admin"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_resource_tags_are_unique() {
    let mut tags: Vec<&str> = Resource::ALL.iter().map(|r| r.tag()).collect();
    tags.sort();
    tags.dedup();
    assert_eq!(tags.len(), Resource::ALL.len());
  }

  #[test]
  fn test_admin_only_resources() {
    assert!(Resource::Tenants.admin_only());
    assert!(Resource::Users.admin_only());
    assert!(!Resource::Organizations.admin_only());
  }

  #[test]
  fn test_cells_match_columns() {
    let dep = Dependency {
      id: 3,
      source_entity_id: 1,
      target_entity_id: 2,
      dependency_type: "depends_on".into(),
      created_at: None,
    };
    assert_eq!(dep.cells().len(), Dependency::columns().len());
    assert_eq!(dep.cells()[1], "#1");

    let job = BackupJob {
      id: 1,
      name: "nightly".into(),
      schedule: Some("0 2 * * *".into()),
      enabled: true,
      retention_days: Some(30),
      last_run_at: None,
    };
    assert_eq!(job.cells().len(), BackupJob::columns().len());
    assert_eq!(job.cells()[4], "30d");
  }

  #[test]
  fn test_display_time_falls_back_to_input() {
    assert_eq!(display_time("not a date"), "not a date");
    assert_eq!(display_time("2024-03-01T10:00:00Z").len(), 16);
    assert_eq!(display_time("2024-03-01T10:00:00.123456").len(), 16);
  }

  #[test]
  fn test_profile_admin() {
    let mut profile = Profile {
      id: 1,
      username: "ops".into(),
      email: None,
      role: Some("Admin".into()),
      is_superuser: false,
    };
    assert!(profile.is_admin());
    profile.role = Some("viewer".into());
    assert!(!profile.is_admin());
    profile.is_superuser = true;
    assert!(profile.is_admin());
  }

  #[test]
  fn test_human_size() {
    assert_eq!(human_size(512), "512 B");
    assert_eq!(human_size(2048), "2.0 KB");
    assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
  }

  #[test]
  fn test_entity_decodes_with_missing_optionals() {
    let entity: Entity = serde_json::from_str(r#"{"id": 7, "name": "db"}"#).unwrap();
    assert_eq!(entity.label(), "entity 'db'");
    assert_eq!(entity.entity_type, "");
  }
}
