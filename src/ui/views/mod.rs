mod audit_export;
mod dependency_form;
mod form;
mod logs;
mod resource_list;

pub use audit_export::AuditExportView;
pub use dependency_form::DependencyFormView;
pub use logs::LogsView;
pub use resource_list::{FormLauncher, ResourceListView, RowAction};

use crate::context::AppContext;
use crate::elder::types::*;
use crate::elder::Resource;
use crate::ui::view::View;

/// Root page for a resource, starting at `page`
pub fn resource_page(resource: Resource, ctx: &AppContext, page: u64) -> Box<dyn View> {
  match resource {
    Resource::Organizations => Box::new(
      ResourceListView::<Organization>::new(ctx, page)
        .searchable()
        .with_drilldown(organization_entities),
    ),
    Resource::Entities => Box::new(
      ResourceListView::<Entity>::new(ctx, page)
        .searchable()
        .with_drilldown(entity_dependencies),
    ),
    Resource::Dependencies => Box::new(
      ResourceListView::<Dependency>::new(ctx, page).with_form(FormLauncher::NewDependency),
    ),
    Resource::Labels => Box::new(ResourceListView::<Label>::new(ctx, page)),
    Resource::Rotations => Box::new(ResourceListView::<Rotation>::new(ctx, page)),
    Resource::AuditLogs => {
      Box::new(ResourceListView::<AuditLog>::new(ctx, page).with_form(FormLauncher::AuditExport))
    }
    Resource::BackupJobs => Box::new(
      ResourceListView::<BackupJob>::new(ctx, page)
        .with_row_action(RowAction::RunJob)
        .with_drilldown(job_backups),
    ),
    Resource::Backups => Box::new(
      ResourceListView::<Backup>::new(ctx, page)
        .with_row_action(RowAction::RestoreDryRun)
        .with_row_action(RowAction::Restore),
    ),
    Resource::SbomComponents => {
      Box::new(ResourceListView::<SbomComponent>::new(ctx, page).searchable())
    }
    Resource::Tenants => Box::new(ResourceListView::<Tenant>::new(ctx, page)),
    Resource::Users => Box::new(ResourceListView::<User>::new(ctx, page)),
  }
}

fn organization_entities(ctx: &AppContext, organization_id: i64) -> Box<dyn View> {
  Box::new(
    ResourceListView::<Entity>::new(ctx, 1)
      .searchable()
      .with_filter("organization_id", &organization_id.to_string())
      .with_drilldown(entity_dependencies),
  )
}

fn entity_dependencies(ctx: &AppContext, entity_id: i64) -> Box<dyn View> {
  Box::new(
    ResourceListView::<Dependency>::new(ctx, 1)
      .with_filter("entity_id", &entity_id.to_string())
      .with_form(FormLauncher::NewDependency),
  )
}

fn job_backups(ctx: &AppContext, job_id: i64) -> Box<dyn View> {
  Box::new(
    ResourceListView::<Backup>::new(ctx, 1)
      .with_filter("job_id", &job_id.to_string())
      .with_row_action(RowAction::RestoreDryRun)
      .with_row_action(RowAction::Restore),
  )
}
