//! Project use-cases.
//!
//! # Invariants
//! - A failed project creation is reported, never swallowed.
//! - Creation and deletion append an activity log entry; a failed log write
//!   does not undo or fail the project write.

use super::{ServiceError, ServiceResult};
use crate::model::project::NewProject;
use crate::model::task_log::NewTaskLog;
use crate::repo::project_repo::ProjectRepository;
use crate::repo::task_log_repo::TaskLogRepository;
use crate::store::DocId;
use log::{info, warn};

#[derive(Clone)]
pub struct ProjectService {
    projects: ProjectRepository,
    logs: TaskLogRepository,
}

impl ProjectService {
    pub fn new(projects: ProjectRepository, logs: TaskLogRepository) -> Self {
        Self { projects, logs }
    }

    /// Creates a project and records it in the activity log.
    ///
    /// # Errors
    /// - [`ServiceError::WriteNotApplied`] when the project was not written.
    pub async fn create_project(&self, input: NewProject) -> ServiceResult<DocId> {
        let name = input.name.clone();
        let Some(id) = self.projects.add_project(input).await else {
            warn!("event=project_create module=service status=error reason=write_not_applied");
            return Err(ServiceError::WriteNotApplied {
                action: "create the project",
            });
        };
        info!("event=project_create module=service status=ok id={}", id);

        let entry = NewTaskLog::new("New project", format!("Project \"{name}\" created."))
            .for_project(id.clone());
        if self.logs.add_log(entry).await.is_none() {
            warn!("event=activity_log module=service status=skipped action=project_create");
        }
        Ok(id)
    }

    /// Deletes a project (phases are kept) and logs it when it took effect.
    pub async fn delete_project(&self, id: &str, name: &str) -> Option<DocId> {
        let deleted = self.projects.delete_project(id).await?;
        let entry = NewTaskLog::new("Project deleted", format!("Project \"{name}\" removed."));
        if self.logs.add_log(entry).await.is_none() {
            warn!("event=activity_log module=service status=skipped action=project_delete");
        }
        Some(deleted)
    }
}
