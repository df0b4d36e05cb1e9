//! Task repository for create, update and delete operations
//!
//! Reads go through [`TaskCollector`]; writes reconcile the task's tags and
//! workbenches first and then commit everything as one unit of work, so a
//! failed lookup leaves no staged tag or partial membership behind.

use crate::error::{DbError, DbResult, EntityKind};
use crate::models::{NewTask, Task, TaskPatch, TaskUpdate, Tenant};
use crate::reconcile::{AssociationDelta, reconcile};
use crate::repository::{TagRepository, TaskCollector, WorkbenchRepository, unique_id};
use crate::unit_of_work::UnitOfWork;
use chrono::{DateTime, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{debug, info, trace};

/// Repository for task mutations
pub struct TaskRepository<'a> {
    client: &'a Surreal<Db>,
}

/// Placeholder for an optional string, or `NONE`
fn optional_text(uow: &mut UnitOfWork, value: Option<&str>) -> String {
    match value {
        Some(text) => uow.param(text),
        None => "NONE".to_string(),
    }
}

/// Placeholder for an optional datetime, or `NONE`
fn optional_datetime(uow: &mut UnitOfWork, value: Option<DateTime<Utc>>) -> String {
    match value {
        Some(dt) => format!("<datetime>{}", uow.param(dt.to_rfc3339())),
        None => "NONE".to_string(),
    }
}

/// Array literal of record links into `table`
fn record_links<'i>(
    uow: &mut UnitOfWork,
    table: &str,
    ids: impl IntoIterator<Item = &'i str>,
) -> String {
    let links: Vec<String> = ids
        .into_iter()
        .map(|id| format!("type::thing(\"{}\", {})", table, uow.param(id)))
        .collect();
    format!("[{}]", links.join(", "))
}

fn require_title(title: &str) -> DbResult<()> {
    if title.trim().is_empty() {
        return Err(DbError::validation("task title must not be empty"));
    }
    Ok(())
}

/// SET clauses for the scalar part of an update
fn patch_assignments(uow: &mut UnitOfWork, patch: &TaskPatch) -> Vec<String> {
    let mut assignments = Vec::new();

    if let Some(title) = &patch.title {
        assignments.push(format!("title = {}", uow.param(title.as_str())));
    }
    if let Some(description) = &patch.description {
        let value = optional_text(uow, description.as_deref());
        assignments.push(format!("description = {}", value));
    }
    if let Some(done) = patch.done {
        assignments.push(format!("done = {}", uow.param(done)));
    }
    if let Some(reminder) = patch.reminder {
        let value = optional_datetime(uow, reminder);
        assignments.push(format!("reminder = {}", value));
    }
    if let Some(repetition) = &patch.repetition {
        let value = optional_text(uow, repetition.as_deref());
        assignments.push(format!("repetition = {}", value));
    }
    if let Some(state) = &patch.state {
        let value = optional_text(uow, state.as_deref());
        assignments.push(format!("state = {}", value));
    }
    if let Some(priority) = patch.priority {
        assignments.push(format!("priority = {}", uow.param(priority)));
    }

    assignments
}

impl<'a> TaskRepository<'a> {
    /// Create a new TaskRepository with the given database client
    pub fn new(client: &'a Surreal<Db>) -> Self {
        Self { client }
    }

    fn collector(&self) -> TaskCollector<'a> {
        TaskCollector::new(self.client)
    }

    /// Get one task of the tenant.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the task doesn't exist for the tenant.
    pub async fn get(&self, tenant: &Tenant, id: &str) -> DbResult<Task> {
        self.collector().by_id(tenant, id).await
    }

    /// Create a task.
    ///
    /// Tags are created on first use; workbenches must already exist.
    ///
    /// # Errors
    ///
    /// - `DbError::ValidationError` for a blank title or tag name
    /// - `DbError::NotFound` naming a workbench the tenant doesn't own
    /// - `DbError::Conflict` if a new tag was created concurrently
    pub async fn create(&self, tenant: &Tenant, task: NewTask) -> DbResult<Task> {
        require_title(&task.title)?;
        debug!("Creating task '{}' for {}", task.title, tenant);
        trace!("Task data: {:?}", task);

        let mut uow = UnitOfWork::new();
        let tags = reconcile(
            &TagRepository::new(self.client),
            tenant,
            &[],
            &AssociationDelta::new().add(task.tags),
            &mut uow,
        )
        .await?;
        let workbenches = reconcile(
            &WorkbenchRepository::new(self.client),
            tenant,
            &[],
            &AssociationDelta::new().add(task.workbenches),
            &mut uow,
        )
        .await?;

        let id = unique_id(self.client, "task", &task.title).await?;

        let id_param = uow.param(id.as_str());
        let owner = uow.param(tenant.as_str());
        let title = uow.param(task.title.as_str());
        let description = optional_text(&mut uow, task.description.as_deref());
        let done = uow.param(task.done);
        let reminder = optional_datetime(&mut uow, task.reminder);
        let repetition = optional_text(&mut uow, task.repetition.as_deref());
        let state = optional_text(&mut uow, task.state.as_deref());
        let priority = uow.param(task.priority);
        let tag_links = record_links(&mut uow, "tag", tags.iter().map(|t| t.id.as_str()));
        let workbench_links = record_links(
            &mut uow,
            "workbench",
            workbenches.iter().map(|w| w.id.as_str()),
        );

        uow.push(format!(
            "CREATE type::thing(\"task\", {id_param}) SET \
                owner = {owner}, \
                title = {title}, \
                description = {description}, \
                done = {done}, \
                reminder = {reminder}, \
                repetition = {repetition}, \
                state = {state}, \
                priority = {priority}, \
                tags = {tag_links}, \
                workbenches = {workbench_links}, \
                created_at = time::now(), \
                updated_at = time::now()"
        ));
        uow.commit(self.client).await?;
        info!("created task {} for {}", id, tenant);

        self.get(tenant, &id).await
    }

    /// Update a task's fields and memberships.
    ///
    /// Tag and workbench deltas are reconciled against the current
    /// memberships and the results replace them. An update that changes
    /// nothing returns the task as it is.
    ///
    /// # Errors
    ///
    /// - `DbError::NotFound` if the task doesn't exist for the tenant, or
    ///   naming a workbench the tenant doesn't own; the task is unchanged
    /// - `DbError::ValidationError` for a blank title or tag name
    /// - `DbError::Conflict` if a new tag was created concurrently
    pub async fn update(&self, tenant: &Tenant, id: &str, update: &TaskUpdate) -> DbResult<Task> {
        let task = self.get(tenant, id).await?;
        if !update.has_updates() {
            debug!("no changes for task {}", id);
            return Ok(task);
        }
        if let Some(title) = &update.patch.title {
            require_title(title)?;
        }

        let mut uow = UnitOfWork::new();
        let mut assignments = Vec::new();

        if !update.tags.is_empty() {
            let tags = reconcile(
                &TagRepository::new(self.client),
                tenant,
                &task.tags,
                &update.tags,
                &mut uow,
            )
            .await?;
            let links = record_links(&mut uow, "tag", tags.iter().map(|t| t.id.as_str()));
            assignments.push(format!("tags = {}", links));
        }

        if !update.workbenches.is_empty() {
            let workbenches = reconcile(
                &WorkbenchRepository::new(self.client),
                tenant,
                &task.workbenches,
                &update.workbenches,
                &mut uow,
            )
            .await?;
            let links = record_links(
                &mut uow,
                "workbench",
                workbenches.iter().map(|w| w.id.as_str()),
            );
            assignments.push(format!("workbenches = {}", links));
        }

        assignments.extend(patch_assignments(&mut uow, &update.patch));
        assignments.push("updated_at = time::now()".to_string());

        let id_param = uow.param(id);
        uow.push(format!(
            "UPDATE type::thing(\"task\", {}) SET {}",
            id_param,
            assignments.join(", ")
        ));
        uow.commit(self.client).await?;
        debug!("updated task {}", id);

        self.get(tenant, id).await
    }

    /// Delete a task. Its tags and workbenches are left in place.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the task doesn't exist for the tenant.
    pub async fn delete(&self, tenant: &Tenant, id: &str) -> DbResult<()> {
        debug!("Deleting task: {}", id);
        let mut response = self
            .client
            .query(
                "DELETE task WHERE owner = $owner AND id = type::thing(\"task\", $id) \
                 RETURN BEFORE",
            )
            .bind(("owner", tenant.as_str().to_string()))
            .bind(("id", id.to_string()))
            .await?;
        let deleted: Vec<crate::repository::rows::IdOnly> = response.take(0)?;
        if deleted.is_empty() {
            return Err(DbError::not_found(EntityKind::Task, id));
        }

        info!("deleted task {} for {}", id, tenant);
        Ok(())
    }
}
