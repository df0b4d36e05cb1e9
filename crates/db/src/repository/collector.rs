//! Task retrieval by id and by filter
//!
//! All reads of tasks go through the collector, which starts every query
//! from the tenant condition, so a task owned by someone else looks exactly
//! like one that doesn't exist.

use crate::error::{DbError, DbResult, EntityKind};
use crate::filter::{FilterCompiler, FilterSpecification, TaskQuery};
use crate::models::{Task, Tenant};
use crate::repository::rows::TaskRow;
use serde_json::Value;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{debug, trace};

/// Collects tasks for one tenant
pub struct TaskCollector<'a> {
    client: &'a Surreal<Db>,
}

impl<'a> TaskCollector<'a> {
    /// Create a new TaskCollector with the given database client
    pub fn new(client: &'a Surreal<Db>) -> Self {
        Self { client }
    }

    /// Get one task of the tenant.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the task doesn't exist or belongs to
    /// another tenant.
    pub async fn by_id(&self, tenant: &Tenant, id: &str) -> DbResult<Task> {
        let mut query = TaskQuery::owned_by(tenant);
        let param = query.bind("id", Value::String(id.to_string()));
        let query = query.and_where(format!("id = type::thing(\"task\", {})", param));

        self.fetch(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(EntityKind::Task, id))
    }

    /// Get the tenant's tasks matching `spec`, paged as the spec asks.
    ///
    /// Results are ordered by creation time, then id.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ValidationError` for a bad page or dynamic field,
    /// and whatever the compiler reports for malformed filter values.
    pub async fn by_filter<S>(&self, tenant: &Tenant, spec: &S) -> DbResult<Vec<Task>>
    where
        S: FilterSpecification + ?Sized,
    {
        let page = spec.page()?;
        let query = FilterCompiler::compile(TaskQuery::owned_by(tenant), spec)?.with_page(page);
        let tasks = self.fetch(&query).await?;
        debug!("collected {} task(s) for {}", tasks.len(), tenant);
        Ok(tasks)
    }

    /// Run an already composed query.
    pub async fn fetch(&self, query: &TaskQuery) -> DbResult<Vec<Task>> {
        let sql = query.to_sql();
        trace!("task query: {}", sql);

        let mut request = self.client.query(sql);
        for (name, value) in query.bindings() {
            request = request.bind((name.clone(), value.clone()));
        }

        let mut response = request.await?;
        let rows: Vec<TaskRow> = response.take(0)?;
        Ok(rows.into_iter().map(Task::from).collect())
    }
}
