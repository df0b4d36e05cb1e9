//! View repository
//!
//! A view is a named list of task filters. Applying it runs every filter
//! through the collector and keeps the results apart, in filter order.

use crate::error::{DbError, DbResult, EntityKind};
use crate::filter::{FilterSpecification, TaskFilter};
use crate::models::{Tenant, View, ViewResult};
use crate::repository::rows::{IdOnly, ViewRow};
use crate::repository::{TaskCollector, require_name, unique_id};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{debug, info};

/// Repository for view operations
pub struct ViewRepository<'a> {
    client: &'a Surreal<Db>,
}

impl<'a> ViewRepository<'a> {
    /// Create a new ViewRepository with the given database client
    pub fn new(client: &'a Surreal<Db>) -> Self {
        Self { client }
    }

    /// Save a view.
    ///
    /// # Errors
    ///
    /// - `DbError::ValidationError` for a blank name or a filter with a bad
    ///   page
    /// - `DbError::Conflict` if the tenant already has a view with the name
    pub async fn create(
        &self,
        tenant: &Tenant,
        name: &str,
        filters: &[TaskFilter],
    ) -> DbResult<View> {
        require_name("view", name)?;
        for filter in filters {
            filter.page()?;
        }

        let taken: Vec<IdOnly> = self
            .client
            .query("SELECT id FROM view WHERE owner = $owner AND name = $name")
            .bind(("owner", tenant.as_str().to_string()))
            .bind(("name", name.to_string()))
            .await?
            .take(0)?;
        if !taken.is_empty() {
            return Err(DbError::Conflict {
                message: format!("view name '{}' already in use", name),
            });
        }

        let id = unique_id(self.client, "view", name).await?;
        self.client
            .query(
                "CREATE type::thing(\"view\", $id) \
                 SET owner = $owner, name = $name, filters = $filters",
            )
            .bind(("id", id.clone()))
            .bind(("owner", tenant.as_str().to_string()))
            .bind(("name", name.to_string()))
            .bind(("filters", serde_json::to_string(filters)?))
            .await?
            .check()?;
        info!("created view {} '{}' with {} filter(s)", id, name, filters.len());

        self.get(tenant, &id).await
    }

    /// All views of the tenant, oldest first.
    pub async fn list(&self, tenant: &Tenant) -> DbResult<Vec<View>> {
        let mut response = self
            .client
            .query("SELECT * FROM view WHERE owner = $owner ORDER BY created_at ASC, id ASC")
            .bind(("owner", tenant.as_str().to_string()))
            .await?;
        let rows: Vec<ViewRow> = response.take(0)?;
        rows.into_iter().map(View::try_from).collect()
    }

    /// Get one view of the tenant.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the view doesn't exist for the tenant.
    pub async fn get(&self, tenant: &Tenant, id: &str) -> DbResult<View> {
        let mut response = self
            .client
            .query("SELECT * FROM view WHERE owner = $owner AND id = type::thing(\"view\", $id)")
            .bind(("owner", tenant.as_str().to_string()))
            .bind(("id", id.to_string()))
            .await?;
        let row: Option<ViewRow> = response.take(0)?;
        match row {
            Some(row) => View::try_from(row),
            None => Err(DbError::not_found(EntityKind::View, id)),
        }
    }

    /// Run every filter of a view against the tenant's tasks.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the view doesn't exist for the tenant.
    pub async fn apply(&self, tenant: &Tenant, id: &str) -> DbResult<Vec<ViewResult>> {
        let view = self.get(tenant, id).await?;
        let collector = TaskCollector::new(self.client);

        let mut results = Vec::with_capacity(view.filters.len());
        for filter in view.filters {
            let tasks = collector.by_filter(tenant, &filter).await?;
            results.push(ViewResult { filter, tasks });
        }

        debug!("applied view {} with {} filter(s)", id, results.len());
        Ok(results)
    }

    /// Delete a view. The tasks it matched are untouched.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the view doesn't exist for the tenant.
    pub async fn delete(&self, tenant: &Tenant, id: &str) -> DbResult<()> {
        let deleted: Vec<IdOnly> = self
            .client
            .query(
                "DELETE view WHERE owner = $owner AND id = type::thing(\"view\", $id) \
                 RETURN BEFORE",
            )
            .bind(("owner", tenant.as_str().to_string()))
            .bind(("id", id.to_string()))
            .await?
            .take(0)?;
        if deleted.is_empty() {
            return Err(DbError::not_found(EntityKind::View, id));
        }

        info!("deleted view {} for {}", id, tenant);
        Ok(())
    }
}
