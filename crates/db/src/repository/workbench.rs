//! Workbench repository
//!
//! Workbenches are never created implicitly: a task can only be placed on
//! workbenches the tenant already owns.

use crate::error::{DbError, DbResult, EntityKind};
use crate::filter::TaskQuery;
use crate::models::{Tenant, Workbench, WorkbenchTasks, WorkbenchUpdate};
use crate::reconcile::{MembershipResolver, target_membership};
use crate::repository::rows::{WorkbenchRow, sort_workbenches};
use crate::repository::{TaskCollector, require_name, unique_id};
use crate::unit_of_work::UnitOfWork;
use serde_json::Value;
use std::collections::BTreeSet;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{debug, info, warn};

/// Repository for workbench operations
pub struct WorkbenchRepository<'a> {
    client: &'a Surreal<Db>,
}

/// Sort and de-duplicate column names, rejecting blank ones.
fn normalize_columns<'c>(columns: impl IntoIterator<Item = &'c String>) -> DbResult<Vec<String>> {
    let columns: BTreeSet<String> = columns.into_iter().cloned().collect();
    if columns.iter().any(|c| c.trim().is_empty()) {
        return Err(DbError::validation("workbench column names must not be empty"));
    }
    Ok(columns.into_iter().collect())
}

impl<'a> WorkbenchRepository<'a> {
    /// Create a new WorkbenchRepository with the given database client
    pub fn new(client: &'a Surreal<Db>) -> Self {
        Self { client }
    }

    /// Create a workbench.
    ///
    /// # Errors
    ///
    /// - `DbError::ValidationError` for a blank name or column
    /// - `DbError::Conflict` if the tenant already has a workbench with the
    ///   name
    pub async fn create(
        &self,
        tenant: &Tenant,
        name: &str,
        columns: &[String],
    ) -> DbResult<Workbench> {
        require_name("workbench", name)?;
        let columns = normalize_columns(columns)?;
        self.check_name_free(tenant, name).await?;

        let id = unique_id(self.client, "workbench", name).await?;
        self.client
            .query(
                "CREATE type::thing(\"workbench\", $id) SET owner = $owner, name = $name, \
                 columns = $columns",
            )
            .bind(("id", id.clone()))
            .bind(("owner", tenant.as_str().to_string()))
            .bind(("name", name.to_string()))
            .bind(("columns", columns))
            .await?
            .check()?;
        info!("created workbench {} '{}' for {}", id, name, tenant);

        self.get(tenant, &id).await
    }

    /// All workbenches of the tenant, sorted by name.
    pub async fn list(&self, tenant: &Tenant) -> DbResult<Vec<Workbench>> {
        let mut response = self
            .client
            .query("SELECT * FROM workbench WHERE owner = $owner ORDER BY name ASC, id ASC")
            .bind(("owner", tenant.as_str().to_string()))
            .await?;
        let rows: Vec<WorkbenchRow> = response.take(0)?;
        Ok(rows.into_iter().map(Workbench::from).collect())
    }

    /// Get one workbench of the tenant.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the workbench doesn't exist for the
    /// tenant.
    pub async fn get(&self, tenant: &Tenant, id: &str) -> DbResult<Workbench> {
        let mut response = self
            .client
            .query(
                "SELECT * FROM workbench WHERE owner = $owner \
                 AND id = type::thing(\"workbench\", $id)",
            )
            .bind(("owner", tenant.as_str().to_string()))
            .bind(("id", id.to_string()))
            .await?;
        let row: Option<WorkbenchRow> = response.take(0)?;
        row.map(Workbench::from)
            .ok_or_else(|| DbError::not_found(EntityKind::Workbench, id))
    }

    /// A workbench together with the tasks placed on it.
    pub async fn tasks_of(&self, tenant: &Tenant, id: &str) -> DbResult<WorkbenchTasks> {
        let workbench = self.get(tenant, id).await?;

        let mut query = TaskQuery::owned_by(tenant);
        let param = query.bind("workbench", Value::String(id.to_string()));
        let query = query.and_where(format!(
            "workbenches CONTAINS type::thing(\"workbench\", {})",
            param
        ));
        let tasks = TaskCollector::new(self.client).fetch(&query).await?;

        Ok(WorkbenchTasks { workbench, tasks })
    }

    /// Rename a workbench and/or change its columns.
    ///
    /// Columns follow the same `(current ∪ add) − remove` rule as task
    /// memberships and stay sorted.
    ///
    /// # Errors
    ///
    /// - `DbError::NotFound` if the workbench doesn't exist for the tenant
    /// - `DbError::ValidationError` for a blank name or column
    /// - `DbError::Conflict` if the new name is taken
    pub async fn update(
        &self,
        tenant: &Tenant,
        id: &str,
        update: &WorkbenchUpdate,
    ) -> DbResult<Workbench> {
        let workbench = self.get(tenant, id).await?;

        let current: BTreeSet<String> = workbench.columns.iter().cloned().collect();
        let columns = normalize_columns(&target_membership(&current, &update.columns))?;

        let name = match &update.name {
            Some(name) if *name != workbench.name => {
                require_name("workbench", name)?;
                self.check_name_free(tenant, name).await?;
                name.clone()
            }
            _ => workbench.name.clone(),
        };

        self.client
            .query(
                "UPDATE type::thing(\"workbench\", $id) SET name = $name, columns = $columns, \
                 updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("name", name))
            .bind(("columns", columns))
            .await?
            .check()?;
        debug!("updated workbench {}", id);

        self.get(tenant, id).await
    }

    /// Delete a workbench and take every task off it.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the workbench doesn't exist for the
    /// tenant.
    pub async fn delete(&self, tenant: &Tenant, id: &str) -> DbResult<()> {
        self.get(tenant, id).await?;

        let mut uow = UnitOfWork::new();
        let owner = uow.param(tenant.as_str());
        let workbench = uow.param(id);
        uow.push(format!(
            "UPDATE task SET workbenches -= type::thing(\"workbench\", {workbench}), \
             updated_at = time::now() \
             WHERE owner = {owner} AND workbenches CONTAINS type::thing(\"workbench\", {workbench})"
        ));
        uow.push(format!("DELETE type::thing(\"workbench\", {workbench})"));
        uow.commit(self.client).await?;

        info!("deleted workbench {} for {}", id, tenant);
        Ok(())
    }

    async fn check_name_free(&self, tenant: &Tenant, name: &str) -> DbResult<()> {
        let mut response = self
            .client
            .query("SELECT * FROM workbench WHERE owner = $owner AND name = $name")
            .bind(("owner", tenant.as_str().to_string()))
            .bind(("name", name.to_string()))
            .await?;
        let rows: Vec<WorkbenchRow> = response.take(0)?;
        if rows.is_empty() {
            Ok(())
        } else {
            Err(DbError::Conflict {
                message: format!("workbench name '{}' already in use", name),
            })
        }
    }
}

impl MembershipResolver for WorkbenchRepository<'_> {
    type Key = String;
    type Member = Workbench;

    fn key_of(member: &Workbench) -> String {
        member.id.clone()
    }

    /// Look up every target id in one query.
    ///
    /// Fails with `NotFound` for the first id (in sorted order) the tenant
    /// doesn't own; no partial result is returned and nothing is created.
    async fn resolve(
        &self,
        tenant: &Tenant,
        _current: &[Workbench],
        target: &BTreeSet<String>,
        _uow: &mut UnitOfWork,
    ) -> DbResult<Vec<Workbench>> {
        if target.is_empty() {
            return Ok(Vec::new());
        }

        let mut request_ids = Vec::with_capacity(target.len());
        let mut ids_sql = Vec::with_capacity(target.len());
        for (i, id) in target.iter().enumerate() {
            ids_sql.push(format!("type::thing(\"workbench\", $w{})", i));
            request_ids.push((format!("w{}", i), id.clone()));
        }
        let sql = format!(
            "SELECT * FROM workbench WHERE owner = $owner AND id IN [{}]",
            ids_sql.join(", ")
        );

        let mut request = self
            .client
            .query(sql)
            .bind(("owner", tenant.as_str().to_string()));
        for binding in request_ids {
            request = request.bind(binding);
        }
        let mut response = request.await?;
        let rows: Vec<WorkbenchRow> = response.take(0)?;
        let mut found: Vec<Workbench> = rows.into_iter().map(Workbench::from).collect();

        if found.len() != target.len() {
            let known: BTreeSet<&str> = found.iter().map(|w| w.id.as_str()).collect();
            if let Some(missing) = target.iter().find(|id| !known.contains(id.as_str())) {
                warn!("workbench {} not found for {}", missing, tenant);
                return Err(DbError::not_found(EntityKind::Workbench, missing.clone()));
            }
        }

        sort_workbenches(&mut found);
        Ok(found)
    }
}
