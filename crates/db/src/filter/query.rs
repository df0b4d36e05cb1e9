//! The accumulating task query
//!
//! A `TaskQuery` is a SurrealQL `SELECT` over the task table under
//! construction: a conjunction of conditions, the parameters they
//! reference, and optional paging. Strategies only ever append
//! conditions, so every step narrows the result set.

use crate::filter::Page;
use crate::models::Tenant;
use serde_json::Value;

/// Query over the task table, built up one condition at a time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskQuery {
    conditions: Vec<String>,
    bindings: Vec<(String, Value)>,
    page: Option<Page>,
}

impl TaskQuery {
    /// The base query for a tenant: every task it owns.
    pub fn owned_by(tenant: &Tenant) -> Self {
        let mut query = Self::default();
        let owner = query.bind("owner", Value::String(tenant.as_str().to_string()));
        query.and_where(format!("owner = {}", owner))
    }

    /// Register a parameter and return its placeholder (e.g. `$title_1`).
    ///
    /// `stem` must be a plain identifier; the suffix keeps names unique
    /// when the same field binds more than once.
    pub fn bind(&mut self, stem: &str, value: Value) -> String {
        let name = format!("{}_{}", stem, self.bindings.len());
        let placeholder = format!("${}", name);
        self.bindings.push((name, value));
        placeholder
    }

    /// Append a condition; all conditions are ANDed.
    pub fn and_where(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    /// Apply paging through the store's native `LIMIT`/`START`.
    pub fn with_page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn bindings(&self) -> &[(String, Value)] {
        &self.bindings
    }

    /// Render the SurrealQL statement.
    ///
    /// Associations are fetched so rows deserialize straight into tasks
    /// with their tags and workbenches.
    pub fn to_sql(&self) -> String {
        let mut sql = String::from("SELECT * FROM task");

        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }

        sql.push_str(" ORDER BY created_at ASC, id ASC");

        if let Some(page) = self.page {
            sql.push_str(&format!(" LIMIT {} START {}", page.limit(), page.offset()));
        }

        sql.push_str(" FETCH tags, workbenches");
        sql
    }
}
