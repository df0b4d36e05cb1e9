//! Batched writes committed as one transaction
//!
//! Repositories append statements and their parameters to a `UnitOfWork`;
//! the caller commits it once all of them are collected. Until then nothing
//! reaches the store, and dropping the unit discards everything.

use crate::error::{DbError, DbResult, UNIQUE_INDEX_VIOLATION, classify};
use crate::models::{Tag, Tenant};
use serde_json::Value;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{debug, trace, warn};

/// Marker SurrealDB puts on statements skipped after an earlier failure
const SKIPPED_STATEMENT: &str = "not executed due to a failed transaction";

/// Pending statements, their parameters, and the tags they will create
#[derive(Debug, Default)]
pub struct UnitOfWork {
    statements: Vec<String>,
    bindings: Vec<(String, Value)>,
    staged_tags: Vec<Tag>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter and return its placeholder (`$p0`, `$p1`, ...).
    pub fn param(&mut self, value: impl Into<Value>) -> String {
        let name = format!("p{}", self.bindings.len());
        let placeholder = format!("${}", name);
        self.bindings.push((name, value.into()));
        placeholder
    }

    /// Append a statement; its parameters must come from [`Self::param`].
    pub fn push(&mut self, statement: impl Into<String>) {
        self.statements.push(statement.into());
    }

    /// Stage the creation of a tag so later statements can link to it.
    pub fn stage_tag(&mut self, tenant: &Tenant, tag: Tag) {
        debug!("staging new tag '{}' ({}) for {}", tag.name, tag.id, tenant);
        let id = self.param(tag.id.clone());
        let owner = self.param(tenant.as_str());
        let name = self.param(tag.name.clone());
        let created = self.param(tag.created_at.to_rfc3339());
        self.push(format!(
            "CREATE type::thing(\"tag\", {id}) SET owner = {owner}, name = {name}, \
             created_at = <datetime>{created}, updated_at = <datetime>{created}"
        ));
        self.staged_tags.push(tag);
    }

    /// A tag staged earlier in this unit, by name
    pub fn staged_tag(&self, name: &str) -> Option<&Tag> {
        self.staged_tags.iter().find(|t| t.name == name)
    }

    pub fn staged_tags(&self) -> &[Tag] {
        &self.staged_tags
    }

    #[cfg(test)]
    pub(crate) fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Run every statement inside one transaction.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Conflict` if a unique index rejected a write (for
    /// instance a tag created concurrently by another command), or
    /// `DbError::Query` for any other failure. Either way nothing is
    /// applied.
    pub async fn commit(self, client: &Surreal<Db>) -> DbResult<()> {
        if self.statements.is_empty() {
            return Ok(());
        }

        let mut sql = String::from("BEGIN TRANSACTION;\n");
        for statement in &self.statements {
            sql.push_str(statement);
            sql.push_str(";\n");
        }
        sql.push_str("COMMIT TRANSACTION;");
        trace!("committing unit of work:\n{}", sql);

        let mut query = client.query(sql);
        for binding in self.bindings {
            query = query.bind(binding);
        }

        let mut response = query.await?;
        let mut errors: Vec<(usize, surrealdb::Error)> =
            response.take_errors().into_iter().collect();
        if errors.is_empty() {
            debug!(
                "committed {} statement(s), {} new tag(s)",
                self.statements.len(),
                self.staged_tags.len()
            );
            return Ok(());
        }

        errors.sort_by_key(|(index, _)| *index);
        warn!("unit of work rolled back with {} error(s)", errors.len());
        Err(first_cause(errors))
    }
}

/// Pick the error that explains a rolled-back transaction.
///
/// Statements skipped because of an earlier failure only echo it, so the
/// failing statement itself is preferred, and a unique violation wins over
/// anything else.
fn first_cause(errors: Vec<(usize, surrealdb::Error)>) -> DbError {
    let (skipped, mut causes): (Vec<_>, Vec<_>) = errors
        .into_iter()
        .map(|(_, err)| err)
        .partition(|err| err.to_string().contains(SKIPPED_STATEMENT));

    if let Some(index) = causes
        .iter()
        .position(|err| err.to_string().contains(UNIQUE_INDEX_VIOLATION))
    {
        return classify(causes.swap_remove(index));
    }

    match causes.into_iter().chain(skipped).next() {
        Some(err) => classify(err),
        None => DbError::validation("transaction failed without a reported cause"),
    }
}
