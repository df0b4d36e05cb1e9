//! Tag repository
//!
//! Tags are created on first use: resolving a tag name either finds the
//! tenant's existing tag or stages a new one in the caller's unit of work.

use crate::error::{DbError, DbResult, EntityKind};
use crate::id::IdGenerator;
use crate::models::{Tag, Tenant};
use crate::reconcile::MembershipResolver;
use crate::repository::require_name;
use crate::repository::rows::{TagRow, sort_tags};
use crate::unit_of_work::UnitOfWork;
use chrono::Utc;
use std::collections::BTreeSet;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{debug, info};

/// Repository for tag operations
pub struct TagRepository<'a> {
    client: &'a Surreal<Db>,
}

impl<'a> TagRepository<'a> {
    /// Create a new TagRepository with the given database client
    pub fn new(client: &'a Surreal<Db>) -> Self {
        Self { client }
    }

    /// All tags of the tenant, sorted by name.
    pub async fn list(&self, tenant: &Tenant) -> DbResult<Vec<Tag>> {
        let mut response = self
            .client
            .query("SELECT * FROM tag WHERE owner = $owner ORDER BY name ASC")
            .bind(("owner", tenant.as_str().to_string()))
            .await?;
        let rows: Vec<TagRow> = response.take(0)?;
        Ok(rows.into_iter().map(Tag::from).collect())
    }

    /// Get one tag of the tenant.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the tag doesn't exist for the tenant.
    pub async fn get(&self, tenant: &Tenant, id: &str) -> DbResult<Tag> {
        let mut response = self
            .client
            .query("SELECT * FROM tag WHERE owner = $owner AND id = type::thing(\"tag\", $id)")
            .bind(("owner", tenant.as_str().to_string()))
            .bind(("id", id.to_string()))
            .await?;
        let row: Option<TagRow> = response.take(0)?;
        row.map(Tag::from)
            .ok_or_else(|| DbError::not_found(EntityKind::Tag, id))
    }

    /// Tags of the tenant with any of the given names
    async fn find_by_names(&self, tenant: &Tenant, names: &[String]) -> DbResult<Vec<Tag>> {
        let mut response = self
            .client
            .query("SELECT * FROM tag WHERE owner = $owner AND name IN $names")
            .bind(("owner", tenant.as_str().to_string()))
            .bind(("names", names.to_vec()))
            .await?;
        let rows: Vec<TagRow> = response.take(0)?;
        Ok(rows.into_iter().map(Tag::from).collect())
    }

    /// Get or create a batch of tags.
    ///
    /// Duplicate names collapse into one tag. Returns the tags sorted by
    /// name.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ValidationError` for a blank name, or
    /// `DbError::Conflict` if another command created one of the tags at
    /// the same time.
    pub async fn create_many(&self, tenant: &Tenant, names: &[String]) -> DbResult<Vec<Tag>> {
        let target: BTreeSet<String> = names.iter().cloned().collect();
        let mut uow = UnitOfWork::new();
        let tags = self.resolve(tenant, &[], &target, &mut uow).await?;
        let created = uow.staged_tags().len();
        uow.commit(self.client).await?;
        info!("{} tag(s) resolved for {}, {} new", tags.len(), tenant, created);
        Ok(tags)
    }

    /// Rename a tag.
    ///
    /// # Errors
    ///
    /// - `DbError::NotFound` if the tag doesn't exist for the tenant
    /// - `DbError::ValidationError` if the name is blank
    /// - `DbError::Conflict` if another tag of the tenant has the name
    pub async fn rename(&self, tenant: &Tenant, id: &str, name: &str) -> DbResult<Tag> {
        require_name("tag", name)?;
        let tag = self.get(tenant, id).await?;
        if tag.name == name {
            return Ok(tag);
        }

        if !self.find_by_names(tenant, &[name.to_string()]).await?.is_empty() {
            return Err(DbError::Conflict {
                message: format!("tag name '{}' already in use", name),
            });
        }

        self.client
            .query("UPDATE type::thing(\"tag\", $id) SET name = $name, updated_at = time::now()")
            .bind(("id", id.to_string()))
            .bind(("name", name.to_string()))
            .await?
            .check()?;
        debug!("renamed tag {} from '{}' to '{}'", id, tag.name, name);

        self.get(tenant, id).await
    }

    /// Delete a tag and drop it from every task carrying it.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the tag doesn't exist for the tenant.
    pub async fn delete(&self, tenant: &Tenant, id: &str) -> DbResult<()> {
        self.get(tenant, id).await?;

        let mut uow = UnitOfWork::new();
        let owner = uow.param(tenant.as_str());
        let tag = uow.param(id);
        uow.push(format!(
            "UPDATE task SET tags -= type::thing(\"tag\", {tag}), updated_at = time::now() \
             WHERE owner = {owner} AND tags CONTAINS type::thing(\"tag\", {tag})"
        ));
        uow.push(format!("DELETE type::thing(\"tag\", {tag})"));
        uow.commit(self.client).await?;

        info!("deleted tag {} for {}", id, tenant);
        Ok(())
    }
}

impl MembershipResolver for TagRepository<'_> {
    type Key = String;
    type Member = Tag;

    fn key_of(member: &Tag) -> String {
        member.name.clone()
    }

    /// Get-or-create every target name.
    ///
    /// Tags already in `current` or staged earlier in `uow` are reused; the
    /// rest are looked up in one query, and names still missing are staged
    /// as new tags. Nothing reaches the store until `uow` commits.
    async fn resolve(
        &self,
        tenant: &Tenant,
        current: &[Tag],
        target: &BTreeSet<String>,
        uow: &mut UnitOfWork,
    ) -> DbResult<Vec<Tag>> {
        if let Some(blank) = target.iter().find(|name| name.trim().is_empty()) {
            return Err(DbError::validation(format!(
                "tag name must not be empty (got {:?})",
                blank
            )));
        }

        let mut resolved = Vec::with_capacity(target.len());
        let mut missing = Vec::new();
        for name in target {
            if let Some(tag) = current.iter().find(|t| &t.name == name) {
                resolved.push(tag.clone());
            } else if let Some(tag) = uow.staged_tag(name) {
                resolved.push(tag.clone());
            } else {
                missing.push(name.clone());
            }
        }

        if !missing.is_empty() {
            let existing = self.find_by_names(tenant, &missing).await?;
            for name in missing {
                match existing.iter().find(|t| t.name == name) {
                    Some(tag) => resolved.push(tag.clone()),
                    None => {
                        let tag = new_tag(tenant, name)?;
                        uow.stage_tag(tenant, tag.clone());
                        resolved.push(tag);
                    }
                }
            }
        }

        sort_tags(&mut resolved);
        Ok(resolved)
    }
}

fn new_tag(tenant: &Tenant, name: String) -> DbResult<Tag> {
    let id = IdGenerator::new(&name)
        .next_id()
        .ok_or_else(|| DbError::Conflict {
            message: format!("failed to allocate an id for tag '{}'", name),
        })?;
    let now = Utc::now();
    Ok(Tag {
        id,
        owner: tenant.as_str().to_string(),
        name,
        created_at: now,
        updated_at: now,
    })
}
