//! Rows as they come back from the store
//!
//! Rows keep the store's record ids; conversion into the public models
//! turns them into plain strings and puts memberships in their canonical
//! order.

use crate::error::DbError;
use crate::filter::TaskFilter;
use crate::models::{Tag, Task, View, Workbench};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use surrealdb::sql::Thing;

/// Minimal row for checking record existence
#[derive(Debug, Deserialize)]
pub(crate) struct IdOnly {
    #[allow(dead_code)]
    pub id: Thing,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagRow {
    id: Thing,
    owner: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            id: row.id.id.to_raw(),
            owner: row.owner,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkbenchRow {
    id: Thing,
    owner: String,
    name: String,
    #[serde(default)]
    columns: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WorkbenchRow> for Workbench {
    fn from(row: WorkbenchRow) -> Self {
        Workbench {
            id: row.id.id.to_raw(),
            owner: row.owner,
            name: row.name,
            columns: row.columns,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Task row with its links fetched
#[derive(Debug, Deserialize)]
pub(crate) struct TaskRow {
    id: Thing,
    owner: String,
    title: String,
    description: Option<String>,
    done: bool,
    reminder: Option<DateTime<Utc>>,
    repetition: Option<String>,
    state: Option<String>,
    priority: i64,
    #[serde(default)]
    tags: Vec<TagRow>,
    #[serde(default)]
    workbenches: Vec<WorkbenchRow>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        let mut tags: Vec<Tag> = row.tags.into_iter().map(Tag::from).collect();
        sort_tags(&mut tags);
        let mut workbenches: Vec<Workbench> =
            row.workbenches.into_iter().map(Workbench::from).collect();
        sort_workbenches(&mut workbenches);

        Task {
            id: row.id.id.to_raw(),
            owner: row.owner,
            title: row.title,
            description: row.description,
            done: row.done,
            reminder: row.reminder,
            repetition: row.repetition,
            state: row.state,
            priority: row.priority,
            tags,
            workbenches,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ViewRow {
    id: Thing,
    owner: String,
    name: String,
    filters: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ViewRow> for View {
    type Error = DbError;

    fn try_from(row: ViewRow) -> Result<Self, Self::Error> {
        let filters: Vec<TaskFilter> = serde_json::from_str(&row.filters)?;
        Ok(View {
            id: row.id.id.to_raw(),
            owner: row.owner,
            name: row.name,
            filters,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) fn sort_tags(tags: &mut [Tag]) {
    tags.sort_by(|a, b| a.name.cmp(&b.name));
}

pub(crate) fn sort_workbenches(workbenches: &mut [Workbench]) {
    workbenches.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
}
