//! Data models for taskmill
//!
//! Defines the records handed out by the repositories (tasks, tags,
//! workbenches and views) and the inputs used to create and change them.
//! Record ids are plain strings here; the store's record-link type stays
//! inside the repository layer.

use crate::error::{DbError, DbResult};
use crate::filter::TaskFilter;
use crate::reconcile::AssociationDelta;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default priority for new tasks
pub const DEFAULT_PRIORITY: i64 = 100;

/// The user every record belongs to
///
/// Supplied by the caller and trusted; repositories scope every read and
/// write to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tenant(String);

impl Tenant {
    /// # Errors
    ///
    /// Returns `DbError::ValidationError` if the identifier is blank.
    pub fn new(id: impl Into<String>) -> DbResult<Self> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(DbError::validation("tenant must not be empty"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Tenant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A label attached to tasks, unique by name per tenant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub id: String,
    pub owner: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A kanban board grouping tasks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workbench {
    pub id: String,
    pub owner: String,
    pub name: String,
    /// Column names, sorted and free of duplicates
    pub columns: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task with its tag and workbench memberships
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: String,
    pub owner: String,
    pub title: String,
    pub description: Option<String>,
    pub done: bool,
    pub reminder: Option<DateTime<Utc>>,
    /// Weekday mask such as `0111110`, or any caller-defined schedule
    pub repetition: Option<String>,
    /// Kanban column the task sits in
    pub state: Option<String>,
    pub priority: i64,
    /// Sorted by name
    pub tags: Vec<Tag>,
    /// Sorted by name, then id
    pub workbenches: Vec<Workbench>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Names of the task's tags, in order
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }

    /// Ids of the task's workbenches, in order
    pub fn workbench_ids(&self) -> Vec<&str> {
        self.workbenches.iter().map(|w| w.id.as_str()).collect()
    }
}

/// A saved, named list of task filters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub id: String,
    pub owner: String,
    pub name: String,
    pub filters: Vec<TaskFilter>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tasks matched by one filter of a view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewResult {
    pub filter: TaskFilter,
    pub tasks: Vec<Task>,
}

/// A workbench together with the tasks placed on it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkbenchTasks {
    pub workbench: Workbench,
    pub tasks: Vec<Task>,
}

/// Input for creating a task
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub done: bool,
    pub reminder: Option<DateTime<Utc>>,
    pub repetition: Option<String>,
    pub state: Option<String>,
    pub priority: i64,
    /// Tag names, created on first use
    pub tags: Vec<String>,
    /// Ids of existing workbenches
    pub workbenches: Vec<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            done: false,
            reminder: None,
            repetition: None,
            state: None,
            priority: DEFAULT_PRIORITY,
            tags: Vec::new(),
            workbenches: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_done(mut self, done: bool) -> Self {
        self.done = done;
        self
    }

    pub fn with_reminder(mut self, reminder: DateTime<Utc>) -> Self {
        self.reminder = Some(reminder);
        self
    }

    pub fn with_repetition(mut self, repetition: impl Into<String>) -> Self {
        self.repetition = Some(repetition.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tags<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_workbenches<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.workbenches = ids.into_iter().map(Into::into).collect();
        self
    }
}

/// Scalar field assignments for a task
///
/// The outer `Option` says whether a field changes; for nullable fields the
/// inner `Option` is the new value, with `None` clearing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub done: Option<bool>,
    pub reminder: Option<Option<DateTime<Utc>>>,
    pub repetition: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub priority: Option<i64>,
}

impl TaskPatch {
    /// Check if any field is assigned
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.done.is_none()
            && self.reminder.is_none()
            && self.repetition.is_none()
            && self.state.is_none()
            && self.priority.is_none()
    }
}

/// A change to a task: scalar assignments plus membership deltas
///
/// Tag deltas carry names; workbench deltas carry ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub patch: TaskPatch,
    pub tags: AssociationDelta<String>,
    pub workbenches: AssociationDelta<String>,
}

impl TaskUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.patch.title = Some(title.into());
        self
    }

    pub fn with_done(mut self, done: bool) -> Self {
        self.patch.done = Some(done);
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.patch.priority = Some(priority);
        self
    }

    pub fn with_state(mut self, state: Option<String>) -> Self {
        self.patch.state = Some(state);
        self
    }

    pub fn with_tags(mut self, tags: AssociationDelta<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_workbenches(mut self, workbenches: AssociationDelta<String>) -> Self {
        self.workbenches = workbenches;
        self
    }

    /// Check if the update changes anything
    pub fn has_updates(&self) -> bool {
        !self.patch.is_empty() || !self.tags.is_empty() || !self.workbenches.is_empty()
    }
}

/// A change to a workbench: an optional rename plus a column delta
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbenchUpdate {
    pub name: Option<String>,
    pub columns: AssociationDelta<String>,
}
