//! Task commands
//!
//! Implements `tm task add|show|list|update|delete`.

use crate::commands::{delta, invalid, parse_datetime};
use crate::output::{format_task_detail, format_task_table};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use taskmill_db::{
    Database, DbError, DynamicFilter, NewTask, Page, TaskFilter, TaskPatch, TaskUpdate, Tenant,
};

/// Task subcommands
#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// Create a new task
    Add(AddTask),

    /// Show a task with all its details
    Show {
        /// Task ID
        id: String,
    },

    /// List tasks matching a filter
    List(ListTasks),

    /// Change a task's fields, tags or workbenches
    Update(UpdateTask),

    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
}

impl TaskCommand {
    pub async fn execute(&self, db: &Database, tenant: &Tenant) -> Result<String, DbError> {
        match self {
            TaskCommand::Add(cmd) => cmd.execute(db, tenant).await,
            TaskCommand::Show { id } => {
                let task = db.tasks().get(tenant, id).await?;
                Ok(format_task_detail(&task))
            }
            TaskCommand::List(cmd) => cmd.execute(db, tenant).await,
            TaskCommand::Update(cmd) => cmd.execute(db, tenant).await,
            TaskCommand::Delete { id } => {
                db.tasks().delete(tenant, id).await?;
                Ok(format!("Deleted task {}", id))
            }
        }
    }
}

/// Create a new task
#[derive(Debug, Default, Args)]
pub struct AddTask {
    /// Title of the task
    #[arg(required = true)]
    pub title: String,

    /// Detailed description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Mark the task as done right away
    #[arg(long)]
    pub done: bool,

    /// When to be reminded (RFC 3339, 'YYYY-MM-DD HH:MM' or 'YYYY-MM-DD')
    #[arg(short, long, value_parser = parse_datetime)]
    pub reminder: Option<DateTime<Utc>>,

    /// Repetition schedule, e.g. a weekday mask like 0111110
    #[arg(long)]
    pub repetition: Option<String>,

    /// Workbench column the task starts in
    #[arg(short, long)]
    pub state: Option<String>,

    /// Priority; lower numbers come first (default 100)
    #[arg(short, long)]
    pub priority: Option<i64>,

    /// Tags, created on first use (can be specified multiple times)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// IDs of existing workbenches to place the task on
    #[arg(short, long = "workbench")]
    pub workbenches: Vec<String>,
}

impl AddTask {
    /// Execute the add command and return the new task's ID.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if:
    /// - The title or a tag name is blank
    /// - A workbench doesn't exist for the tenant
    /// - Database operations fail
    pub async fn execute(&self, db: &Database, tenant: &Tenant) -> Result<String, DbError> {
        let mut task = NewTask::new(self.title.clone())
            .with_done(self.done)
            .with_tags(self.tags.iter().cloned())
            .with_workbenches(self.workbenches.iter().cloned());

        if let Some(description) = &self.description {
            task = task.with_description(description.clone());
        }
        if let Some(reminder) = self.reminder {
            task = task.with_reminder(reminder);
        }
        if let Some(repetition) = &self.repetition {
            task = task.with_repetition(repetition.clone());
        }
        if let Some(state) = &self.state {
            task = task.with_state(state.clone());
        }
        if let Some(priority) = self.priority {
            task = task.with_priority(priority);
        }

        let task = db.tasks().create(tenant, task).await?;
        Ok(task.id)
    }
}

/// List tasks matching a filter
///
/// Either build the filter from flags, or pass a full JSON filter with
/// `--spec`, e.g.
/// `{"fields": [{"field": "priority", "semantics": "range", "value": [1, 10]}]}`.
#[derive(Debug, Args)]
pub struct ListTasks {
    /// Title pattern; % matches any run of characters, _ exactly one
    #[arg(long)]
    pub title: Option<String>,

    /// Description pattern, same syntax as --title
    #[arg(long)]
    pub description: Option<String>,

    /// Only done (true) or open (false) tasks
    #[arg(long)]
    pub done: Option<bool>,

    /// Require this tag (can be specified multiple times; all must match)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Earliest reminder, inclusive
    #[arg(long, value_parser = parse_datetime)]
    pub reminder_from: Option<DateTime<Utc>>,

    /// Latest reminder, inclusive
    #[arg(long, value_parser = parse_datetime)]
    pub reminder_to: Option<DateTime<Utc>>,

    /// Exact repetition schedule
    #[arg(long)]
    pub repetition: Option<String>,

    /// Allowed states (can be specified multiple times)
    #[arg(short, long = "state")]
    pub states: Vec<String>,

    /// Lowest priority, inclusive
    #[arg(long)]
    pub min_priority: Option<i64>,

    /// Highest priority, inclusive
    #[arg(long)]
    pub max_priority: Option<i64>,

    /// Number of matching tasks to skip
    #[arg(long, default_value_t = 0)]
    pub offset: u32,

    /// Maximum number of tasks to show
    #[arg(long, default_value_t = Page::DEFAULT_LIMIT)]
    pub limit: u32,

    /// Filter as JSON instead of flags
    #[arg(long, conflicts_with_all = [
        "title", "description", "done", "tags", "reminder_from", "reminder_to",
        "repetition", "states", "min_priority", "max_priority", "offset", "limit",
    ])]
    pub spec: Option<String>,
}

impl Default for ListTasks {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            done: None,
            tags: Vec::new(),
            reminder_from: None,
            reminder_to: None,
            repetition: None,
            states: Vec::new(),
            min_priority: None,
            max_priority: None,
            offset: 0,
            limit: Page::DEFAULT_LIMIT,
            spec: None,
        }
    }
}

impl ListTasks {
    /// The typed filter the flags describe
    pub fn to_filter(&self) -> TaskFilter {
        let mut filter = TaskFilter::new()
            .with_tags(self.tags.iter().cloned())
            .with_state(self.states.iter().cloned())
            .with_page(self.offset, self.limit);

        if let Some(title) = &self.title {
            filter = filter.with_title(title.clone());
        }
        if let Some(description) = &self.description {
            filter = filter.with_description(description.clone());
        }
        if let Some(done) = self.done {
            filter = filter.with_done(done);
        }
        if self.reminder_from.is_some() || self.reminder_to.is_some() {
            filter = filter.with_reminder(self.reminder_from, self.reminder_to);
        }
        if let Some(repetition) = &self.repetition {
            filter = filter.with_repetition(repetition.clone());
        }
        if self.min_priority.is_some() || self.max_priority.is_some() {
            filter = filter.with_priority(self.min_priority, self.max_priority);
        }

        filter
    }

    pub async fn execute(&self, db: &Database, tenant: &Tenant) -> Result<String, DbError> {
        let tasks = match &self.spec {
            Some(json) => {
                let spec = DynamicFilter::from_json(json)?;
                db.collector().by_filter(tenant, &spec).await?
            }
            None => db.collector().by_filter(tenant, &self.to_filter()).await?,
        };
        Ok(format_task_table(&tasks))
    }
}

/// Change a task's fields, tags or workbenches
#[derive(Debug, Default, Args)]
pub struct UpdateTask {
    /// Task ID
    pub id: String,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Remove the description
    #[arg(long, conflicts_with = "description")]
    pub clear_description: bool,

    /// Mark done (true) or open (false)
    #[arg(long)]
    pub done: Option<bool>,

    /// New reminder
    #[arg(short, long, value_parser = parse_datetime)]
    pub reminder: Option<DateTime<Utc>>,

    /// Remove the reminder
    #[arg(long, conflicts_with = "reminder")]
    pub clear_reminder: bool,

    /// New repetition schedule
    #[arg(long)]
    pub repetition: Option<String>,

    /// Remove the repetition schedule
    #[arg(long, conflicts_with = "repetition")]
    pub clear_repetition: bool,

    /// Move the task to another column
    #[arg(short, long)]
    pub state: Option<String>,

    /// Take the task out of any column
    #[arg(long, conflicts_with = "state")]
    pub clear_state: bool,

    /// New priority
    #[arg(short, long)]
    pub priority: Option<i64>,

    /// Tag to add, created on first use (can be specified multiple times)
    #[arg(long = "add-tag")]
    pub add_tags: Vec<String>,

    /// Tag to remove (can be specified multiple times)
    #[arg(long = "remove-tag")]
    pub remove_tags: Vec<String>,

    /// Workbench ID to place the task on (can be specified multiple times)
    #[arg(long = "add-workbench")]
    pub add_workbenches: Vec<String>,

    /// Workbench ID to take the task off (can be specified multiple times)
    #[arg(long = "remove-workbench")]
    pub remove_workbenches: Vec<String>,
}

/// Outer `Some` if the flag pair changes the field.
fn nullable<T: Clone>(value: &Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.clone().map(Some)
    }
}

impl UpdateTask {
    /// The update the flags describe
    pub fn to_update(&self) -> TaskUpdate {
        TaskUpdate {
            patch: TaskPatch {
                title: self.title.clone(),
                description: nullable(&self.description, self.clear_description),
                done: self.done,
                reminder: nullable(&self.reminder, self.clear_reminder),
                repetition: nullable(&self.repetition, self.clear_repetition),
                state: nullable(&self.state, self.clear_state),
                priority: self.priority,
            },
            tags: delta(&self.add_tags, &self.remove_tags),
            workbenches: delta(&self.add_workbenches, &self.remove_workbenches),
        }
    }

    /// Execute the update and show the resulting task.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ValidationError` when no flag changes anything, and
    /// `DbError::NotFound` for an unknown task or workbench; in the latter
    /// case the task is left as it was.
    pub async fn execute(&self, db: &Database, tenant: &Tenant) -> Result<String, DbError> {
        let update = self.to_update();
        if !update.has_updates() {
            return Err(invalid(
                "nothing to update; pass at least one field, tag or workbench flag",
            ));
        }

        let task = db.tasks().update(tenant, &self.id, &update).await?;
        Ok(format_task_detail(&task))
    }
}
