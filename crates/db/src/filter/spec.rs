//! Filter specifications over tasks
//!
//! A specification is an ordered list of fields, each naming a task column,
//! the semantics it is compared with, and an optional value. [`TaskFilter`]
//! is the typed form built by code; [`DynamicFilter`] is the JSON form
//! supplied from outside and checked against the same field table.

use crate::error::{DbError, DbResult};
use crate::filter::{FilterValue, Scalar, ScalarKind, Semantics, StrategyRegistry};
use std::collections::HashSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One field of a specification, ready for compilation
#[derive(Debug, Clone, PartialEq)]
pub struct FilterField {
    pub name: &'static str,
    pub semantics: Semantics,
    pub value: Option<FilterValue>,
}

/// Anything that can be compiled into task conditions
pub trait FilterSpecification {
    /// Fields in declaration order. Unset fields may be included with
    /// `value: None`; the compiler skips them.
    fn fields(&self) -> DbResult<Vec<FilterField>>;

    /// Paging window for the collected result.
    fn page(&self) -> DbResult<Page>;
}

/// Offset/limit window applied by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    offset: u32,
    limit: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 100;

    /// # Errors
    ///
    /// Returns `DbError::ValidationError` if `limit` is zero.
    pub fn new(offset: u32, limit: u32) -> DbResult<Self> {
        if limit == 0 {
            return Err(DbError::validation("limit must be at least 1"));
        }
        Ok(Self { offset, limit })
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// A filterable task column: its name, how it is compared, the scalar type
/// it holds, and how the typed filter exposes its value
pub struct FieldDef {
    pub name: &'static str,
    pub semantics: Semantics,
    pub kind: ScalarKind,
    value: fn(&TaskFilter) -> Option<FilterValue>,
}

impl FieldDef {
    /// Find the definition of a column by name.
    pub fn lookup(name: &str) -> Option<&'static FieldDef> {
        TASK_FIELDS.iter().find(|def| def.name == name)
    }
}

/// Filterable task columns, in compilation order
pub static TASK_FIELDS: [FieldDef; 8] = [
    FieldDef {
        name: "title",
        semantics: Semantics::Like,
        kind: ScalarKind::Text,
        value: title_value,
    },
    FieldDef {
        name: "description",
        semantics: Semantics::Like,
        kind: ScalarKind::Text,
        value: description_value,
    },
    FieldDef {
        name: "done",
        semantics: Semantics::Exact,
        kind: ScalarKind::Bool,
        value: done_value,
    },
    FieldDef {
        name: "tags",
        semantics: Semantics::WithTags,
        kind: ScalarKind::Text,
        value: tags_value,
    },
    FieldDef {
        name: "reminder",
        semantics: Semantics::Range,
        kind: ScalarKind::DateTime,
        value: reminder_value,
    },
    FieldDef {
        name: "repetition",
        semantics: Semantics::Exact,
        kind: ScalarKind::Text,
        value: repetition_value,
    },
    FieldDef {
        name: "state",
        semantics: Semantics::InList,
        kind: ScalarKind::Text,
        value: state_value,
    },
    FieldDef {
        name: "priority",
        semantics: Semantics::Range,
        kind: ScalarKind::Int,
        value: priority_value,
    },
];

fn title_value(filter: &TaskFilter) -> Option<FilterValue> {
    filter.title.as_deref().map(FilterValue::text)
}

fn description_value(filter: &TaskFilter) -> Option<FilterValue> {
    filter.description.as_deref().map(FilterValue::text)
}

fn done_value(filter: &TaskFilter) -> Option<FilterValue> {
    filter.done.map(|done| FilterValue::Scalar(Scalar::Bool(done)))
}

fn tags_value(filter: &TaskFilter) -> Option<FilterValue> {
    Some(FilterValue::List(filter.tags.clone()))
}

fn reminder_value(filter: &TaskFilter) -> Option<FilterValue> {
    filter.reminder.map(|(lower, upper)| {
        FilterValue::Range(lower.map(Scalar::DateTime), upper.map(Scalar::DateTime))
    })
}

fn repetition_value(filter: &TaskFilter) -> Option<FilterValue> {
    filter.repetition.as_deref().map(FilterValue::text)
}

fn state_value(filter: &TaskFilter) -> Option<FilterValue> {
    Some(FilterValue::List(filter.state.clone()))
}

fn priority_value(filter: &TaskFilter) -> Option<FilterValue> {
    filter
        .priority
        .map(|(lower, upper)| FilterValue::Range(lower.map(Scalar::Int), upper.map(Scalar::Int)))
}

/// Typed task filter
///
/// `done: Some(false)` and a priority bound of `0` are real constraints;
/// only `None`, empty strings and empty lists mean "don't care".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder: Option<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetition: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub state: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<(Option<i64>, Option<i64>)>,
    pub offset: u32,
    pub limit: u32,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            done: None,
            tags: Vec::new(),
            reminder: None,
            repetition: None,
            state: Vec::new(),
            priority: None,
            offset: 0,
            limit: Page::DEFAULT_LIMIT,
        }
    }
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, pattern: impl Into<String>) -> Self {
        self.title = Some(pattern.into());
        self
    }

    pub fn with_description(mut self, pattern: impl Into<String>) -> Self {
        self.description = Some(pattern.into());
        self
    }

    pub fn with_done(mut self, done: bool) -> Self {
        self.done = Some(done);
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

    pub fn with_reminder(
        mut self,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Self {
        self.reminder = Some((from, until));
        self
    }

    pub fn with_repetition(mut self, repetition: impl Into<String>) -> Self {
        self.repetition = Some(repetition.into());
        self
    }

    pub fn with_state<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state = states.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.priority = Some((min, max));
        self
    }

    pub fn with_page(mut self, offset: u32, limit: u32) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }
}

impl FilterSpecification for TaskFilter {
    fn fields(&self) -> DbResult<Vec<FilterField>> {
        Ok(TASK_FIELDS
            .iter()
            .map(|def| FilterField {
                name: def.name,
                semantics: def.semantics,
                value: (def.value)(self),
            })
            .collect())
    }

    fn page(&self) -> DbResult<Page> {
        Page::new(self.offset, self.limit)
    }
}

/// One entry of a [`DynamicFilter`]
///
/// `semantics` stays a raw JSON value until compilation so a malformed tag
/// is reported precisely rather than as a parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicField {
    pub field: String,
    pub semantics: Value,
    #[serde(default)]
    pub value: Value,
}

/// Externally supplied filter, e.g. from `tm task list --spec`
///
/// Accepts either `{"fields": [...], "offset": 0, "limit": 10}` or a bare
/// array of fields. Each field may appear at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicFilter {
    #[serde(default)]
    pub fields: Vec<DynamicField>,
    #[serde(default)]
    pub offset: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    Page::DEFAULT_LIMIT
}

impl DynamicFilter {
    /// Parse a filter from its JSON text.
    pub fn from_json(text: &str) -> DbResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        let filter = match value {
            Value::Array(_) => DynamicFilter {
                fields: serde_json::from_value(value)?,
                offset: 0,
                limit: default_limit(),
            },
            other => serde_json::from_value(other)?,
        };
        Ok(filter)
    }
}

impl FilterSpecification for DynamicFilter {
    /// Check every entry against the task field table.
    ///
    /// # Errors
    ///
    /// - `DbError::ValidationError` for an unknown or repeated field, or a
    ///   semantics that differs from the field's declared one
    /// - `DbError::TypeMismatch` / `DbError::UnknownSemantics` for a bad
    ///   semantics tag
    /// - `DbError::TypeMismatch` for a value of the wrong shape
    fn fields(&self) -> DbResult<Vec<FilterField>> {
        let mut seen = HashSet::new();
        self.fields
            .iter()
            .map(|entry| {
                let def = FieldDef::lookup(&entry.field).ok_or_else(|| {
                    DbError::validation(format!("unknown filter field '{}'", entry.field))
                })?;
                if !seen.insert(def.name) {
                    return Err(DbError::validation(format!(
                        "filter field '{}' given more than once",
                        def.name
                    )));
                }

                let semantics = StrategyRegistry::resolve_tag(&entry.semantics)?.semantics();
                if semantics != def.semantics {
                    return Err(DbError::validation(format!(
                        "field '{}' is filtered with '{}', not '{}'",
                        def.name, def.semantics, semantics
                    )));
                }

                Ok(FilterField {
                    name: def.name,
                    semantics,
                    value: FilterValue::from_json(semantics, def.kind, &entry.value)?,
                })
            })
            .collect()
    }

    fn page(&self) -> DbResult<Page> {
        Page::new(self.offset, self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_rejects_zero_limit() {
        let err = Page::new(0, 0).unwrap_err();
        assert!(matches!(err, DbError::ValidationError { .. }));
        assert_eq!(Page::default(), Page::new(0, 100).unwrap());
    }

    #[test]
    fn test_field_table_declares_semantics() {
        let declared: Vec<_> = TASK_FIELDS.iter().map(|d| (d.name, d.semantics)).collect();
        assert_eq!(
            declared,
            [
                ("title", Semantics::Like),
                ("description", Semantics::Like),
                ("done", Semantics::Exact),
                ("tags", Semantics::WithTags),
                ("reminder", Semantics::Range),
                ("repetition", Semantics::Exact),
                ("state", Semantics::InList),
                ("priority", Semantics::Range),
            ]
        );
    }

    #[test]
    fn test_task_filter_exposes_false_and_zero() {
        let filter = TaskFilter::new().with_done(false).with_priority(Some(0), None);
        let fields = filter.fields().unwrap();
        let done = fields.iter().find(|f| f.name == "done").unwrap();
        assert_eq!(done.value, Some(FilterValue::Scalar(Scalar::Bool(false))));
        let priority = fields.iter().find(|f| f.name == "priority").unwrap();
        assert_eq!(
            priority.value,
            Some(FilterValue::Range(Some(Scalar::Int(0)), None))
        );
    }

    #[test]
    fn test_task_filter_json_round_trip_is_compact() {
        let filter = TaskFilter::new().with_tags(["work"]).with_page(0, 10);
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json, json!({"tags": ["work"], "offset": 0, "limit": 10}));
        let back: TaskFilter = serde_json::from_value(json).unwrap();
        assert_eq!(back, filter);
    }

    #[test]
    fn test_task_filter_deserialize_defaults_limit() {
        let filter: TaskFilter = serde_json::from_value(json!({"done": true})).unwrap();
        assert_eq!(filter.limit, 100);
        assert_eq!(filter.done, Some(true));
    }

    #[test]
    fn test_dynamic_filter_from_bare_array() {
        let filter = DynamicFilter::from_json(
            r#"[{"field": "priority", "semantics": "range", "value": [40, 60]}]"#,
        )
        .unwrap();
        assert_eq!(filter.limit, 100);
        let fields = filter.fields().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(
            fields[0].value,
            Some(FilterValue::Range(Some(Scalar::Int(40)), Some(Scalar::Int(60))))
        );
    }

    #[test]
    fn test_dynamic_filter_unknown_field() {
        let filter = DynamicFilter::from_json(
            r#"[{"field": "owner", "semantics": "exact", "value": "bob"}]"#,
        )
        .unwrap();
        let err = filter.fields().unwrap_err();
        assert!(matches!(err, DbError::ValidationError { .. }));
    }

    #[test]
    fn test_dynamic_filter_mismatched_semantics() {
        let filter = DynamicFilter::from_json(
            r#"[{"field": "title", "semantics": "exact", "value": "x"}]"#,
        )
        .unwrap();
        let err = filter.fields().unwrap_err();
        assert!(err.to_string().contains("'like'"));
    }

    #[test]
    fn test_dynamic_filter_bad_tags() {
        let filter = DynamicFilter::from_json(
            r#"{"fields": [{"field": "title", "semantics": 123, "value": "x"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            filter.fields().unwrap_err(),
            DbError::TypeMismatch { .. }
        ));

        let filter = DynamicFilter::from_json(
            r#"{"fields": [{"field": "title", "semantics": "unknown_type", "value": "x"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            filter.fields().unwrap_err(),
            DbError::UnknownSemantics { .. }
        ));
    }

    #[test]
    fn test_dynamic_filter_malformed_json() {
        let err = DynamicFilter::from_json("{nope").unwrap_err();
        assert!(matches!(err, DbError::Serialization(_)));
    }

    #[test]
    fn test_dynamic_filter_rejects_repeated_field() {
        let filter = DynamicFilter::from_json(
            r#"[{"field": "tags", "semantics": "with_tags", "value": ["a"]},
                {"field": "tags", "semantics": "with_tags", "value": ["b"]}]"#,
        )
        .unwrap();
        let err = filter.fields().unwrap_err();
        assert!(matches!(err, DbError::ValidationError { .. }));
        assert!(err.to_string().contains("'tags' given more than once"));
    }

    #[test]
    fn test_dynamic_filter_decodes_by_column_type() {
        let filter = DynamicFilter::from_json(
            r#"[{"field": "title", "semantics": "like", "value": "2024-05-01T10:00:00Z"},
                {"field": "reminder", "semantics": "range",
                 "value": ["2024-05-01T10:00:00Z", null]}]"#,
        )
        .unwrap();
        let fields = filter.fields().unwrap();
        assert_eq!(fields[0].value, Some(FilterValue::text("2024-05-01T10:00:00Z")));
        assert!(matches!(
            fields[1].value,
            Some(FilterValue::Range(Some(Scalar::DateTime(_)), None))
        ));
    }
}
