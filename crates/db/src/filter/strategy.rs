//! Predicate strategies and the registry that maps semantics to them
//!
//! Each strategy turns one field's value into a condition on a
//! [`TaskQuery`]. Strategies are stateless unit structs living in statics,
//! so the registry hands out `&'static` references and never allocates.

use crate::error::{DbError, DbResult};
use crate::filter::{FilterValue, Scalar, Semantics, TaskQuery};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Turns a field value into a narrowing condition on a query
pub trait PredicateStrategy: Send + Sync {
    /// Add the condition for `field` matching `value`.
    ///
    /// # Errors
    ///
    /// Returns `DbError::TypeMismatch` if `value` isn't the shape this
    /// strategy works on.
    fn apply(&self, query: TaskQuery, value: &FilterValue, field: &str) -> DbResult<TaskQuery>;

    fn semantics(&self) -> Semantics;
}

fn mismatch(expected: &'static str, value: &FilterValue) -> DbError {
    DbError::TypeMismatch {
        expected,
        found: value.describe(),
    }
}

/// Equality: `field = value`
#[derive(Debug)]
pub struct Exact;

impl PredicateStrategy for Exact {
    fn apply(&self, mut query: TaskQuery, value: &FilterValue, field: &str) -> DbResult<TaskQuery> {
        let FilterValue::Scalar(scalar) = value else {
            return Err(mismatch("scalar", value));
        };
        let param = query.bind(field, scalar.to_param());
        let condition = format!("{} = {}", field, scalar.placeholder(&param));
        Ok(query.and_where(condition))
    }

    fn semantics(&self) -> Semantics {
        Semantics::Exact
    }
}

/// Pattern match: `%` matches any run of characters, `_` exactly one.
///
/// Matching is case-insensitive and anchored at both ends, so `%deploy%`
/// finds "Deploy to prod" while `deploy` only matches the whole value.
/// A backslash escapes `%`, `_` or itself. Records whose field is unset
/// never match.
#[derive(Debug)]
pub struct Like;

impl PredicateStrategy for Like {
    fn apply(&self, mut query: TaskQuery, value: &FilterValue, field: &str) -> DbResult<TaskQuery> {
        let FilterValue::Scalar(Scalar::Text(pattern)) = value else {
            return Err(mismatch("string pattern", value));
        };
        let regex = like_to_regex(pattern);
        trace!("like pattern {:?} compiled to {:?}", pattern, regex);
        let param = query.bind(field, Value::String(regex));
        let condition = format!(
            "({field} != NONE AND string::matches({field} ?? \"\", {param}))"
        );
        Ok(query.and_where(condition))
    }

    fn semantics(&self) -> Semantics {
        Semantics::Like
    }
}

/// Compile a `%`/`_` pattern into an anchored, case-insensitive regex.
pub fn like_to_regex(pattern: &str) -> String {
    let mut out = String::from("(?is)^");
    let mut literal = String::new();
    let mut chars = pattern.chars();

    let flush = |literal: &mut String, out: &mut String| {
        if !literal.is_empty() {
            out.push_str(&regex::escape(literal));
            literal.clear();
        }
    };

    while let Some(c) = chars.next() {
        match c {
            '%' => {
                flush(&mut literal, &mut out);
                out.push_str(".*");
            }
            '_' => {
                flush(&mut literal, &mut out);
                out.push('.');
            }
            '\\' => match chars.next() {
                Some(escaped) => literal.push(escaped),
                None => literal.push('\\'),
            },
            other => literal.push(other),
        }
    }
    flush(&mut literal, &mut out);

    out.push('$');
    out
}

/// Membership: `field IN [values]`
#[derive(Debug)]
pub struct InList;

impl PredicateStrategy for InList {
    fn apply(&self, mut query: TaskQuery, value: &FilterValue, field: &str) -> DbResult<TaskQuery> {
        let FilterValue::List(items) = value else {
            return Err(mismatch("list of strings", value));
        };
        let param = query.bind(field, Value::from(items.clone()));
        Ok(query.and_where(format!("{} IN {}", field, param)))
    }

    fn semantics(&self) -> Semantics {
        Semantics::InList
    }
}

/// Inclusive bounds; an unset bound leaves that side open
///
/// Records whose field is unset never match a bounded side, which the
/// store's ordering (NONE sorts first) would otherwise let through an
/// upper bound.
#[derive(Debug)]
pub struct Range;

impl PredicateStrategy for Range {
    fn apply(&self, mut query: TaskQuery, value: &FilterValue, field: &str) -> DbResult<TaskQuery> {
        let FilterValue::Range(lower, upper) = value else {
            return Err(mismatch("range", value));
        };

        if let Some(lower) = lower {
            let param = query.bind(field, lower.to_param());
            query = query.and_where(format!("{} >= {}", field, lower.placeholder(&param)));
        }
        if let Some(upper) = upper {
            let param = query.bind(field, upper.to_param());
            query = query.and_where(format!(
                "({field} != NONE AND {field} <= {})",
                upper.placeholder(&param)
            ));
        }

        Ok(query)
    }

    fn semantics(&self) -> Semantics {
        Semantics::Range
    }
}

/// Records carrying every requested tag name (and possibly more)
///
/// Evaluated as one aggregate over the record's own tag links: the distinct
/// tag names present, intersected with the requested set, must be as large
/// as the requested set.
#[derive(Debug)]
pub struct WithTags;

impl PredicateStrategy for WithTags {
    fn apply(&self, mut query: TaskQuery, value: &FilterValue, field: &str) -> DbResult<TaskQuery> {
        let FilterValue::List(names) = value else {
            return Err(mismatch("list of tag names", value));
        };
        let wanted: BTreeSet<&str> = names.iter().map(String::as_str).collect();
        let count = wanted.len();
        let param = query.bind(field, Value::from(wanted.into_iter().collect::<Vec<_>>()));
        let condition = format!(
            "array::len(array::intersect(array::distinct({field}.name), {param})) = {count}"
        );
        Ok(query.and_where(condition))
    }

    fn semantics(&self) -> Semantics {
        Semantics::WithTags
    }
}

static EXACT: Exact = Exact;
static LIKE: Like = Like;
static IN_LIST: InList = InList;
static RANGE: Range = Range;
static WITH_TAGS: WithTags = WithTags;

/// Fixed mapping from semantics to strategy
pub struct StrategyRegistry;

impl StrategyRegistry {
    /// Look up the strategy for a semantics value.
    pub fn resolve(semantics: Semantics) -> &'static dyn PredicateStrategy {
        match semantics {
            Semantics::Exact => &EXACT,
            Semantics::Like => &LIKE,
            Semantics::InList => &IN_LIST,
            Semantics::Range => &RANGE,
            Semantics::WithTags => &WITH_TAGS,
        }
    }

    /// Look up the strategy for a raw semantics tag.
    ///
    /// # Errors
    ///
    /// Returns `DbError::TypeMismatch` if the tag isn't a string, or
    /// `DbError::UnknownSemantics` if it names no strategy.
    pub fn resolve_tag(tag: &Value) -> DbResult<&'static dyn PredicateStrategy> {
        let semantics = Semantics::from_tag(tag)?;
        debug!("resolved semantics tag {} to {}", tag, semantics);
        Ok(Self::resolve(semantics))
    }
}
