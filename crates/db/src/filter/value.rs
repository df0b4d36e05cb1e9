//! Values carried by filter fields
//!
//! A filter value is one of three shapes: a single scalar, a list of
//! strings, or a pair of optional bounds. Strategies check the shape they
//! receive and reject the others with `DbError::TypeMismatch`.

use crate::error::{DbError, DbResult};
use crate::filter::Semantics;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// A single comparable value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    DateTime(DateTime<Utc>),
    Text(String),
}

impl Scalar {
    /// Encode the scalar as a query parameter value.
    ///
    /// Datetimes travel as RFC 3339 strings and are cast back to store
    /// datetimes by [`Scalar::placeholder`].
    pub fn to_param(&self) -> Value {
        match self {
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(i) => Value::from(*i),
            Scalar::DateTime(dt) => Value::String(dt.to_rfc3339()),
            Scalar::Text(s) => Value::String(s.clone()),
        }
    }

    /// Render the query expression that reads a bound parameter of this
    /// scalar's type.
    pub fn placeholder(&self, param: &str) -> String {
        match self {
            Scalar::DateTime(_) => format!("<datetime>{}", param),
            _ => param.to_string(),
        }
    }

    /// Decode a JSON value as a scalar of `kind`.
    ///
    /// Strings are only read as datetimes where the column holds one.
    fn from_json(kind: ScalarKind, value: &Value) -> DbResult<Self> {
        let mismatch = || DbError::TypeMismatch {
            expected: kind.describe(),
            found: value.to_string(),
        };
        match (kind, value) {
            (ScalarKind::Bool, Value::Bool(b)) => Ok(Scalar::Bool(*b)),
            (ScalarKind::Int, Value::Number(n)) => n.as_i64().map(Scalar::Int).ok_or_else(mismatch),
            (ScalarKind::DateTime, Value::String(s)) => DateTime::parse_from_rfc3339(s)
                .map(|dt| Scalar::DateTime(dt.with_timezone(&Utc)))
                .map_err(|_| mismatch()),
            (ScalarKind::Text, Value::String(s)) => Ok(Scalar::Text(s.clone())),
            _ => Err(mismatch()),
        }
    }
}

/// The scalar type a task column holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int,
    DateTime,
    Text,
}

impl ScalarKind {
    fn describe(self) -> &'static str {
        match self {
            ScalarKind::Bool => "boolean",
            ScalarKind::Int => "integer",
            ScalarKind::DateTime => "RFC 3339 datetime",
            ScalarKind::Text => "string",
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Scalar::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// The value of one filter field
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Scalar(Scalar),
    List(Vec<String>),
    Range(Option<Scalar>, Option<Scalar>),
}

impl FilterValue {
    pub fn text(s: impl Into<String>) -> Self {
        FilterValue::Scalar(Scalar::Text(s.into()))
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Whether the field constrains anything at all.
    ///
    /// Empty strings and empty lists count as "no constraint". A range is
    /// always populated; a range with both bounds unset is a no-op inside
    /// the range strategy.
    pub fn is_populated(&self) -> bool {
        match self {
            FilterValue::Scalar(Scalar::Text(s)) => !s.is_empty(),
            FilterValue::Scalar(_) => true,
            FilterValue::List(items) => !items.is_empty(),
            FilterValue::Range(_, _) => true,
        }
    }

    /// Short description used in type mismatch errors
    pub fn describe(&self) -> String {
        match self {
            FilterValue::Scalar(s) => format!("scalar {}", s),
            FilterValue::List(items) => format!("list of {} item(s)", items.len()),
            FilterValue::Range(_, _) => "range".to_string(),
        }
    }

    /// Decode a JSON value into the shape expected by `semantics`, reading
    /// scalars as `kind`.
    ///
    /// `null` decodes to `None` (no constraint).
    pub fn from_json(
        semantics: Semantics,
        kind: ScalarKind,
        value: &Value,
    ) -> DbResult<Option<Self>> {
        if value.is_null() {
            return Ok(None);
        }

        let decoded = match semantics {
            Semantics::Exact | Semantics::Like => {
                FilterValue::Scalar(Scalar::from_json(kind, value)?)
            }
            Semantics::InList | Semantics::WithTags => {
                let items = value.as_array().ok_or_else(|| DbError::TypeMismatch {
                    expected: "list of strings",
                    found: value.to_string(),
                })?;
                let strings = items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .map(str::to_string)
                            .ok_or_else(|| DbError::TypeMismatch {
                                expected: "string list item",
                                found: item.to_string(),
                            })
                    })
                    .collect::<DbResult<Vec<_>>>()?;
                FilterValue::List(strings)
            }
            Semantics::Range => match value.as_array().map(Vec::as_slice) {
                Some([lower, upper]) => {
                    let bound = |v: &Value| -> DbResult<Option<Scalar>> {
                        if v.is_null() {
                            Ok(None)
                        } else {
                            Scalar::from_json(kind, v).map(Some)
                        }
                    };
                    FilterValue::Range(bound(lower)?, bound(upper)?)
                }
                _ => {
                    return Err(DbError::TypeMismatch {
                        expected: "two-element range",
                        found: value.to_string(),
                    });
                }
            },
        };

        Ok(Some(decoded))
    }
}
