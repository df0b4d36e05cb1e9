use crate::error::{DbError, DbResult};
use serde_json::Value;
use tracing::warn;

/// How a filter field's value is turned into a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semantics {
    Exact,
    Like,
    InList,
    Range,
    WithTags,
}

impl Semantics {
    /// Every semantics, in registry order
    pub const ALL: [Semantics; 5] = [
        Semantics::Exact,
        Semantics::InList,
        Semantics::Like,
        Semantics::Range,
        Semantics::WithTags,
    ];

    /// Returns the canonical tag string
    pub fn as_str(&self) -> &'static str {
        match self {
            Semantics::Exact => "exact",
            Semantics::Like => "like",
            Semantics::InList => "in_list",
            Semantics::Range => "range",
            Semantics::WithTags => "with_tags",
        }
    }

    /// Parse a semantics tag coming from outside the crate.
    ///
    /// Accepts the canonical snake_case tag and the CamelCase variant name.
    ///
    /// # Errors
    ///
    /// Returns `DbError::TypeMismatch` if the tag is not a JSON string.
    /// Returns `DbError::UnknownSemantics` if the string is not a known tag.
    pub fn from_tag(tag: &Value) -> DbResult<Self> {
        let Some(tag) = tag.as_str() else {
            warn!("semantics tag isn't a string: {}", tag);
            return Err(DbError::TypeMismatch {
                expected: "string semantics tag",
                found: tag.to_string(),
            });
        };

        Self::parse(tag).ok_or_else(|| {
            warn!("semantics tag unknown: {}", tag);
            DbError::UnknownSemantics {
                tag: tag.to_string(),
            }
        })
    }

    fn parse(tag: &str) -> Option<Self> {
        match tag {
            "exact" | "Exact" => Some(Semantics::Exact),
            "like" | "Like" => Some(Semantics::Like),
            "in_list" | "InList" => Some(Semantics::InList),
            "range" | "Range" => Some(Semantics::Range),
            "with_tags" | "WithTags" => Some(Semantics::WithTags),
            _ => None,
        }
    }
}

impl std::fmt::Display for Semantics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
