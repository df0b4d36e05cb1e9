//! Filter compilation for task queries
//!
//! A [`FilterSpecification`] is folded field by field through the
//! [`StrategyRegistry`] into a [`TaskQuery`]:
//!
//! ```text
//! TaskFilter / DynamicFilter ──► FilterCompiler ──► StrategyRegistry ──► TaskQuery
//! ```

pub mod compiler;
pub mod query;
pub mod semantics;
pub mod spec;
pub mod strategy;
pub mod value;

pub use compiler::FilterCompiler;
pub use query::TaskQuery;
pub use semantics::Semantics;
pub use spec::{
    DynamicField, DynamicFilter, FieldDef, FilterField, FilterSpecification, Page, TASK_FIELDS,
    TaskFilter,
};
pub use strategy::{PredicateStrategy, StrategyRegistry};
pub use value::{FilterValue, Scalar, ScalarKind};
