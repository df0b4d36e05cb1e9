use crate::error::DbResult;
use crate::filter::{FilterSpecification, StrategyRegistry, TaskQuery};
use tracing::trace;

/// Folds a filter specification into a query
pub struct FilterCompiler;

impl FilterCompiler {
    /// Narrow `base` by every populated field of `spec`, in declaration
    /// order.
    ///
    /// Absent values, empty strings and empty lists add nothing, so a
    /// specification with no populated field returns `base` unchanged.
    /// Paging is left to the caller.
    pub fn compile<S>(base: TaskQuery, spec: &S) -> DbResult<TaskQuery>
    where
        S: FilterSpecification + ?Sized,
    {
        spec.fields()?
            .into_iter()
            .try_fold(base, |query, field| match field.value {
                Some(value) if value.is_populated() => {
                    trace!("applying {} filter on {}", field.semantics, field.name);
                    StrategyRegistry::resolve(field.semantics).apply(query, &value, field.name)
                }
                _ => Ok(query),
            })
    }
}
