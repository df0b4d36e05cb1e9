//! Association reconciliation
//!
//! A task's tags and workbenches are changed through deltas: the new
//! membership is `(current ∪ add) − remove`, so a key named in both `add`
//! and `remove` ends up removed, and applying the same delta twice changes
//! nothing the second time. What differs per association is how the target
//! keys become members, which is the job of a [`MembershipResolver`].

use crate::error::DbResult;
use crate::models::Tenant;
use crate::unit_of_work::UnitOfWork;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::future::Future;
use tracing::debug;

/// Keys to add to and remove from a membership
///
/// `None` and an empty list both mean "no change on this side".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationDelta<K> {
    pub add: Option<Vec<K>>,
    pub remove: Option<Vec<K>>,
}

impl<K> Default for AssociationDelta<K> {
    fn default() -> Self {
        Self {
            add: None,
            remove: None,
        }
    }
}

impl<K> AssociationDelta<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.add.get_or_insert_with(Vec::new).extend(keys);
        self
    }

    pub fn remove(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.remove.get_or_insert_with(Vec::new).extend(keys);
        self
    }

    /// Check if the delta names no key at all
    pub fn is_empty(&self) -> bool {
        self.add.as_ref().is_none_or(Vec::is_empty)
            && self.remove.as_ref().is_none_or(Vec::is_empty)
    }
}

/// Compute `(current ∪ add) − remove`.
pub fn target_membership<K>(current: &BTreeSet<K>, delta: &AssociationDelta<K>) -> BTreeSet<K>
where
    K: Ord + Clone,
{
    let mut target = current.clone();
    if let Some(add) = &delta.add {
        target.extend(add.iter().cloned());
    }
    if let Some(remove) = &delta.remove {
        for key in remove {
            target.remove(key);
        }
    }
    target
}

/// Turns target keys into members for one kind of association
pub trait MembershipResolver {
    type Key: Ord + Clone + Debug;
    type Member;

    fn key_of(member: &Self::Member) -> Self::Key;

    /// Resolve every key of `target` into a member.
    ///
    /// `current` holds the members before the change, so keys already
    /// resolved don't need another lookup. Anything created along the way
    /// is staged in `uow`. On error nothing of the result is used.
    fn resolve(
        &self,
        tenant: &Tenant,
        current: &[Self::Member],
        target: &BTreeSet<Self::Key>,
        uow: &mut UnitOfWork,
    ) -> impl Future<Output = DbResult<Vec<Self::Member>>>;
}

/// Compute the new membership for `current` under `delta`.
///
/// The caller replaces the whole collection with the returned members.
pub async fn reconcile<R>(
    resolver: &R,
    tenant: &Tenant,
    current: &[R::Member],
    delta: &AssociationDelta<R::Key>,
    uow: &mut UnitOfWork,
) -> DbResult<Vec<R::Member>>
where
    R: MembershipResolver,
{
    let current_keys: BTreeSet<R::Key> = current.iter().map(R::key_of).collect();
    let target = target_membership(&current_keys, delta);
    debug!(
        "reconciling membership for {}: {:?} -> {:?}",
        tenant, current_keys, target
    );
    resolver.resolve(tenant, current, &target, uow).await
}
