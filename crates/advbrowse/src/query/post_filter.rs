//! Unique-group filtering of ordered results.

use std::collections::{HashMap, HashSet};

use crate::error::SearchStage;
use crate::store::RecordStore;
use crate::types::{GroupId, RecordId};

/// Keeps the first record of every group, preserving order.
///
/// Records missing from `groups` are kept.
pub fn unique_groups(ids: Vec<RecordId>, groups: &HashMap<RecordId, GroupId>) -> Vec<RecordId> {
    let mut seen = HashSet::with_capacity(groups.len());
    ids.into_iter()
        .filter(|id| match groups.get(id) {
            Some(group) => seen.insert(*group),
            None => true,
        })
        .collect()
}

/// Post-search filter applied to an already ordered result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultPostFilter {
    unique_groups: bool,
}

impl ResultPostFilter {
    /// Creates a filter.
    pub fn new(unique_groups: bool) -> Self {
        Self { unique_groups }
    }

    /// Returns true if unique-group mode is on.
    pub fn unique_groups(&self) -> bool {
        self.unique_groups
    }

    /// Applies the filter. A store failure while resolving groups leaves the
    /// result unfiltered.
    pub fn apply<S>(&self, store: &S, ids: Vec<RecordId>) -> Vec<RecordId>
    where
        S: RecordStore + ?Sized,
    {
        if !self.unique_groups || ids.len() < 2 {
            return ids;
        }

        match store.group_ids(&ids) {
            Ok(groups) => {
                let before = ids.len();
                let filtered = unique_groups(ids, &groups);
                tracing::debug!(before, after = filtered.len(), "unique group filter applied");
                filtered
            }
            Err(e) => {
                tracing::warn!(error = %e.at_stage(SearchStage::PostFilter), "unique group filter skipped");
                ids
            }
        }
    }
}
