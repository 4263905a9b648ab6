use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use super::index::MenuIndex;
use crate::models::ComposedMenuRecord;

/// How thresholds declared along an ancestor chain combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdRule {
    /// Strictest value anywhere between the record and its root. Used by the guard.
    MaxOverPath,
    /// The value closest to the root wins outright; descendants cannot change it.
    /// Used by navigation.
    FirstFromRoot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityChain {
    /// 0 when nothing on the chain declares a threshold.
    pub required: u32,
    /// Visited ids, starting at the record itself.
    pub chain: Vec<Uuid>,
    /// False when a parent id is missing from the index or the walk loops.
    pub complete: bool,
}

fn walk_up<'a>(record: &'a ComposedMenuRecord, index: &MenuIndex<'a>) -> (Vec<&'a ComposedMenuRecord>, bool) {
    let mut path = vec![record];
    let mut seen = HashSet::from([record.id]);
    let mut current = record;

    while let Some(parent_id) = current.parent_id {
        let Some(parent) = index.get(parent_id) else {
            tracing::warn!(menu_id = %current.id, %parent_id, "menu parent missing from index");
            return (path, false);
        };
        if !seen.insert(parent.id) {
            tracing::warn!(menu_id = %record.id, "menu ancestor chain loops");
            return (path, false);
        }
        path.push(parent);
        current = parent;
    }
    (path, true)
}

pub fn effective_threshold<'a>(record: &'a ComposedMenuRecord, index: &MenuIndex<'a>, rule: ThresholdRule) -> PriorityChain {
    let (path, complete) = walk_up(record, index);

    let threshold = match rule {
        ThresholdRule::MaxOverPath => path.iter().filter_map(|r| r.min_priority).max(),
        ThresholdRule::FirstFromRoot => path.iter().rev().find_map(|r| r.min_priority),
    };

    PriorityChain {
        required: threshold.unwrap_or(0),
        chain: path.iter().map(|r| r.id).collect(),
        complete,
    }
}

/// Priority the guard requires for a matched record.
pub fn required_priority<'a>(record: &'a ComposedMenuRecord, index: &MenuIndex<'a>) -> PriorityChain {
    effective_threshold(record, index, ThresholdRule::MaxOverPath)
}
