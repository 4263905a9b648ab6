use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::index::MenuIndex;
use super::priority::{effective_threshold, ThresholdRule};
use crate::models::ComposedMenuRecord;

/// Prunes a composed record set to what a caller with `priority` sees in the sidebar.
///
/// Output is in depth-first order with `effective_order` renumbered `0..N`
/// within each sibling group.
pub fn filter_for_navigation(records: &[ComposedMenuRecord], priority: u32) -> Vec<ComposedMenuRecord> {
    let index = MenuIndex::new(records);
    let mut kept = Vec::new();
    visit(&index, None, priority, &mut kept);

    let before = kept.len();
    drop_empty_sections(&mut kept);

    let mut next_order: HashMap<Option<Uuid>, i64> = HashMap::new();
    for record in &mut kept {
        let slot = next_order.entry(record.parent_id).or_insert(0);
        record.effective_order = *slot;
        *slot += 1;
    }

    tracing::debug!(
        priority,
        records = records.len(),
        visible = before,
        kept = kept.len(),
        "filtered navigation"
    );
    kept
}

fn visit(index: &MenuIndex<'_>, parent: Option<Uuid>, priority: u32, kept: &mut Vec<ComposedMenuRecord>) {
    for record in index.children(parent) {
        if !record.effective_is_active || record.effective_hidden {
            continue;
        }
        let threshold = effective_threshold(record, index, ThresholdRule::FirstFromRoot);
        if !threshold.complete || priority < threshold.required {
            continue;
        }
        kept.push(record.clone());
        visit(index, Some(record.id), priority, kept);
    }
}

/// Removing one section can empty its parent section, so repeat until stable.
fn drop_empty_sections(kept: &mut Vec<ComposedMenuRecord>) {
    loop {
        let parents: HashSet<Uuid> = kept.iter().filter_map(|r| r.parent_id).collect();
        let before = kept.len();
        kept.retain(|r| !r.is_section || parents.contains(&r.id));
        if kept.len() == before {
            break;
        }
    }
}
