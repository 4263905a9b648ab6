use std::collections::HashMap;

use uuid::Uuid;

use crate::models::ComposedMenuRecord;

/// Arena view over a composed record slice: O(1) lookup by id and ordered
/// child lists, without any owned parent/child pointers.
#[derive(Debug)]
pub struct MenuIndex<'a> {
    records: &'a [ComposedMenuRecord],
    by_id: HashMap<Uuid, usize>,
    children: HashMap<Option<Uuid>, Vec<usize>>,
}

impl<'a> MenuIndex<'a> {
    pub fn new(records: &'a [ComposedMenuRecord]) -> Self {
        let mut by_id = HashMap::with_capacity(records.len());
        let mut children: HashMap<Option<Uuid>, Vec<usize>> = HashMap::new();

        for (slot, record) in records.iter().enumerate() {
            by_id.insert(record.id, slot);
            children.entry(record.parent_id).or_default().push(slot);
        }

        for slots in children.values_mut() {
            slots.sort_by(|&a, &b| {
                let (a, b) = (&records[a], &records[b]);
                a.effective_order
                    .cmp(&b.effective_order)
                    .then_with(|| a.order.cmp(&b.order))
                    .then_with(|| a.id.cmp(&b.id))
            });
        }

        Self {
            records,
            by_id,
            children,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&'a ComposedMenuRecord> {
        let records = self.records;
        self.by_id.get(&id).map(move |&slot| &records[slot])
    }

    pub fn parent(&self, record: &ComposedMenuRecord) -> Option<&'a ComposedMenuRecord> {
        record.parent_id.and_then(|id| self.get(id))
    }

    /// Children of `parent` (`None` for roots), in sibling order.
    pub fn children(&self, parent: Option<Uuid>) -> impl Iterator<Item = &'a ComposedMenuRecord> + '_ {
        let records = self.records;
        self.children
            .get(&parent)
            .into_iter()
            .flatten()
            .map(move |&slot| &records[slot])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
