//! Per-department cache of composed menu sets

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::authz::{compose_menus, ComposeMode, MenuSource};
use crate::errors::AppResult;
use crate::events::event_department;
use crate::models::ComposedMenuRecord;

type CacheKey = (Uuid, ComposeMode);

/// Composed records keyed by department and mode.
///
/// Every overlay write calls [`DepartmentMenuCache::invalidate`] before it
/// returns. A composition that started before an invalidation is never
/// stored: each department carries a generation counter and inserts only
/// succeed when it has not moved.
#[derive(Default)]
pub struct DepartmentMenuCache {
    entries: DashMap<CacheKey, Arc<Vec<ComposedMenuRecord>>>,
    generations: DashMap<Uuid, u64>,
}

impl DepartmentMenuCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, department_id: Uuid, mode: ComposeMode) -> Option<Arc<Vec<ComposedMenuRecord>>> {
        self.entries.get(&(department_id, mode)).map(|entry| Arc::clone(entry.value()))
    }

    fn generation(&self, department_id: Uuid) -> u64 {
        self.generations.get(&department_id).map(|g| *g).unwrap_or(0)
    }

    pub async fn get_or_compose<S>(
        &self,
        source: &S,
        department_id: Uuid,
        mode: ComposeMode,
    ) -> AppResult<Arc<Vec<ComposedMenuRecord>>>
    where
        S: MenuSource + ?Sized,
    {
        if let Some(hit) = self.get(department_id, mode) {
            return Ok(hit);
        }

        let started_at = self.generation(department_id);
        let records = Arc::new(compose_menus(source, department_id, mode).await?);

        let generation = self.generations.entry(department_id).or_insert(0);
        if *generation == started_at {
            self.entries.insert((department_id, mode), Arc::clone(&records));
        } else {
            tracing::debug!(%department_id, "menus changed while composing, not caching");
        }
        drop(generation);

        Ok(records)
    }

    pub fn invalidate(&self, department_id: Uuid) {
        let mut generation = self.generations.entry(department_id).or_insert(0);
        *generation += 1;
        for mode in [ComposeMode::Authorization, ComposeMode::Listing] {
            self.entries.remove(&(department_id, mode));
        }
        drop(generation);
        tracing::debug!(%department_id, "menu cache invalidated");
    }

    pub fn clear(&self) {
        let departments: Vec<Uuid> = self.entries.iter().map(|e| e.key().0).collect();
        for department_id in departments {
            self.invalidate(department_id);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Invalidates `cache` for every department named by an event on the bus.
pub fn spawn_invalidation_listener(cache: Arc<DepartmentMenuCache>, mut rx: broadcast::Receiver<Value>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(department_id) = event_department(&event) {
                        cache.invalidate(department_id);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // missed events may have named any department
                    tracing::warn!(skipped, "cache listener lagged, clearing");
                    cache.clear();
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
