use std::sync::Arc;

use uuid::Uuid;

use crate::authz::{ComposeMode, Principal};
use crate::db::catalog::SiblingOrder;
use crate::db::SqliteCatalog;
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity, EventBus};
use crate::models::{ComposedMenuRecord, DepartmentMenuOverlay, MenuNode, MoveDirection};
use crate::service::GuardService;

pub struct MenuAdmin {
    service: Arc<GuardService<SqliteCatalog>>,
    events: EventBus,
}

impl MenuAdmin {
    pub fn new(service: Arc<GuardService<SqliteCatalog>>, events: EventBus) -> Self {
        Self { service, events }
    }

    fn catalog(&self) -> &SqliteCatalog {
        self.service.catalog().as_ref()
    }

    /// Active template that a department may customise.
    async fn editable_template(&self, menu_id: Uuid) -> AppResult<MenuNode> {
        let template = self
            .catalog()
            .menu_template(menu_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("menu {menu_id}")))?;
        if !template.is_active {
            return Err(AppError::validation(format!("menu {menu_id} is disabled in the catalog")));
        }
        Ok(template)
    }

    /// Records an administrator edits, template-hidden ones excluded.
    pub async fn listing(&self, actor_id: Uuid) -> AppResult<Arc<Vec<ComposedMenuRecord>>> {
        let principal = self.service.require_admin(actor_id).await?;
        self.service.records(principal.department_id, ComposeMode::Listing).await
    }

    /// `true` writes an explicit hide; `false` clears the overlay back to the template.
    pub async fn set_hidden(&self, actor_id: Uuid, menu_id: Uuid, hidden: bool) -> AppResult<DepartmentMenuOverlay> {
        let principal = self.service.require_admin(actor_id).await?;
        let template = self.editable_template(menu_id).await?;
        if hidden && template.lock_hidden_override {
            tracing::warn!(%actor_id, %menu_id, "refusing to hide a locked menu");
            return Err(AppError::VisibilityLocked(menu_id));
        }

        let department_id = principal.department_id;
        let old = self.catalog().menu_overlay(department_id, menu_id).await?;
        let overlay = self
            .catalog()
            .set_hidden_override(department_id, menu_id, hidden.then_some(true))
            .await?;

        self.after_write(&principal, if hidden { "hidden" } else { "shown" }, &overlay, old.as_ref());
        Ok(overlay)
    }

    /// `false` disables the menu for the department; `true` clears the overlay.
    pub async fn set_enabled(&self, actor_id: Uuid, menu_id: Uuid, enabled: bool) -> AppResult<DepartmentMenuOverlay> {
        let principal = self.service.require_admin(actor_id).await?;
        self.editable_template(menu_id).await?;

        let department_id = principal.department_id;
        let old = self.catalog().menu_overlay(department_id, menu_id).await?;
        let overlay = self
            .catalog()
            .set_enabled_override(department_id, menu_id, (!enabled).then_some(false))
            .await?;

        self.after_write(&principal, if enabled { "enabled" } else { "disabled" }, &overlay, old.as_ref());
        Ok(overlay)
    }

    /// Swaps a menu with its neighbour among active siblings.
    ///
    /// Returns `false` without writing when the menu is already at that edge.
    /// Siblings sharing an order are renumbered densely first, so the move
    /// is always visible.
    pub async fn move_order(&self, actor_id: Uuid, menu_id: Uuid, direction: MoveDirection) -> AppResult<bool> {
        let principal = self.service.require_admin(actor_id).await?;
        let template = self.editable_template(menu_id).await?;
        let department_id = principal.department_id;

        let mut siblings = self.catalog().sibling_orders(department_id, template.parent_id).await?;
        siblings.sort_by(|a, b| {
            a.effective()
                .cmp(&b.effective())
                .then_with(|| a.template_order.cmp(&b.template_order))
                .then_with(|| a.menu_id.cmp(&b.menu_id))
        });

        let position = siblings
            .iter()
            .position(|s| s.menu_id == menu_id)
            .ok_or_else(|| AppError::not_found(format!("menu {menu_id} among its siblings")))?;
        let neighbour = match direction {
            MoveDirection::Up => position.checked_sub(1),
            MoveDirection::Down => Some(position + 1).filter(|&i| i < siblings.len()),
        };
        let Some(neighbour) = neighbour else {
            tracing::debug!(%menu_id, ?direction, "menu already at the edge");
            return Ok(false);
        };

        let writes = reorder_plan(&siblings, position, neighbour);
        let mut olds = Vec::with_capacity(writes.len());
        for (row, _) in &writes {
            olds.push((row.menu_id, self.catalog().menu_overlay(department_id, row.menu_id).await?));
        }

        self.catalog().write_orders(department_id, &writes).await?;
        self.service.cache().invalidate(department_id);

        for (id, old) in olds {
            if let Some(current) = self.catalog().menu_overlay(department_id, id).await? {
                log_activity(&self.events, "reordered", Some(principal.user_id), &current, old.as_ref());
            }
        }
        tracing::info!(%department_id, %menu_id, ?direction, "menu reordered");
        Ok(true)
    }

    fn after_write(
        &self,
        principal: &Principal,
        action: &str,
        overlay: &DepartmentMenuOverlay,
        old: Option<&DepartmentMenuOverlay>,
    ) {
        self.service.cache().invalidate(principal.department_id);
        log_activity(&self.events, action, Some(principal.user_id), overlay, old);
        tracing::info!(
            department_id = %principal.department_id,
            menu_id = %overlay.menu_id,
            action,
            "menu overlay updated"
        );
    }
}

/// Order writes that move `siblings[position]` into `neighbour`'s slot.
///
/// `siblings` must be sorted the way navigation sorts them. Distinct neighbours
/// exchange their orders. Tied neighbours would not change places that way, so
/// the whole group is renumbered `0..n` with the pair swapped, and only rows
/// whose effective order changes are written.
pub(crate) fn reorder_plan(siblings: &[SiblingOrder], position: usize, neighbour: usize) -> Vec<(SiblingOrder, i64)> {
    let (moved, other) = (siblings[position], siblings[neighbour]);
    if moved.effective() != other.effective() {
        return vec![(moved, other.effective()), (other, moved.effective())];
    }

    let mut slots: Vec<SiblingOrder> = siblings.to_vec();
    slots.swap(position, neighbour);
    slots
        .into_iter()
        .zip(0_i64..)
        .filter(|(row, order)| row.effective() != *order)
        .collect()
}
