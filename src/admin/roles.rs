use std::sync::Arc;

use uuid::Uuid;

use crate::authz::{assignable_roles, Principal, RoleSource};
use crate::db::SqliteCatalog;
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity, EventBus};
use crate::models::{
    AssignableRoleOption, CustomRole, CustomRoleRequest, DepartmentRoleOverlay, RoleOverride, RoleOverrideRequest,
};
use crate::service::GuardService;

pub struct RoleAdmin {
    service: Arc<GuardService<SqliteCatalog>>,
    events: EventBus,
}

impl RoleAdmin {
    pub fn new(service: Arc<GuardService<SqliteCatalog>>, events: EventBus) -> Self {
        Self { service, events }
    }

    fn catalog(&self) -> &SqliteCatalog {
        self.service.catalog().as_ref()
    }

    /// Role edits also need the edit-data capability.
    async fn require_role_editor(&self, actor_id: Uuid) -> AppResult<Principal> {
        let principal = self.service.require_admin(actor_id).await?;
        if !principal.can_edit_data() {
            tracing::warn!(%actor_id, "role edit denied: no edit capability");
            return Err(AppError::permission_denied("editing roles requires the edit-data capability"));
        }
        Ok(principal)
    }

    /// Department overlay `id`, or `NotFoundReference` if it belongs elsewhere.
    async fn own_overlay(&self, department_id: Uuid, id: Uuid) -> AppResult<DepartmentRoleOverlay> {
        match self.catalog().department_role(id).await? {
            Some(overlay) if overlay.department_id() == department_id => Ok(overlay),
            _ => Err(AppError::not_found(format!("department role {id}"))),
        }
    }

    pub async fn assignable_roles(&self, actor_id: Uuid) -> AppResult<Vec<AssignableRoleOption>> {
        let principal = self.service.require_admin(actor_id).await?;
        assignable_roles(self.catalog(), principal.department_id).await
    }

    pub async fn create_custom(&self, actor_id: Uuid, req: CustomRoleRequest) -> AppResult<CustomRole> {
        let principal = self.require_role_editor(actor_id).await?;
        req.validate()?;

        let custom = self.catalog().insert_custom_role(principal.department_id, &req).await?;
        let logged = DepartmentRoleOverlay::Custom(custom.clone());
        log_activity(&self.events, "created", Some(actor_id), &logged, None);
        tracing::info!(department_id = %principal.department_id, role_id = %custom.id, code = %custom.code, "custom role created");
        Ok(custom)
    }

    pub async fn update_custom(&self, actor_id: Uuid, id: Uuid, req: CustomRoleRequest) -> AppResult<CustomRole> {
        let principal = self.require_role_editor(actor_id).await?;
        req.validate()?;

        let old = self.own_overlay(principal.department_id, id).await?;
        if !matches!(old, DepartmentRoleOverlay::Custom(_)) {
            return Err(AppError::validation(format!("department role {id} is an override, not a custom role")));
        }

        let custom = self
            .catalog()
            .update_custom_role(principal.department_id, id, &req)
            .await?
            .ok_or_else(|| AppError::not_found(format!("department role {id}")))?;
        let logged = DepartmentRoleOverlay::Custom(custom.clone());
        log_activity(&self.events, "updated", Some(actor_id), &logged, Some(&old));
        Ok(custom)
    }

    /// Creates or replaces the department's cosmetic override of a role.
    pub async fn upsert_override(&self, actor_id: Uuid, req: RoleOverrideRequest) -> AppResult<RoleOverride> {
        let principal = self.require_role_editor(actor_id).await?;
        req.validate()?;

        match self.catalog().role_template(req.role_id).await? {
            Some(template) if template.is_active => {}
            _ => return Err(AppError::not_found(format!("role {}", req.role_id))),
        }

        let department_id = principal.department_id;
        let old = self
            .catalog()
            .override_for_role(department_id, req.role_id)
            .await?
            .map(DepartmentRoleOverlay::Override);
        let saved = self.catalog().save_override(department_id, &req).await?;

        let action = if old.is_some() { "updated" } else { "created" };
        let logged = DepartmentRoleOverlay::Override(saved.clone());
        log_activity(&self.events, action, Some(actor_id), &logged, old.as_ref());
        tracing::info!(%department_id, role_id = %req.role_id, action, "role override saved");
        Ok(saved)
    }

    /// Removes an overlay. Fails with `Conflict` while users still hold it.
    pub async fn delete_overlay(&self, actor_id: Uuid, id: Uuid) -> AppResult<()> {
        let principal = self.require_role_editor(actor_id).await?;
        let old = self.own_overlay(principal.department_id, id).await?;

        if !self.catalog().delete_department_role(principal.department_id, id).await? {
            return Err(AppError::not_found(format!("department role {id}")));
        }
        log_activity(&self.events, "deleted", Some(actor_id), &old, None);
        tracing::info!(department_id = %principal.department_id, role_id = %id, "department role deleted");
        Ok(())
    }
}
