use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::{DepartmentMenuOverlay, DepartmentRoleOverlay, Identity, MenuNode, RoleOverride, RoleTemplate};

/// Maps an authenticated user to their department and role reference.
#[async_trait]
pub trait IdentitySource: Send + Sync {
    /// `None` for unknown or deactivated users.
    async fn identity(&self, user_id: Uuid) -> AppResult<Option<Identity>>;
}

/// Read access to role templates and department role overlays.
#[async_trait]
pub trait RoleSource: Send + Sync {
    async fn role_template(&self, role_id: Uuid) -> AppResult<Option<RoleTemplate>>;

    async fn department_role(&self, department_role_id: Uuid) -> AppResult<Option<DepartmentRoleOverlay>>;

    /// The department's override of `role_id`, if it has one.
    async fn override_for_role(&self, department_id: Uuid, role_id: Uuid) -> AppResult<Option<RoleOverride>>;

    async fn active_role_templates(&self) -> AppResult<Vec<RoleTemplate>>;

    async fn department_roles(&self, department_id: Uuid) -> AppResult<Vec<DepartmentRoleOverlay>>;
}

/// Read access to menu templates and department menu overlays.
#[async_trait]
pub trait MenuSource: Send + Sync {
    /// Templates with `is_active = true`, in any order.
    async fn active_menu_templates(&self) -> AppResult<Vec<MenuNode>>;

    async fn department_menu_overlays(&self, department_id: Uuid) -> AppResult<Vec<DepartmentMenuOverlay>>;
}
