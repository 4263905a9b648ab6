use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::events::{Loggable, Severity};

// =============================================================================
// ROLE TEMPLATE
// =============================================================================

/// Globally defined role. Priority and capability flags live only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTemplate {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub priority: u32,
    pub badge_color: Option<String>,
    pub can_edit_data: bool,
    pub can_download_data: bool,
    pub is_active: bool,
}

// =============================================================================
// ROLE REFERENCE (XOR)
// =============================================================================

/// What a user row points at: a global role or a department-local overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RoleRef {
    Role(Uuid),
    DepartmentRole(Uuid),
}

impl RoleRef {
    /// Builds a reference from the two nullable columns of a user row.
    ///
    /// Exactly one of them must be set.
    pub fn from_columns(role_id: Option<Uuid>, department_role_id: Option<Uuid>) -> Result<Self, AppError> {
        match (role_id, department_role_id) {
            (Some(id), None) => Ok(RoleRef::Role(id)),
            (None, Some(id)) => Ok(RoleRef::DepartmentRole(id)),
            (Some(_), Some(_)) => Err(AppError::internal("user references both a role and a department role")),
            (None, None) => Err(AppError::internal("user references neither a role nor a department role")),
        }
    }

    /// Column values in `(role_id, department_role_id)` order.
    pub fn to_columns(self) -> (Option<Uuid>, Option<Uuid>) {
        match self {
            RoleRef::Role(id) => (Some(id), None),
            RoleRef::DepartmentRole(id) => (None, Some(id)),
        }
    }
}

// =============================================================================
// DEPARTMENT ROLE OVERLAY
// =============================================================================

/// Cosmetic layer over a template. Deliberately has no priority or capability fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleOverride {
    pub id: Uuid,
    pub department_id: Uuid,
    pub role_id: Uuid,
    pub name_override: Option<String>,
    pub badge_color_override: Option<String>,
    pub is_enabled: bool,
}

/// Department-local role with no template behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRole {
    pub id: Uuid,
    pub department_id: Uuid,
    pub code: String,
    pub name: String,
    pub priority: u32,
    pub badge_color: Option<String>,
    pub can_edit_data: bool,
    pub can_download_data: bool,
    pub is_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DepartmentRoleOverlay {
    Override(RoleOverride),
    Custom(CustomRole),
}

impl DepartmentRoleOverlay {
    pub fn id(&self) -> Uuid {
        match self {
            DepartmentRoleOverlay::Override(o) => o.id,
            DepartmentRoleOverlay::Custom(c) => c.id,
        }
    }

    pub fn department_id(&self) -> Uuid {
        match self {
            DepartmentRoleOverlay::Override(o) => o.department_id,
            DepartmentRoleOverlay::Custom(c) => c.department_id,
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            DepartmentRoleOverlay::Override(o) => o.is_enabled,
            DepartmentRoleOverlay::Custom(c) => c.is_enabled,
        }
    }
}

impl Loggable for DepartmentRoleOverlay {
    fn entity_type() -> &'static str { "department_role" }
    fn subject_id(&self) -> Uuid { self.id() }
    fn department_id(&self) -> Uuid { DepartmentRoleOverlay::department_id(self) }
    fn severity(&self) -> Severity { Severity::Critical }
}

/// Flat storage row; either shape fits in it.
#[derive(Debug, Clone)]
pub struct DbDepartmentRole {
    pub id: Uuid,
    pub department_id: Uuid,
    pub role_id: Option<Uuid>,
    pub name_override: Option<String>,
    pub badge_color_override: Option<String>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub priority: Option<i64>,
    pub badge_color: Option<String>,
    pub can_edit_data: Option<bool>,
    pub can_download_data: Option<bool>,
    pub is_enabled: bool,
}

impl TryFrom<DbDepartmentRole> for DepartmentRoleOverlay {
    type Error = AppError;

    fn try_from(db: DbDepartmentRole) -> Result<Self, Self::Error> {
        if let Some(role_id) = db.role_id {
            return Ok(DepartmentRoleOverlay::Override(RoleOverride {
                id: db.id,
                department_id: db.department_id,
                role_id,
                name_override: db.name_override,
                badge_color_override: db.badge_color_override,
                is_enabled: db.is_enabled,
            }));
        }

        let missing = |col: &str| AppError::internal(format!("custom department role {} has no {col}", db.id));
        let priority = db.priority.ok_or_else(|| missing("priority"))?;
        let priority = u32::try_from(priority)
            .map_err(|_| AppError::internal(format!("department role {} has invalid priority {priority}", db.id)))?;

        Ok(DepartmentRoleOverlay::Custom(CustomRole {
            id: db.id,
            department_id: db.department_id,
            code: db.code.ok_or_else(|| missing("code"))?,
            name: db.name.ok_or_else(|| missing("name"))?,
            priority,
            badge_color: db.badge_color,
            can_edit_data: db.can_edit_data.ok_or_else(|| missing("can_edit_data"))?,
            can_download_data: db.can_download_data.ok_or_else(|| missing("can_download_data"))?,
            is_enabled: db.is_enabled,
        }))
    }
}

// =============================================================================
// EFFECTIVE ROLE (computed)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleOrigin {
    Role,
    Override,
    Custom,
}

/// The single role view a department sees for one identity. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveRole {
    pub code: String,
    pub name: String,
    pub priority: u32,
    pub badge_color: Option<String>,
    pub can_edit_data: bool,
    pub can_download_data: bool,
    pub enabled_in_department: bool,
    pub origin: RoleOrigin,
}

// =============================================================================
// ASSIGNABLE ROLE OPTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignableRoleOption {
    pub role_ref: RoleRef,
    pub label: String,
    pub priority: u32,
    pub disabled: bool,
}

// =============================================================================
// WRITE REQUESTS
// =============================================================================

pub const ROLE_CODE_MAX: usize = 50;
pub const ROLE_NAME_MAX: usize = 100;
/// Custom roles stay strictly below the administrative threshold.
pub const CUSTOM_PRIORITY_MAX: u32 = 99;

#[derive(Debug, Clone, Deserialize)]
pub struct CustomRoleRequest {
    pub code: String,
    pub name: String,
    pub priority: u32,
    pub badge_color: Option<String>,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
    pub can_edit_data: bool,
    pub can_download_data: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleOverrideRequest {
    pub role_id: Uuid,
    pub name_override: Option<String>,
    pub badge_color_override: Option<String>,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
}

fn default_enabled() -> bool {
    true
}

fn is_role_code(code: &str) -> bool {
    let mut chars = code.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn is_badge_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

impl CustomRoleRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let code_len = self.code.chars().count();
        if !(2..=ROLE_CODE_MAX).contains(&code_len) || !is_role_code(&self.code) {
            return Err(AppError::validation(format!(
                "code must be 2..={ROLE_CODE_MAX} characters of A-Z, 0-9 or _ starting with a letter"
            )));
        }
        let name_len = self.name.chars().count();
        if !(1..=ROLE_NAME_MAX).contains(&name_len) {
            return Err(AppError::validation(format!("name must be 1..={ROLE_NAME_MAX} characters")));
        }
        if self.priority > CUSTOM_PRIORITY_MAX {
            return Err(AppError::validation(format!("priority must be at most {CUSTOM_PRIORITY_MAX}")));
        }
        if let Some(color) = &self.badge_color {
            if !is_badge_color(color) {
                return Err(AppError::validation("badge color must be #RRGGBB"));
            }
        }
        Ok(())
    }
}

impl RoleOverrideRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name_override {
            if name.chars().count() > ROLE_NAME_MAX {
                return Err(AppError::validation(format!("name override must be at most {ROLE_NAME_MAX} characters")));
            }
        }
        if let Some(color) = &self.badge_color_override {
            if !is_badge_color(color) {
                return Err(AppError::validation("badge color override must be #RRGGBB"));
            }
        }
        Ok(())
    }
}
