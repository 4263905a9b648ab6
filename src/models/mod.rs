pub mod identity;
pub mod menu;
pub mod role;

pub use identity::Identity;
pub use menu::{ComposedMenuRecord, DepartmentMenuOverlay, MatchMode, MenuNode, MoveDirection};
pub use role::{
    AssignableRoleOption, CustomRole, CustomRoleRequest, DbDepartmentRole, DepartmentRoleOverlay, EffectiveRole, RoleOrigin,
    RoleOverride, RoleOverrideRequest, RoleRef, RoleTemplate,
};
