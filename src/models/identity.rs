use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::RoleRef;

/// Who is asking: the user, their department and what their role points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub department_id: Uuid,
    pub role_ref: RoleRef,
}

impl Identity {
    pub fn new(user_id: Uuid, department_id: Uuid, role_ref: RoleRef) -> Self {
        Self {
            user_id,
            department_id,
            role_ref,
        }
    }
}
