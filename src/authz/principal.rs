use serde::Serialize;
use uuid::Uuid;

use crate::models::{EffectiveRole, Identity};

/// Principal represents the authenticated user with their resolved effective role
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub department_id: Uuid,
    pub role: EffectiveRole,
}

impl Principal {
    pub fn new(identity: &Identity, role: EffectiveRole) -> Self {
        Self {
            user_id: identity.user_id,
            department_id: identity.department_id,
            role,
        }
    }

    pub fn priority(&self) -> u32 {
        self.role.priority
    }

    pub fn can_edit_data(&self) -> bool {
        self.role.can_edit_data
    }

    pub fn can_download_data(&self) -> bool {
        self.role.can_download_data
    }
}
