use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::events::Loggable;

// =============================================================================
// MATCH MODE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Exact,
    Prefix,
    Regex,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Exact => "exact",
            MatchMode::Prefix => "prefix",
            MatchMode::Regex => "regex",
        }
    }
}

impl FromStr for MatchMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(MatchMode::Exact),
            "prefix" => Ok(MatchMode::Prefix),
            "regex" => Ok(MatchMode::Regex),
            other => Err(AppError::internal(format!("unknown match mode: {other}"))),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// MENU TEMPLATE
// =============================================================================

/// Global route/navigation entry. Templates form a forest through `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuNode {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub title: String,
    pub href: Option<String>,
    pub match_mode: MatchMode,
    pub pattern: Option<String>,
    pub min_priority: Option<u32>,
    pub is_section: bool,
    pub is_active: bool,
    pub hidden: bool,
    pub lock_hidden_override: bool,
    pub order: i64,
}

// =============================================================================
// DEPARTMENT MENU OVERLAY
// =============================================================================

/// Department-local layer. `None` in any field inherits the template value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentMenuOverlay {
    pub department_id: Uuid,
    pub menu_id: Uuid,
    pub is_enabled: Option<bool>,
    pub hidden_override: Option<bool>,
    pub sort_order: Option<i64>,
}

impl Loggable for DepartmentMenuOverlay {
    fn entity_type() -> &'static str { "department_menu" }
    fn subject_id(&self) -> Uuid { self.menu_id }
    fn department_id(&self) -> Uuid { self.department_id }
}

// =============================================================================
// COMPOSED RECORD (computed)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedMenuRecord {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub title: String,
    pub href: Option<String>,
    pub match_mode: MatchMode,
    pub pattern: Option<String>,
    pub min_priority: Option<u32>,
    pub is_section: bool,
    pub hidden: bool,
    pub lock_hidden_override: bool,
    /// Template order, kept as the first tiebreak between equal overlay orders.
    pub order: i64,
    pub effective_is_active: bool,
    pub effective_hidden: bool,
    pub effective_order: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

impl FromStr for MoveDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(MoveDirection::Up),
            "down" => Ok(MoveDirection::Down),
            other => Err(AppError::validation(format!("direction must be up or down, got {other}"))),
        }
    }
}
