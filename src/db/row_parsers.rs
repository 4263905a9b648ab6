use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{DbDepartmentRole, DepartmentMenuOverlay, Identity, MatchMode, MenuNode, RoleRef, RoleTemplate};

fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(s.trim()).map_err(|e| AppError::internal(format!("invalid uuid: {}", e)))
}

fn parse_opt_uuid(s: Option<String>) -> Result<Option<Uuid>, AppError> {
    match s {
        Some(s) if !s.trim().is_empty() => Ok(Some(parse_uuid(&s)?)),
        _ => Ok(None),
    }
}

fn parse_priority(value: i64, column: &str) -> Result<u32, AppError> {
    u32::try_from(value).map_err(|_| AppError::internal(format!("invalid {}: {}", column, value)))
}

pub fn menu_node_from_row(row: &SqliteRow) -> Result<MenuNode, AppError> {
    let id_s: String = row.try_get("id").map_err(|e| AppError::internal(format!("missing id: {}", e)))?;
    let parent_id_s: Option<String> = row.try_get("parent_id").map_err(|e| AppError::internal(format!("missing parent_id: {}", e)))?;
    let title: String = row.try_get("title").map_err(|e| AppError::internal(format!("missing title: {}", e)))?;
    let href: Option<String> = row.try_get("href").map_err(|e| AppError::internal(format!("missing href: {}", e)))?;
    let match_mode_s: String = row.try_get("match_mode").map_err(|e| AppError::internal(format!("missing match_mode: {}", e)))?;
    let pattern: Option<String> = row.try_get("pattern").map_err(|e| AppError::internal(format!("missing pattern: {}", e)))?;
    let min_priority: Option<i64> = row.try_get("min_priority").map_err(|e| AppError::internal(format!("missing min_priority: {}", e)))?;
    let is_section: bool = row.try_get("is_section").map_err(|e| AppError::internal(format!("missing is_section: {}", e)))?;
    let is_active: bool = row.try_get("is_active").map_err(|e| AppError::internal(format!("missing is_active: {}", e)))?;
    let hidden: bool = row.try_get("hidden").map_err(|e| AppError::internal(format!("missing hidden: {}", e)))?;
    let lock_hidden_override: bool = row
        .try_get("lock_hidden_override")
        .map_err(|e| AppError::internal(format!("missing lock_hidden_override: {}", e)))?;
    let order: i64 = row.try_get("sort_order").map_err(|e| AppError::internal(format!("missing sort_order: {}", e)))?;

    Ok(MenuNode {
        id: parse_uuid(&id_s)?,
        parent_id: parse_opt_uuid(parent_id_s)?,
        title,
        href,
        match_mode: match_mode_s.parse::<MatchMode>()?,
        pattern,
        min_priority: min_priority.map(|p| parse_priority(p, "min_priority")).transpose()?,
        is_section,
        is_active,
        hidden,
        lock_hidden_override,
        order,
    })
}

pub fn menu_overlay_from_row(row: &SqliteRow) -> Result<DepartmentMenuOverlay, AppError> {
    let department_id_s: String = row.try_get("department_id").map_err(|e| AppError::internal(format!("missing department_id: {}", e)))?;
    let menu_id_s: String = row.try_get("menu_id").map_err(|e| AppError::internal(format!("missing menu_id: {}", e)))?;
    let is_enabled: Option<bool> = row.try_get("is_enabled").map_err(|e| AppError::internal(format!("missing is_enabled: {}", e)))?;
    let hidden_override: Option<bool> = row.try_get("hidden_override").map_err(|e| AppError::internal(format!("missing hidden_override: {}", e)))?;
    let sort_order: Option<i64> = row.try_get("sort_order").map_err(|e| AppError::internal(format!("missing sort_order: {}", e)))?;

    Ok(DepartmentMenuOverlay {
        department_id: parse_uuid(&department_id_s)?,
        menu_id: parse_uuid(&menu_id_s)?,
        is_enabled,
        hidden_override,
        sort_order,
    })
}

pub fn role_template_from_row(row: &SqliteRow) -> Result<RoleTemplate, AppError> {
    let id_s: String = row.try_get("id").map_err(|e| AppError::internal(format!("missing id: {}", e)))?;
    let code: String = row.try_get("code").map_err(|e| AppError::internal(format!("missing code: {}", e)))?;
    let name: String = row.try_get("name").map_err(|e| AppError::internal(format!("missing name: {}", e)))?;
    let priority: i64 = row.try_get("priority").map_err(|e| AppError::internal(format!("missing priority: {}", e)))?;
    let badge_color: Option<String> = row.try_get("badge_color").map_err(|e| AppError::internal(format!("missing badge_color: {}", e)))?;
    let can_edit_data: bool = row.try_get("can_edit_data").map_err(|e| AppError::internal(format!("missing can_edit_data: {}", e)))?;
    let can_download_data: bool = row
        .try_get("can_download_data")
        .map_err(|e| AppError::internal(format!("missing can_download_data: {}", e)))?;
    let is_active: bool = row.try_get("is_active").map_err(|e| AppError::internal(format!("missing is_active: {}", e)))?;

    Ok(RoleTemplate {
        id: parse_uuid(&id_s)?,
        code,
        name,
        priority: parse_priority(priority, "priority")?,
        badge_color,
        can_edit_data,
        can_download_data,
        is_active,
    })
}

pub fn db_department_role_from_row(row: &SqliteRow) -> Result<DbDepartmentRole, AppError> {
    let id_s: String = row.try_get("id").map_err(|e| AppError::internal(format!("missing id: {}", e)))?;
    let department_id_s: String = row.try_get("department_id").map_err(|e| AppError::internal(format!("missing department_id: {}", e)))?;
    let role_id_s: Option<String> = row.try_get("role_id").map_err(|e| AppError::internal(format!("missing role_id: {}", e)))?;
    let name_override: Option<String> = row.try_get("name_override").map_err(|e| AppError::internal(format!("missing name_override: {}", e)))?;
    let badge_color_override: Option<String> = row
        .try_get("badge_color_override")
        .map_err(|e| AppError::internal(format!("missing badge_color_override: {}", e)))?;
    let code: Option<String> = row.try_get("code").map_err(|e| AppError::internal(format!("missing code: {}", e)))?;
    let name: Option<String> = row.try_get("name").map_err(|e| AppError::internal(format!("missing name: {}", e)))?;
    let priority: Option<i64> = row.try_get("priority").map_err(|e| AppError::internal(format!("missing priority: {}", e)))?;
    let badge_color: Option<String> = row.try_get("badge_color").map_err(|e| AppError::internal(format!("missing badge_color: {}", e)))?;
    let can_edit_data: Option<bool> = row.try_get("can_edit_data").map_err(|e| AppError::internal(format!("missing can_edit_data: {}", e)))?;
    let can_download_data: Option<bool> = row
        .try_get("can_download_data")
        .map_err(|e| AppError::internal(format!("missing can_download_data: {}", e)))?;
    let is_enabled: bool = row.try_get("is_enabled").map_err(|e| AppError::internal(format!("missing is_enabled: {}", e)))?;

    Ok(DbDepartmentRole {
        id: parse_uuid(&id_s)?,
        department_id: parse_uuid(&department_id_s)?,
        role_id: parse_opt_uuid(role_id_s)?,
        name_override,
        badge_color_override,
        code,
        name,
        priority,
        badge_color,
        can_edit_data,
        can_download_data,
        is_enabled,
    })
}

pub fn identity_from_row(row: &SqliteRow) -> Result<Identity, AppError> {
    let id_s: String = row.try_get("id").map_err(|e| AppError::internal(format!("missing id: {}", e)))?;
    let department_id_s: String = row.try_get("department_id").map_err(|e| AppError::internal(format!("missing department_id: {}", e)))?;
    let role_id_s: Option<String> = row.try_get("role_id").map_err(|e| AppError::internal(format!("missing role_id: {}", e)))?;
    let department_role_id_s: Option<String> = row
        .try_get("department_role_id")
        .map_err(|e| AppError::internal(format!("missing department_role_id: {}", e)))?;

    let role_ref = RoleRef::from_columns(parse_opt_uuid(role_id_s)?, parse_opt_uuid(department_role_id_s)?)?;
    Ok(Identity::new(parse_uuid(&id_s)?, parse_uuid(&department_id_s)?, role_ref))
}
