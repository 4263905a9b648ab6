use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::row_parsers::{
    db_department_role_from_row, identity_from_row, menu_node_from_row, menu_overlay_from_row, role_template_from_row,
};
use crate::authz::{IdentitySource, MenuSource, RoleSource};
use crate::errors::{AppError, AppResult};
use crate::models::{
    CustomRole, CustomRoleRequest, DepartmentMenuOverlay, DepartmentRoleOverlay, Identity, MenuNode, RoleOverride,
    RoleOverrideRequest, RoleTemplate,
};

const MENU_COLUMNS: &str = "id, parent_id, title, href, match_mode, pattern, min_priority, is_section, is_active, \
                            hidden, lock_hidden_override, sort_order";
const ROLE_COLUMNS: &str = "id, code, name, priority, badge_color, can_edit_data, can_download_data, is_active";
const DEPARTMENT_ROLE_COLUMNS: &str = "id, department_id, role_id, name_override, badge_color_override, code, name, \
                                       priority, badge_color, can_edit_data, can_download_data, is_enabled";
const OVERLAY_COLUMNS: &str = "department_id, menu_id, is_enabled, hidden_override, sort_order";

/// Order of one sibling as read before a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiblingOrder {
    pub menu_id: Uuid,
    pub template_order: i64,
    /// Overlay value at read time; `None` inherits the template.
    pub stored: Option<i64>,
}

impl SiblingOrder {
    pub fn effective(&self) -> i64 {
        self.stored.unwrap_or(self.template_order)
    }
}

/// SQLite-backed role and menu catalog.
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // -------------------------------------------------------------------------
    // menus
    // -------------------------------------------------------------------------

    pub async fn menu_template(&self, menu_id: Uuid) -> AppResult<Option<MenuNode>> {
        let sql = format!("SELECT {MENU_COLUMNS} FROM menus WHERE id = ?");
        let row = sqlx::query(&sql).bind(menu_id.to_string()).fetch_optional(&self.pool).await?;
        row.as_ref().map(menu_node_from_row).transpose()
    }

    pub async fn menu_overlay(&self, department_id: Uuid, menu_id: Uuid) -> AppResult<Option<DepartmentMenuOverlay>> {
        let sql = format!("SELECT {OVERLAY_COLUMNS} FROM department_menus WHERE department_id = ? AND menu_id = ?");
        let row = sqlx::query(&sql)
            .bind(department_id.to_string())
            .bind(menu_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(menu_overlay_from_row).transpose()
    }

    async fn stored_overlay(&self, department_id: Uuid, menu_id: Uuid) -> AppResult<DepartmentMenuOverlay> {
        self.menu_overlay(department_id, menu_id)
            .await?
            .ok_or_else(|| AppError::internal(format!("overlay for menu {menu_id} vanished after write")))
    }

    /// Writes the hidden column of a department overlay. `None` inherits.
    pub async fn set_hidden_override(
        &self,
        department_id: Uuid,
        menu_id: Uuid,
        hidden: Option<bool>,
    ) -> AppResult<DepartmentMenuOverlay> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO department_menus (department_id, menu_id, hidden_override, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (department_id, menu_id)
            DO UPDATE SET hidden_override = excluded.hidden_override, updated_at = excluded.updated_at
            "#,
        )
        .bind(department_id.to_string())
        .bind(menu_id.to_string())
        .bind(hidden)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, Some(menu_id)))?;

        self.stored_overlay(department_id, menu_id).await
    }

    /// Writes the enabled column of a department overlay. `None` inherits.
    pub async fn set_enabled_override(
        &self,
        department_id: Uuid,
        menu_id: Uuid,
        enabled: Option<bool>,
    ) -> AppResult<DepartmentMenuOverlay> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO department_menus (department_id, menu_id, is_enabled, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (department_id, menu_id)
            DO UPDATE SET is_enabled = excluded.is_enabled, updated_at = excluded.updated_at
            "#,
        )
        .bind(department_id.to_string())
        .bind(menu_id.to_string())
        .bind(enabled)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, Some(menu_id)))?;

        self.stored_overlay(department_id, menu_id).await
    }

    /// Active templates under `parent_id` with the department's stored order.
    pub async fn sibling_orders(&self, department_id: Uuid, parent_id: Option<Uuid>) -> AppResult<Vec<SiblingOrder>> {
        let rows: Vec<(String, i64, Option<i64>)> = sqlx::query_as(
            r#"
            SELECT m.id, m.sort_order, dm.sort_order
            FROM menus m
            LEFT JOIN department_menus dm ON dm.menu_id = m.id AND dm.department_id = ?
            WHERE m.parent_id IS ? AND m.is_active = 1
            "#,
        )
        .bind(department_id.to_string())
        .bind(parent_id.map(|id| id.to_string()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, template_order, stored)| {
                let menu_id = Uuid::parse_str(&id).map_err(|e| AppError::internal(format!("invalid uuid: {}", e)))?;
                Ok(SiblingOrder {
                    menu_id,
                    template_order,
                    stored,
                })
            })
            .collect()
    }

    /// Exchanges the effective orders of two siblings in one transaction.
    pub async fn swap_orders(&self, department_id: Uuid, a: &SiblingOrder, b: &SiblingOrder) -> AppResult<()> {
        self.write_orders(department_id, &[(*a, b.effective()), (*b, a.effective())]).await
    }

    /// Writes new orders for a set of siblings in one transaction.
    ///
    /// Each row is written only if it still holds the value that was read;
    /// otherwise nothing is written and the result is `Conflict`.
    pub async fn write_orders(&self, department_id: Uuid, writes: &[(SiblingOrder, i64)]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now().to_rfc3339();

        for (row, new_order) in writes {
            let result = sqlx::query(
                r#"
                INSERT INTO department_menus (department_id, menu_id, sort_order, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT (department_id, menu_id)
                DO UPDATE SET sort_order = excluded.sort_order, updated_at = excluded.updated_at
                WHERE department_menus.sort_order IS ?
                "#,
            )
            .bind(department_id.to_string())
            .bind(row.menu_id.to_string())
            .bind(*new_order)
            .bind(&now)
            .bind(&now)
            .bind(row.stored)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::from_write(e, Some(row.menu_id)))?;

            if result.rows_affected() != 1 {
                tx.rollback().await?;
                return Err(AppError::conflict(format!("order of menu {} changed concurrently", row.menu_id)));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // department roles
    // -------------------------------------------------------------------------

    pub async fn insert_custom_role(&self, department_id: Uuid, req: &CustomRoleRequest) -> AppResult<CustomRole> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO department_roles
                (id, department_id, code, name, priority, badge_color, can_edit_data, can_download_data, is_enabled,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(department_id.to_string())
        .bind(&req.code)
        .bind(&req.name)
        .bind(i64::from(req.priority))
        .bind(&req.badge_color)
        .bind(req.can_edit_data)
        .bind(req.can_download_data)
        .bind(req.is_enabled)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, None))?;

        Ok(CustomRole {
            id,
            department_id,
            code: req.code.clone(),
            name: req.name.clone(),
            priority: req.priority,
            badge_color: req.badge_color.clone(),
            can_edit_data: req.can_edit_data,
            can_download_data: req.can_download_data,
            is_enabled: req.is_enabled,
        })
    }

    /// `None` when `id` is not a custom role of `department_id`.
    pub async fn update_custom_role(
        &self,
        department_id: Uuid,
        id: Uuid,
        req: &CustomRoleRequest,
    ) -> AppResult<Option<CustomRole>> {
        let result = sqlx::query(
            r#"
            UPDATE department_roles
            SET code = ?, name = ?, priority = ?, badge_color = ?, can_edit_data = ?, can_download_data = ?,
                is_enabled = ?, updated_at = ?
            WHERE id = ? AND department_id = ? AND role_id IS NULL
            "#,
        )
        .bind(&req.code)
        .bind(&req.name)
        .bind(i64::from(req.priority))
        .bind(&req.badge_color)
        .bind(req.can_edit_data)
        .bind(req.can_download_data)
        .bind(req.is_enabled)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .bind(department_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, None))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(CustomRole {
            id,
            department_id,
            code: req.code.clone(),
            name: req.name.clone(),
            priority: req.priority,
            badge_color: req.badge_color.clone(),
            can_edit_data: req.can_edit_data,
            can_download_data: req.can_download_data,
            is_enabled: req.is_enabled,
        }))
    }

    /// Creates or replaces the department's single override of `req.role_id`.
    pub async fn save_override(&self, department_id: Uuid, req: &RoleOverrideRequest) -> AppResult<RoleOverride> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now().to_rfc3339();

        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM department_roles WHERE department_id = ? AND role_id = ?")
                .bind(department_id.to_string())
                .bind(req.role_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;

        let id = match existing {
            Some(id_s) => {
                sqlx::query(
                    r#"
                    UPDATE department_roles
                    SET name_override = ?, badge_color_override = ?, is_enabled = ?, updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&req.name_override)
                .bind(&req.badge_color_override)
                .bind(req.is_enabled)
                .bind(&now)
                .bind(&id_s)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::from_write(e, None))?;
                Uuid::parse_str(&id_s).map_err(|e| AppError::internal(format!("invalid uuid: {}", e)))?
            }
            None => {
                let id = Uuid::new_v4();
                sqlx::query(
                    r#"
                    INSERT INTO department_roles
                        (id, department_id, role_id, name_override, badge_color_override, is_enabled, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(id.to_string())
                .bind(department_id.to_string())
                .bind(req.role_id.to_string())
                .bind(&req.name_override)
                .bind(&req.badge_color_override)
                .bind(req.is_enabled)
                .bind(&now)
                .bind(&now)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::from_write(e, None))?;
                id
            }
        };

        tx.commit().await?;

        Ok(RoleOverride {
            id,
            department_id,
            role_id: req.role_id,
            name_override: req.name_override.clone(),
            badge_color_override: req.badge_color_override.clone(),
            is_enabled: req.is_enabled,
        })
    }

    /// `false` when `id` is not an overlay of `department_id`.
    pub async fn delete_department_role(&self, department_id: Uuid, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM department_roles WHERE id = ? AND department_id = ?")
            .bind(id.to_string())
            .bind(department_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_write(e, None))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl IdentitySource for SqliteCatalog {
    async fn identity(&self, user_id: Uuid) -> AppResult<Option<Identity>> {
        let row = sqlx::query("SELECT id, department_id, role_id, department_role_id FROM users WHERE id = ? AND is_active = 1")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(identity_from_row).transpose()
    }
}

#[async_trait]
impl RoleSource for SqliteCatalog {
    async fn role_template(&self, role_id: Uuid) -> AppResult<Option<RoleTemplate>> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = ?");
        let row = sqlx::query(&sql).bind(role_id.to_string()).fetch_optional(&self.pool).await?;
        row.as_ref().map(role_template_from_row).transpose()
    }

    async fn department_role(&self, department_role_id: Uuid) -> AppResult<Option<DepartmentRoleOverlay>> {
        let sql = format!("SELECT {DEPARTMENT_ROLE_COLUMNS} FROM department_roles WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(department_role_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(DepartmentRoleOverlay::try_from(db_department_role_from_row(&row)?)?)),
            None => Ok(None),
        }
    }

    async fn override_for_role(&self, department_id: Uuid, role_id: Uuid) -> AppResult<Option<RoleOverride>> {
        let sql = format!("SELECT {DEPARTMENT_ROLE_COLUMNS} FROM department_roles WHERE department_id = ? AND role_id = ?");
        let row = sqlx::query(&sql)
            .bind(department_id.to_string())
            .bind(role_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        match DepartmentRoleOverlay::try_from(db_department_role_from_row(&row)?)? {
            DepartmentRoleOverlay::Override(ov) => Ok(Some(ov)),
            DepartmentRoleOverlay::Custom(custom) => Err(AppError::internal(format!(
                "department role {} has a role_id but parsed as custom",
                custom.id
            ))),
        }
    }

    async fn active_role_templates(&self) -> AppResult<Vec<RoleTemplate>> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE is_active = 1 ORDER BY priority, code");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(role_template_from_row).collect()
    }

    async fn department_roles(&self, department_id: Uuid) -> AppResult<Vec<DepartmentRoleOverlay>> {
        let sql = format!("SELECT {DEPARTMENT_ROLE_COLUMNS} FROM department_roles WHERE department_id = ? ORDER BY created_at, id");
        let rows = sqlx::query(&sql)
            .bind(department_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| DepartmentRoleOverlay::try_from(db_department_role_from_row(row)?))
            .collect()
    }
}

#[async_trait]
impl MenuSource for SqliteCatalog {
    async fn active_menu_templates(&self) -> AppResult<Vec<MenuNode>> {
        let sql = format!("SELECT {MENU_COLUMNS} FROM menus WHERE is_active = 1");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(menu_node_from_row).collect()
    }

    async fn department_menu_overlays(&self, department_id: Uuid) -> AppResult<Vec<DepartmentMenuOverlay>> {
        let sql = format!("SELECT {OVERLAY_COLUMNS} FROM department_menus WHERE department_id = ?");
        let rows = sqlx::query(&sql)
            .bind(department_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(menu_overlay_from_row).collect()
    }
}
