//! Demo data: one department, the three base roles, the sidebar catalog and a
//! user per role. Safe to run repeatedly.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::authz::roles;
use crate::errors::{AppError, AppResult};
use crate::models::MatchMode;

pub const DEMO_DEPARTMENT_CODE: &str = "demo";

struct SeedRole {
    code: &'static str,
    name: &'static str,
    priority: u32,
    can_edit_data: bool,
    can_download_data: bool,
}

const SEED_ROLES: &[SeedRole] = &[
    SeedRole { code: roles::ADMIN, name: "Administrator", priority: 100, can_edit_data: true, can_download_data: true },
    SeedRole { code: roles::EDITOR, name: "Editor", priority: 50, can_edit_data: true, can_download_data: false },
    SeedRole { code: roles::VIEWER, name: "Viewer", priority: 10, can_edit_data: false, can_download_data: false },
];

struct SeedMenu {
    key: &'static str,
    parent: Option<&'static str>,
    order: i64,
    title: &'static str,
    href: Option<&'static str>,
    match_mode: MatchMode,
    min_priority: Option<u32>,
    is_section: bool,
    hidden: bool,
}

const fn section(key: &'static str, order: i64, title: &'static str, min_priority: Option<u32>, hidden: bool) -> SeedMenu {
    SeedMenu { key, parent: None, order, title, href: None, match_mode: MatchMode::Prefix, min_priority, is_section: true, hidden }
}

const fn page(
    key: &'static str,
    parent: &'static str,
    order: i64,
    title: &'static str,
    href: &'static str,
    match_mode: MatchMode,
    hidden: bool,
) -> SeedMenu {
    SeedMenu {
        key,
        parent: Some(parent),
        order,
        title,
        href: Some(href),
        match_mode,
        min_priority: None,
        is_section: false,
        hidden,
    }
}

// parents before children
const SEED_MENUS: &[SeedMenu] = &[
    section("root-dashboard", 0, "Dashboard", None, false),
    section("root-docs", 1, "Documentation", None, false),
    section("root-settings", 2, "Settings", Some(100), false),
    section("root-personal", 3, "Personal settings", None, true),
    page("dashboard-overview", "root-dashboard", 0, "Overview", "/dashboard", MatchMode::Exact, false),
    page("docs-tutorial", "root-docs", 0, "Tutorial", "/tutorial", MatchMode::Exact, false),
    page("docs-changelog", "root-docs", 1, "Changelog", "/changelog", MatchMode::Exact, false),
    page("settings-masters", "root-settings", 0, "Master data", "/masters", MatchMode::Prefix, false),
    page("settings-users", "root-settings", 1, "Users", "/users", MatchMode::Prefix, false),
    page("masters-list", "settings-masters", 0, "Master list", "/masters", MatchMode::Exact, false),
    page("masters-roles", "settings-masters", 1, "Roles", "/masters/roles", MatchMode::Prefix, false),
    page("masters-menus", "settings-masters", 2, "Menus", "/masters/menus", MatchMode::Prefix, false),
    page("users-list", "settings-users", 0, "User list", "/users", MatchMode::Exact, false),
    page("users-new", "settings-users", 1, "New user", "/users/new", MatchMode::Exact, true),
    page("users-password", "settings-users", 2, "Password reset", "/users/password-request", MatchMode::Exact, false),
    page("users-email-change", "settings-users", 3, "Email change approvals", "/users/email-change-requests", MatchMode::Exact, false),
    page("personal-profile", "root-personal", 0, "Edit profile", "/profile", MatchMode::Exact, true),
    page("personal-email", "personal-profile", 0, "Change email", "/profile/email", MatchMode::Exact, true),
    page("personal-password", "personal-profile", 1, "Change password", "/profile/password", MatchMode::Exact, true),
    page("personal-verify", "personal-profile", 2, "Confirm email change", "/profile/email/verify", MatchMode::Exact, true),
];

#[derive(Debug, Clone, Serialize)]
pub struct SeedSummary {
    pub department_id: Uuid,
    /// Demo user id per role code.
    pub users: HashMap<String, Uuid>,
    pub menus_created: usize,
}

pub async fn seed_demo(pool: &SqlitePool) -> AppResult<SeedSummary> {
    let mut tx = pool.begin().await?;
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO departments (id, code, name, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (code) DO UPDATE SET updated_at = excluded.updated_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(DEMO_DEPARTMENT_CODE)
    .bind("Demo department")
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    let department_s: String = sqlx::query_scalar("SELECT id FROM departments WHERE code = ?")
        .bind(DEMO_DEPARTMENT_CODE)
        .fetch_one(&mut *tx)
        .await?;
    let department_id = parse(&department_s)?;

    let mut users = HashMap::new();
    for role in SEED_ROLES {
        sqlx::query(
            r#"
            INSERT INTO roles (id, code, name, priority, can_edit_data, can_download_data, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)
            ON CONFLICT (code) DO UPDATE SET
                name = excluded.name,
                priority = excluded.priority,
                can_edit_data = excluded.can_edit_data,
                can_download_data = excluded.can_download_data,
                is_active = 1,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(role.code)
        .bind(role.name)
        .bind(i64::from(role.priority))
        .bind(role.can_edit_data)
        .bind(role.can_download_data)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let role_s: String = sqlx::query_scalar("SELECT id FROM roles WHERE code = ?")
            .bind(role.code)
            .fetch_one(&mut *tx)
            .await?;

        let user_name = format!("demo-{}", role.code.to_lowercase());
        let existing: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE department_id = ? AND name = ?")
            .bind(&department_s)
            .bind(&user_name)
            .fetch_optional(&mut *tx)
            .await?;

        let user_id = match existing {
            Some(id) => parse(&id)?,
            None => {
                let id = Uuid::new_v4();
                sqlx::query(
                    r#"
                    INSERT INTO users (id, department_id, role_id, name, is_active, created_at, updated_at)
                    VALUES (?, ?, ?, ?, 1, ?, ?)
                    "#,
                )
                .bind(id.to_string())
                .bind(&department_s)
                .bind(&role_s)
                .bind(&user_name)
                .bind(&now)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
                id
            }
        };
        users.insert(role.code.to_string(), user_id);
    }

    let menu_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menus").fetch_one(&mut *tx).await?;
    let mut menus_created = 0;
    if menu_count == 0 {
        let mut ids: HashMap<&str, Uuid> = HashMap::new();
        for menu in SEED_MENUS {
            let id = Uuid::new_v4();
            let parent_id = match menu.parent {
                Some(key) => Some(
                    *ids.get(key)
                        .ok_or_else(|| AppError::internal(format!("seed menu {} listed before its parent", menu.key)))?,
                ),
                None => None,
            };

            sqlx::query(
                r#"
                INSERT INTO menus (id, parent_id, title, href, match_mode, pattern, min_priority, is_section,
                                   is_active, hidden, lock_hidden_override, sort_order, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, NULL, ?, ?, 1, ?, 0, ?, ?, ?)
                "#,
            )
            .bind(id.to_string())
            .bind(parent_id.map(|p| p.to_string()))
            .bind(menu.title)
            .bind(menu.href)
            .bind(menu.match_mode.as_str())
            .bind(menu.min_priority.map(i64::from))
            .bind(menu.is_section)
            .bind(menu.hidden)
            .bind(menu.order)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;

            ids.insert(menu.key, id);
            menus_created += 1;
        }
    }

    tx.commit().await?;
    tracing::info!(%department_id, menus_created, "demo data seeded");

    Ok(SeedSummary {
        department_id,
        users,
        menus_created,
    })
}

fn parse(s: &str) -> AppResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| AppError::internal(format!("invalid uuid: {}", e)))
}
