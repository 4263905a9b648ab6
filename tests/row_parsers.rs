mod common;

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use dept_guard::db::row_parsers::{db_department_role_from_row, identity_from_row, menu_node_from_row, menu_overlay_from_row};
use dept_guard::models::{DepartmentRoleOverlay, MatchMode, RoleRef};

use common::{insert_department, insert_menu, setup_db, NewMenu};

#[tokio::test]
async fn parse_menu_and_overlay_rows() -> Result<()> {
    let db = setup_db().await?;
    let pool = &db.pool;
    let dept = insert_department(pool, "ops").await?;
    let parent = insert_menu(pool, NewMenu { title: "Ops", is_section: true, match_mode: "prefix", min_priority: Some(30), ..Default::default() }).await?;
    let child = insert_menu(
        pool,
        NewMenu {
            parent_id: Some(parent),
            title: "Reports",
            href: Some("/reports"),
            match_mode: "regex",
            order: 4,
            ..Default::default()
        },
    )
    .await?;

    let row = sqlx::query("SELECT * FROM menus WHERE id = ?").bind(child.to_string()).fetch_one(pool).await?;
    let node = menu_node_from_row(&row)?;
    assert_eq!(node.parent_id, Some(parent));
    assert_eq!(node.match_mode, MatchMode::Regex);
    assert_eq!(node.min_priority, None);
    assert_eq!(node.order, 4);
    assert!(node.is_active);

    let row = sqlx::query("SELECT * FROM menus WHERE id = ?").bind(parent.to_string()).fetch_one(pool).await?;
    let section = menu_node_from_row(&row)?;
    assert_eq!(section.min_priority, Some(30));
    assert!(section.is_section);

    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO department_menus (department_id, menu_id, hidden_override, created_at, updated_at) VALUES (?, ?, 1, ?, ?)",
    )
    .bind(dept.to_string())
    .bind(child.to_string())
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    let row = sqlx::query("SELECT * FROM department_menus").fetch_one(pool).await?;
    let overlay = menu_overlay_from_row(&row)?;
    assert_eq!(overlay.hidden_override, Some(true));
    assert_eq!(overlay.is_enabled, None);
    assert_eq!(overlay.sort_order, None);
    Ok(())
}

#[tokio::test]
async fn parse_department_role_and_identity_rows() -> Result<()> {
    let db = setup_db().await?;
    let pool = &db.pool;
    let dept = insert_department(pool, "ops").await?;
    let now = Utc::now().to_rfc3339();

    let custom_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO department_roles (id, department_id, code, name, priority, can_edit_data, can_download_data, \
         is_enabled, created_at, updated_at) VALUES (?, ?, 'AUDITOR', 'Auditor', 40, 1, 0, 0, ?, ?)",
    )
    .bind(custom_id.to_string())
    .bind(dept.to_string())
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    let row = sqlx::query("SELECT * FROM department_roles WHERE id = ?").bind(custom_id.to_string()).fetch_one(pool).await?;
    match DepartmentRoleOverlay::try_from(db_department_role_from_row(&row)?)? {
        DepartmentRoleOverlay::Custom(custom) => {
            assert_eq!(custom.priority, 40);
            assert!(custom.can_edit_data);
            assert!(!custom.is_enabled);
        }
        other => panic!("expected custom role, got {other:?}"),
    }

    let user_id = common::insert_user(pool, dept, None, Some(custom_id)).await?;
    let row = sqlx::query("SELECT * FROM users WHERE id = ?").bind(user_id.to_string()).fetch_one(pool).await?;
    let identity = identity_from_row(&row)?;
    assert_eq!(identity.department_id, dept);
    assert_eq!(identity.role_ref, RoleRef::DepartmentRole(custom_id));
    Ok(())
}

#[tokio::test]
async fn malformed_uuid_is_an_internal_error() -> Result<()> {
    let db = setup_db().await?;
    let row = sqlx::query("SELECT 'not-a-uuid' AS department_id, 'x' AS menu_id, NULL AS is_enabled, NULL AS hidden_override, NULL AS sort_order")
        .fetch_one(&db.pool)
        .await?;
    let err = menu_overlay_from_row(&row).unwrap_err();
    assert_eq!(err.kind(), "internal");
    Ok(())
}
