mod common;

use std::sync::Arc;

use anyhow::Result;

use dept_guard::authz::roles;
use dept_guard::events::{init_event_bus, start_activity_listener};
use dept_guard::models::{CustomRoleRequest, MoveDirection};
use dept_guard::{MenuAdmin, RoleAdmin};

use common::{menu_id, seeded};

#[tokio::test]
async fn overlay_writes_are_recorded() -> Result<()> {
    let s = seeded().await?;
    let (bus, rx) = init_event_bus();
    let listener = tokio::spawn(start_activity_listener(rx, s.pool().clone()));

    let actor = s.user(roles::ADMIN);
    let menus = MenuAdmin::new(Arc::clone(&s.service), bus.clone());
    let role_admin = RoleAdmin::new(Arc::clone(&s.service), bus);

    let changelog = menu_id(s.pool(), "Changelog").await?;
    menus.set_hidden(actor, changelog, true).await?;
    menus.move_order(actor, changelog, MoveDirection::Up).await?;

    let custom = role_admin
        .create_custom(
            actor,
            CustomRoleRequest {
                code: "AUDITOR".to_string(),
                name: "Auditor".to_string(),
                priority: 20,
                badge_color: None,
                is_enabled: true,
                can_edit_data: false,
                can_download_data: false,
            },
        )
        .await?;
    role_admin.delete_overlay(actor, custom.id).await?;

    // closing the bus lets the listener drain and stop
    drop(menus);
    drop(role_admin);
    listener.await?;

    let rows: Vec<(String, Option<String>, Option<String>, String)> = sqlx::query_as(
        "SELECT event_name, actor_id, department_id, severity FROM activity_log ORDER BY occurred_at, event_name",
    )
    .fetch_all(s.pool())
    .await?;

    let names: Vec<&str> = rows.iter().map(|r| r.0.as_str()).collect();
    assert!(names.contains(&"department_menu.hidden"));
    assert_eq!(names.iter().filter(|n| **n == "department_menu.reordered").count(), 2);
    assert!(names.contains(&"department_role.created"));

    for (_, actor_id, department_id, _) in &rows {
        assert_eq!(actor_id.as_deref(), Some(actor.to_string().as_str()));
        assert_eq!(department_id.as_deref(), Some(s.department().to_string().as_str()));
    }

    let deleted = rows
        .iter()
        .find(|r| r.0 == "department_role.deleted")
        .expect("delete is logged");
    assert_eq!(deleted.3, "critical");
    Ok(())
}
