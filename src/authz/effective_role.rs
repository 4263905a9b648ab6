use std::collections::HashSet;

use uuid::Uuid;

use super::sources::RoleSource;
use crate::errors::AppResult;
use crate::models::{
    AssignableRoleOption, CustomRole, DepartmentRoleOverlay, EffectiveRole, RoleOrigin, RoleOverride, RoleRef,
    RoleTemplate,
};

/// Template values with the override's cosmetics on top.
///
/// Priority and both capability flags always come from the template.
pub fn effective_from_template(template: &RoleTemplate, overlay: Option<&RoleOverride>, origin: RoleOrigin) -> EffectiveRole {
    EffectiveRole {
        code: template.code.clone(),
        name: overlay
            .and_then(|o| o.name_override.clone())
            .unwrap_or_else(|| template.name.clone()),
        priority: template.priority,
        badge_color: overlay
            .and_then(|o| o.badge_color_override.clone())
            .or_else(|| template.badge_color.clone()),
        can_edit_data: template.can_edit_data,
        can_download_data: template.can_download_data,
        enabled_in_department: overlay.map(|o| o.is_enabled).unwrap_or(true),
        origin,
    }
}

pub fn effective_from_custom(custom: &CustomRole) -> EffectiveRole {
    EffectiveRole {
        code: custom.code.clone(),
        name: custom.name.clone(),
        priority: custom.priority,
        badge_color: custom.badge_color.clone(),
        can_edit_data: custom.can_edit_data,
        can_download_data: custom.can_download_data,
        enabled_in_department: custom.is_enabled,
        origin: RoleOrigin::Custom,
    }
}

/// Resolves the role a department sees for `role_ref`.
///
/// `Ok(None)` means a dangling reference (missing template, missing overlay,
/// or an overlay owned by another department). Callers must deny on `None`.
pub async fn resolve_effective_role<S>(
    source: &S,
    department_id: Uuid,
    role_ref: RoleRef,
) -> AppResult<Option<EffectiveRole>>
where
    S: RoleSource + ?Sized,
{
    match role_ref {
        RoleRef::DepartmentRole(overlay_id) => {
            let Some(overlay) = source.department_role(overlay_id).await? else {
                tracing::debug!(%department_id, %overlay_id, "department role not found");
                return Ok(None);
            };
            if overlay.department_id() != department_id {
                tracing::warn!(
                    %department_id,
                    %overlay_id,
                    owner = %overlay.department_id(),
                    "department role belongs to another department"
                );
                return Ok(None);
            }

            match overlay {
                DepartmentRoleOverlay::Custom(custom) => Ok(Some(effective_from_custom(&custom))),
                DepartmentRoleOverlay::Override(ov) => {
                    let Some(template) = source.role_template(ov.role_id).await? else {
                        tracing::warn!(%department_id, %overlay_id, role_id = %ov.role_id, "override references a missing role");
                        return Ok(None);
                    };
                    Ok(Some(effective_from_template(&template, Some(&ov), RoleOrigin::Override)))
                }
            }
        }
        RoleRef::Role(role_id) => {
            let Some(template) = source.role_template(role_id).await? else {
                tracing::debug!(%department_id, %role_id, "role not found");
                return Ok(None);
            };
            // cosmetics from the override, origin stays with the reference kind
            let overlay = source.override_for_role(department_id, role_id).await?;
            Ok(Some(effective_from_template(&template, overlay.as_ref(), RoleOrigin::Role)))
        }
    }
}

/// Every role an administrator of `department_id` can hand out.
///
/// Templates shadowed by one of the department's overrides are listed once,
/// through the override. Sorted by priority, then label.
pub async fn assignable_roles<S>(source: &S, department_id: Uuid) -> AppResult<Vec<AssignableRoleOption>>
where
    S: RoleSource + ?Sized,
{
    let templates = source.active_role_templates().await?;
    let overlays = source.department_roles(department_id).await?;

    let overridden: HashSet<Uuid> = overlays
        .iter()
        .filter_map(|o| match o {
            DepartmentRoleOverlay::Override(ov) => Some(ov.role_id),
            DepartmentRoleOverlay::Custom(_) => None,
        })
        .collect();

    let mut options: Vec<AssignableRoleOption> = templates
        .iter()
        .filter(|t| !overridden.contains(&t.id))
        .map(|t| AssignableRoleOption {
            role_ref: RoleRef::Role(t.id),
            label: format!("{} ({})", t.name, t.code),
            priority: t.priority,
            disabled: false,
        })
        .collect();

    for overlay in &overlays {
        let effective = match overlay {
            DepartmentRoleOverlay::Custom(custom) => effective_from_custom(custom),
            DepartmentRoleOverlay::Override(ov) => match source.role_template(ov.role_id).await? {
                Some(template) => effective_from_template(&template, Some(ov), RoleOrigin::Override),
                None => {
                    tracing::warn!(%department_id, overlay_id = %ov.id, "skipping override of a missing role");
                    continue;
                }
            },
        };
        options.push(AssignableRoleOption {
            role_ref: RoleRef::DepartmentRole(overlay.id()),
            label: format!("{} ({})", effective.name, effective.code),
            priority: effective.priority,
            disabled: !overlay.is_enabled(),
        });
    }

    options.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.label.cmp(&b.label)));
    Ok(options)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct MemoryRoles {
        templates: HashMap<Uuid, RoleTemplate>,
        overlays: Vec<DepartmentRoleOverlay>,
    }

    #[async_trait]
    impl RoleSource for MemoryRoles {
        async fn role_template(&self, role_id: Uuid) -> AppResult<Option<RoleTemplate>> {
            Ok(self.templates.get(&role_id).cloned())
        }

        async fn department_role(&self, id: Uuid) -> AppResult<Option<DepartmentRoleOverlay>> {
            Ok(self.overlays.iter().find(|o| o.id() == id).cloned())
        }

        async fn override_for_role(&self, department_id: Uuid, role_id: Uuid) -> AppResult<Option<RoleOverride>> {
            Ok(self.overlays.iter().find_map(|o| match o {
                DepartmentRoleOverlay::Override(ov) if ov.department_id == department_id && ov.role_id == role_id => {
                    Some(ov.clone())
                }
                _ => None,
            }))
        }

        async fn active_role_templates(&self) -> AppResult<Vec<RoleTemplate>> {
            Ok(self.templates.values().filter(|t| t.is_active).cloned().collect())
        }

        async fn department_roles(&self, department_id: Uuid) -> AppResult<Vec<DepartmentRoleOverlay>> {
            Ok(self
                .overlays
                .iter()
                .filter(|o| o.department_id() == department_id)
                .cloned()
                .collect())
        }
    }

    fn template(code: &str, name: &str, priority: u32) -> RoleTemplate {
        RoleTemplate {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: name.to_string(),
            priority,
            badge_color: Some("#111111".to_string()),
            can_edit_data: priority >= 50,
            can_download_data: priority >= 100,
            is_active: true,
        }
    }

    fn override_of(department_id: Uuid, role: &RoleTemplate, name: Option<&str>, enabled: bool) -> RoleOverride {
        RoleOverride {
            id: Uuid::new_v4(),
            department_id,
            role_id: role.id,
            name_override: name.map(str::to_string),
            badge_color_override: None,
            is_enabled: enabled,
        }
    }

    #[tokio::test]
    async fn override_renames_but_keeps_priority() {
        let dept = Uuid::new_v4();
        let admin = template("ADMIN", "Admin", 100);
        let ov = override_of(dept, &admin, Some("Chief"), true);
        let source = MemoryRoles {
            templates: HashMap::from([(admin.id, admin.clone())]),
            overlays: vec![DepartmentRoleOverlay::Override(ov.clone())],
        };

        let role = resolve_effective_role(&source, dept, RoleRef::DepartmentRole(ov.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(role.priority, 100);
        assert_eq!(role.name, "Chief");
        assert_eq!(role.code, "ADMIN");
        assert_eq!(role.badge_color.as_deref(), Some("#111111"));
        assert_eq!(role.origin, RoleOrigin::Override);
        assert!(role.can_download_data);
    }

    #[tokio::test]
    async fn plain_role_picks_up_department_override() {
        let dept = Uuid::new_v4();
        let editor = template("EDITOR", "Editor", 50);
        let ov = override_of(dept, &editor, Some("Writer"), false);
        let source = MemoryRoles {
            templates: HashMap::from([(editor.id, editor.clone())]),
            overlays: vec![DepartmentRoleOverlay::Override(ov)],
        };

        let role = resolve_effective_role(&source, dept, RoleRef::Role(editor.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(role.name, "Writer");
        assert!(!role.enabled_in_department);
        assert_eq!(role.origin, RoleOrigin::Role);

        let elsewhere = resolve_effective_role(&source, Uuid::new_v4(), RoleRef::Role(editor.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(elsewhere.name, "Editor");
        assert!(elsewhere.enabled_in_department);
        assert_eq!(elsewhere.origin, RoleOrigin::Role);
    }

    #[tokio::test]
    async fn custom_role_uses_its_own_fields() {
        let dept = Uuid::new_v4();
        let custom = CustomRole {
            id: Uuid::new_v4(),
            department_id: dept,
            code: "AUDITOR".to_string(),
            name: "Auditor".to_string(),
            priority: 30,
            badge_color: None,
            can_edit_data: false,
            can_download_data: true,
            is_enabled: true,
        };
        let source = MemoryRoles {
            overlays: vec![DepartmentRoleOverlay::Custom(custom.clone())],
            ..Default::default()
        };

        let role = resolve_effective_role(&source, dept, RoleRef::DepartmentRole(custom.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(role.priority, 30);
        assert_eq!(role.origin, RoleOrigin::Custom);
        assert!(role.can_download_data);
    }

    #[tokio::test]
    async fn dangling_references_resolve_to_none() {
        let dept = Uuid::new_v4();
        let admin = template("ADMIN", "Admin", 100);
        let orphan = override_of(dept, &admin, None, true);
        let source = MemoryRoles {
            overlays: vec![DepartmentRoleOverlay::Override(orphan.clone())],
            ..Default::default()
        };

        assert!(resolve_effective_role(&source, dept, RoleRef::Role(Uuid::new_v4()))
            .await
            .unwrap()
            .is_none());
        assert!(resolve_effective_role(&source, dept, RoleRef::DepartmentRole(Uuid::new_v4()))
            .await
            .unwrap()
            .is_none());
        assert!(resolve_effective_role(&source, dept, RoleRef::DepartmentRole(orphan.id))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn overlay_from_another_department_is_not_found() {
        let admin = template("ADMIN", "Admin", 100);
        let ov = override_of(Uuid::new_v4(), &admin, None, true);
        let source = MemoryRoles {
            templates: HashMap::from([(admin.id, admin.clone())]),
            overlays: vec![DepartmentRoleOverlay::Override(ov.clone())],
        };

        let role = resolve_effective_role(&source, Uuid::new_v4(), RoleRef::DepartmentRole(ov.id))
            .await
            .unwrap();
        assert!(role.is_none());
    }

    #[tokio::test]
    async fn assignable_roles_hide_overridden_templates() {
        let dept = Uuid::new_v4();
        let admin = template("ADMIN", "Admin", 100);
        let viewer = template("VIEWER", "Viewer", 10);
        let ov = override_of(dept, &admin, Some("Chief"), false);
        let source = MemoryRoles {
            templates: HashMap::from([(admin.id, admin.clone()), (viewer.id, viewer.clone())]),
            overlays: vec![DepartmentRoleOverlay::Override(ov.clone())],
        };

        let options = assignable_roles(&source, dept).await.unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].role_ref, RoleRef::Role(viewer.id));
        assert_eq!(options[1].role_ref, RoleRef::DepartmentRole(ov.id));
        assert_eq!(options[1].label, "Chief (ADMIN)");
        assert!(options[1].disabled);
    }
}
