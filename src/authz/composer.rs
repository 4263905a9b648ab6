use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::sources::MenuSource;
use crate::errors::AppResult;
use crate::models::{ComposedMenuRecord, DepartmentMenuOverlay, MenuNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComposeMode {
    /// Every active template, hidden ones included. Hidden routes are still routes.
    Authorization,
    /// Administrative editing view. Template-hidden nodes are out of department control.
    Listing,
}

/// Merges one template with its department overlay.
pub fn compose_node(node: &MenuNode, overlay: Option<&DepartmentMenuOverlay>, mode: ComposeMode) -> ComposedMenuRecord {
    let template_hidden = match mode {
        ComposeMode::Authorization => node.hidden,
        ComposeMode::Listing => false,
    };
    let requested_hidden = overlay.and_then(|o| o.hidden_override).unwrap_or(template_hidden);

    let effective_hidden = if node.lock_hidden_override {
        if requested_hidden {
            tracing::warn!(menu_id = %node.id, "ignoring hidden state on a node with locked visibility");
        }
        false
    } else {
        requested_hidden
    };

    ComposedMenuRecord {
        id: node.id,
        parent_id: node.parent_id,
        title: node.title.clone(),
        href: if node.is_section { None } else { node.href.clone() },
        match_mode: node.match_mode,
        pattern: node.pattern.clone(),
        min_priority: node.min_priority,
        is_section: node.is_section,
        hidden: node.hidden,
        lock_hidden_override: node.lock_hidden_override,
        order: node.order,
        effective_is_active: overlay.and_then(|o| o.is_enabled).unwrap_or(true),
        effective_hidden,
        effective_order: overlay.and_then(|o| o.sort_order).unwrap_or(node.order),
    }
}

/// Composes a department's menu set.
///
/// The output is grouped by parent (roots first) and ordered within each
/// sibling group by effective order, then template order, then id, so equal
/// inputs always give equal outputs.
pub fn compose(templates: &[MenuNode], overlays: &[DepartmentMenuOverlay], mode: ComposeMode) -> Vec<ComposedMenuRecord> {
    let by_menu: HashMap<Uuid, &DepartmentMenuOverlay> = overlays.iter().map(|o| (o.menu_id, o)).collect();

    let mut records: Vec<ComposedMenuRecord> = templates
        .iter()
        .filter(|node| node.is_active)
        .filter(|node| mode == ComposeMode::Authorization || !node.hidden)
        .map(|node| compose_node(node, by_menu.get(&node.id).copied(), mode))
        .collect();

    records.sort_by(|a, b| {
        a.parent_id
            .cmp(&b.parent_id)
            .then_with(|| a.effective_order.cmp(&b.effective_order))
            .then_with(|| a.order.cmp(&b.order))
            .then_with(|| a.id.cmp(&b.id))
    });
    records
}

/// Loads and composes the menu set for one department.
pub async fn compose_menus<S>(source: &S, department_id: Uuid, mode: ComposeMode) -> AppResult<Vec<ComposedMenuRecord>>
where
    S: MenuSource + ?Sized,
{
    let templates = source.active_menu_templates().await?;
    let overlays: Vec<DepartmentMenuOverlay> = source
        .department_menu_overlays(department_id)
        .await?
        .into_iter()
        .filter(|o| o.department_id == department_id)
        .collect();

    let records = compose(&templates, &overlays, mode);
    tracing::debug!(
        %department_id,
        ?mode,
        templates = templates.len(),
        overlays = overlays.len(),
        records = records.len(),
        "composed department menus"
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchMode;

    fn node(id: u128, parent: Option<u128>, order: i64) -> MenuNode {
        MenuNode {
            id: Uuid::from_u128(id),
            parent_id: parent.map(Uuid::from_u128),
            title: format!("node {id}"),
            href: Some(format!("/n{id}")),
            match_mode: MatchMode::Exact,
            pattern: None,
            min_priority: None,
            is_section: false,
            is_active: true,
            hidden: false,
            lock_hidden_override: false,
            order,
        }
    }

    fn overlay(menu: u128) -> DepartmentMenuOverlay {
        DepartmentMenuOverlay {
            department_id: Uuid::from_u128(999),
            menu_id: Uuid::from_u128(menu),
            ..Default::default()
        }
    }

    #[test]
    fn overlay_values_win_and_absent_values_inherit() {
        let mut hidden_template = node(2, None, 1);
        hidden_template.hidden = true;
        let templates = vec![node(1, None, 0), hidden_template];
        let overlays = vec![DepartmentMenuOverlay {
            is_enabled: Some(false),
            sort_order: Some(7),
            ..overlay(1)
        }];

        let records = compose(&templates, &overlays, ComposeMode::Authorization);
        let first = records.iter().find(|r| r.id == Uuid::from_u128(1)).unwrap();
        assert!(!first.effective_is_active);
        assert_eq!(first.effective_order, 7);
        assert!(!first.effective_hidden);

        let second = records.iter().find(|r| r.id == Uuid::from_u128(2)).unwrap();
        assert!(second.effective_is_active);
        assert!(second.effective_hidden);
        assert_eq!(second.effective_order, 1);
    }

    #[test]
    fn listing_mode_drops_template_hidden_nodes() {
        let mut hidden_template = node(2, None, 1);
        hidden_template.hidden = true;
        let templates = vec![node(1, None, 0), hidden_template];
        let overlays = vec![DepartmentMenuOverlay {
            hidden_override: Some(true),
            ..overlay(1)
        }];

        let listing = compose(&templates, &overlays, ComposeMode::Listing);
        assert_eq!(listing.len(), 1);
        assert!(listing[0].effective_hidden);

        let auth = compose(&templates, &overlays, ComposeMode::Authorization);
        assert_eq!(auth.len(), 2);
    }

    #[test]
    fn inactive_templates_are_never_composed() {
        let mut inactive = node(2, None, 1);
        inactive.is_active = false;
        let records = compose(&[node(1, None, 0), inactive], &[], ComposeMode::Authorization);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn locked_node_is_never_hidden() {
        let mut locked = node(1, None, 0);
        locked.lock_hidden_override = true;
        let overlays = vec![DepartmentMenuOverlay {
            hidden_override: Some(true),
            ..overlay(1)
        }];

        for mode in [ComposeMode::Authorization, ComposeMode::Listing] {
            let records = compose(std::slice::from_ref(&locked), &overlays, mode);
            assert!(!records[0].effective_hidden);
        }
    }

    #[test]
    fn sections_carry_no_href() {
        let mut section = node(1, None, 0);
        section.is_section = true;
        let records = compose(&[section], &[], ComposeMode::Authorization);
        assert_eq!(records[0].href, None);
    }

    #[test]
    fn composition_is_idempotent_and_order_independent() {
        let templates = vec![node(3, Some(1), 0), node(1, None, 0), node(2, Some(1), 0), node(4, None, 1)];
        let overlays = vec![DepartmentMenuOverlay {
            sort_order: Some(1),
            ..overlay(3)
        }];

        let first = compose(&templates, &overlays, ComposeMode::Authorization);
        let second = compose(&templates, &overlays, ComposeMode::Authorization);
        assert_eq!(first, second);

        let mut reversed = templates.clone();
        reversed.reverse();
        assert_eq!(first, compose(&reversed, &overlays, ComposeMode::Authorization));

        let ids: Vec<u128> = first.iter().map(|r| r.id.as_u128()).collect();
        assert_eq!(ids, vec![1, 4, 2, 3]);
    }
}
