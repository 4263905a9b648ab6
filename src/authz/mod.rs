//! Authorization module - department-scoped route guard
//!
//! This module implements the resolution engine behind every protected view
//! and every protected write:
//! - Effective role composition (template + department override/custom overlay)
//! - Menu composition (template + department visibility/order/enablement overlay)
//! - Path matching with exact > prefix > regex ranking
//! - Required-priority resolution over the ancestor chain
//! - Terminal guard decisions and navigation tree filtering
//!
//! Everything in here except the data source traits is a pure function of
//! its inputs.

mod composer;
mod effective_role;
mod guard;
mod index;
mod matcher;
mod navigation;
mod principal;
mod priority;
mod sources;

pub use composer::{compose, compose_menus, compose_node, ComposeMode};
pub use effective_role::{assignable_roles, effective_from_custom, effective_from_template, resolve_effective_role};
pub use guard::{decide, enumerate_ancestor_paths, require_priority, GuardDecision, GuardOptions};
pub use index::MenuIndex;
pub use matcher::{pick_best_match, MatchCandidate, MatchRank, PathMatcher};
pub use navigation::filter_for_navigation;
pub use principal::Principal;
pub use priority::{effective_threshold, required_priority, PriorityChain, ThresholdRule};
pub use sources::{IdentitySource, MenuSource, RoleSource};

/// Priority an effective role needs for administrative overlay writes.
pub const ADMIN_PRIORITY_THRESHOLD: u32 = 100;

/// What the guard does when no record matches the requested path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotFoundPolicy {
    /// Unknown paths are `NOT_FOUND`.
    #[default]
    Strict,
    /// Retry with each ancestor path (`/a/b/c` -> `/a/b` -> `/a` -> `/`)
    /// and decide on the first one that matches.
    AncestorProbe,
}

impl NotFoundPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "strict" => Some(NotFoundPolicy::Strict),
            "ancestor" | "ancestor_probe" | "lenient" => Some(NotFoundPolicy::AncestorProbe),
            _ => None,
        }
    }
}

/// Well-known role codes
pub mod roles {
    pub const ADMIN: &str = "ADMIN";
    pub const EDITOR: &str = "EDITOR";
    pub const VIEWER: &str = "VIEWER";
}
