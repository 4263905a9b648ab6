use serde::Serialize;
use uuid::Uuid;

use super::index::MenuIndex;
use super::matcher::PathMatcher;
use super::principal::Principal;
use super::priority::required_priority;
use super::NotFoundPolicy;
use crate::errors::{AppError, AppResult};
use crate::models::ComposedMenuRecord;

/// Terminal outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GuardDecision {
    Unauthenticated,
    NotFound,
    Forbidden {
        matched_id: Option<Uuid>,
        required_priority: Option<u32>,
    },
    Allowed {
        matched_id: Option<Uuid>,
        required_priority: u32,
    },
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allowed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            GuardDecision::Unauthenticated => "UNAUTHENTICATED",
            GuardDecision::NotFound => "NOT_FOUND",
            GuardDecision::Forbidden { .. } => "FORBIDDEN",
            GuardDecision::Allowed { .. } => "ALLOWED",
        }
    }

    /// Converts a non-allowing decision into the error a write path propagates.
    pub fn into_result(self) -> AppResult<()> {
        match self {
            GuardDecision::Allowed { .. } => Ok(()),
            GuardDecision::Unauthenticated => Err(AppError::unauthenticated("no resolvable identity")),
            GuardDecision::NotFound => Err(AppError::not_found("no route matches the request")),
            GuardDecision::Forbidden { required_priority, .. } => Err(AppError::permission_denied(match required_priority {
                Some(required) => format!("requires priority {required}"),
                None => "access could not be verified".to_string(),
            })),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GuardOptions {
    pub not_found: NotFoundPolicy,
}

/// `/a/b/c` yields `/a/b/c`, `/a/b`, `/a`, `/`.
pub fn enumerate_ancestor_paths(path: &str) -> Vec<String> {
    let mut out = vec![path.to_string()];
    let mut current = path.trim_end_matches('/');

    while let Some(pos) = current.rfind('/') {
        current = &current[..pos];
        let candidate = if current.is_empty() { "/" } else { current };
        if out.last().map(String::as_str) != Some(candidate) {
            out.push(candidate.to_string());
        }
    }
    out
}

/// Decides whether `principal` may open `path` in a composed record set.
///
/// Pure: the same inputs always give the same decision.
pub fn decide(
    path: &str,
    principal: Option<&Principal>,
    records: &[ComposedMenuRecord],
    options: &GuardOptions,
) -> GuardDecision {
    let Some(principal) = principal else {
        return GuardDecision::Unauthenticated;
    };

    let matcher = PathMatcher::new(records);
    let mut matched = matcher.best_match(path);

    if matched.is_none() && options.not_found == NotFoundPolicy::AncestorProbe {
        matched = enumerate_ancestor_paths(path)
            .iter()
            .skip(1)
            .find_map(|ancestor| matcher.best_match(ancestor));
    }

    let Some(candidate) = matched else {
        tracing::debug!(path, "no menu record matches");
        return GuardDecision::NotFound;
    };

    let index = MenuIndex::new(records);
    let chain = required_priority(candidate.record, &index);
    let matched_id = Some(candidate.record.id);

    if !chain.complete {
        tracing::warn!(path, menu_id = %candidate.record.id, "incomplete ancestor chain, denying");
        return GuardDecision::Forbidden {
            matched_id,
            required_priority: Some(chain.required),
        };
    }

    if principal.priority() >= chain.required {
        GuardDecision::Allowed {
            matched_id,
            required_priority: chain.required,
        }
    } else {
        GuardDecision::Forbidden {
            matched_id,
            required_priority: Some(chain.required),
        }
    }
}

/// Same comparison as [`decide`] against a fixed threshold instead of a route.
pub fn require_priority(principal: Option<&Principal>, threshold: u32) -> GuardDecision {
    match principal {
        None => GuardDecision::Unauthenticated,
        Some(p) if p.priority() >= threshold => GuardDecision::Allowed {
            matched_id: None,
            required_priority: threshold,
        },
        Some(_) => GuardDecision::Forbidden {
            matched_id: None,
            required_priority: Some(threshold),
        },
    }
}
