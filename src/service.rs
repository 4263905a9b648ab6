use std::sync::Arc;

use uuid::Uuid;

use crate::authz::{
    decide, filter_for_navigation, require_priority, resolve_effective_role, ComposeMode, GuardDecision, GuardOptions,
    IdentitySource, MenuSource, Principal, RoleSource,
};
use crate::cache::DepartmentMenuCache;
use crate::config::GuardConfig;
use crate::errors::{AppError, AppResult};
use crate::models::ComposedMenuRecord;

/// Entry point that loads inputs for the pure engine and never fails open.
pub struct GuardService<C> {
    catalog: Arc<C>,
    cache: Arc<DepartmentMenuCache>,
    options: GuardOptions,
    admin_priority: u32,
}

impl<C> GuardService<C>
where
    C: IdentitySource + RoleSource + MenuSource,
{
    pub fn new(catalog: Arc<C>, cache: Arc<DepartmentMenuCache>, options: GuardOptions, admin_priority: u32) -> Self {
        Self {
            catalog,
            cache,
            options,
            admin_priority,
        }
    }

    pub fn from_config(catalog: Arc<C>, cache: Arc<DepartmentMenuCache>, config: &GuardConfig) -> Self {
        let options = GuardOptions {
            not_found: config.not_found,
        };
        Self::new(catalog, cache, options, config.admin_priority)
    }

    pub fn catalog(&self) -> &Arc<C> {
        &self.catalog
    }

    pub fn cache(&self) -> &Arc<DepartmentMenuCache> {
        &self.cache
    }

    pub fn admin_priority(&self) -> u32 {
        self.admin_priority
    }

    /// Resolves a user to a principal. `None` when the user is unknown or
    /// their role reference dangles.
    pub async fn principal(&self, user_id: Uuid) -> AppResult<Option<Principal>> {
        let Some(identity) = self.catalog.identity(user_id).await? else {
            tracing::debug!(%user_id, "no active identity");
            return Ok(None);
        };

        let role = resolve_effective_role(self.catalog.as_ref(), identity.department_id, identity.role_ref).await?;
        match role {
            Some(role) => Ok(Some(Principal::new(&identity, role))),
            None => {
                tracing::warn!(
                    %user_id,
                    department_id = %identity.department_id,
                    role_ref = ?identity.role_ref,
                    "role reference does not resolve"
                );
                Ok(None)
            }
        }
    }

    pub async fn records(&self, department_id: Uuid, mode: ComposeMode) -> AppResult<Arc<Vec<ComposedMenuRecord>>> {
        self.cache.get_or_compose(self.catalog.as_ref(), department_id, mode).await
    }

    /// Guard decision for `path`. Every failure maps to a denying decision.
    pub async fn authorize(&self, user_id: Option<Uuid>, path: &str) -> GuardDecision {
        let Some(user_id) = user_id else {
            return GuardDecision::Unauthenticated;
        };

        let principal = match self.principal(user_id).await {
            Ok(Some(principal)) => principal,
            Ok(None) => return GuardDecision::Unauthenticated,
            Err(e) => {
                tracing::error!(%user_id, error = %e, "identity resolution failed");
                return GuardDecision::Unauthenticated;
            }
        };

        let records = match self.records(principal.department_id, ComposeMode::Authorization).await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(department_id = %principal.department_id, error = %e, "menu composition failed");
                return GuardDecision::Forbidden {
                    matched_id: None,
                    required_priority: None,
                };
            }
        };

        let decision = decide(path, Some(&principal), &records, &self.options);
        tracing::info!(
            %user_id,
            department_id = %principal.department_id,
            path,
            priority = principal.priority(),
            decision = decision.label(),
            "guard decision"
        );
        decision
    }

    /// Sidebar entries the user can see, already pruned and renumbered.
    pub async fn navigation(&self, user_id: Uuid) -> AppResult<Vec<ComposedMenuRecord>> {
        let Some(principal) = self.principal(user_id).await? else {
            return Ok(Vec::new());
        };
        let records = self.records(principal.department_id, ComposeMode::Listing).await?;
        Ok(filter_for_navigation(&records, principal.priority()))
    }

    /// Principal of `user_id` if it meets the administrative threshold.
    pub async fn require_admin(&self, user_id: Uuid) -> AppResult<Principal> {
        let principal = self.principal(user_id).await?;
        let decision = require_priority(principal.as_ref(), self.admin_priority);
        if !decision.is_allowed() {
            tracing::warn!(%user_id, required = self.admin_priority, "administrative write denied");
        }
        decision.into_result()?;
        principal.ok_or_else(|| AppError::unauthenticated("no resolvable identity"))
    }
}
