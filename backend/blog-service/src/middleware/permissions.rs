/// Authorization policy for blog resources
///
/// Policies are pure: they look only at the acting identity, the resource
/// (when one exists) and the action, and answer allow or deny. Which policy
/// guards which `(resource, action)` pair is decided by `ResourceTable`.
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::Identity;
use crate::models::Owned;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
}

impl Action {
    /// Read-only actions.
    pub fn is_safe(self) -> bool {
        matches!(self, Action::List | Action::Retrieve)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Posts,
    Groups,
    Comments,
    Follows,
}

impl ResourceKind {
    fn label(self) -> &'static str {
        match self {
            ResourceKind::Posts => "posts",
            ResourceKind::Groups => "groups",
            ResourceKind::Comments => "comments",
            ResourceKind::Follows => "follows",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    fn from_bool(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

pub trait AccessPolicy: Send + Sync {
    /// `resource` is `None` for collection-level actions (list, create).
    fn evaluate(&self, identity: &Identity, resource: Option<&dyn Owned>, action: Action)
        -> Decision;
}

/// Anyone may read; only the owner may change or delete; creating needs a
/// signed-in identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerOrReadOnly;

impl AccessPolicy for OwnerOrReadOnly {
    fn evaluate(
        &self,
        identity: &Identity,
        resource: Option<&dyn Owned>,
        action: Action,
    ) -> Decision {
        if action.is_safe() {
            return Decision::Allow;
        }
        match (identity.user_id(), resource) {
            (None, _) => Decision::Deny,
            (Some(_), None) => Decision::Allow,
            (Some(user), Some(resource)) => Decision::from_bool(resource.owner() == user),
        }
    }
}

/// Every action, reads included, needs a signed-in identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticatedOnly;

impl AccessPolicy for AuthenticatedOnly {
    fn evaluate(&self, identity: &Identity, _: Option<&dyn Owned>, _: Action) -> Decision {
        Decision::from_bool(identity.is_authenticated())
    }
}

/// Anyone may perform the actions this policy is registered for.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAny;

impl AccessPolicy for AllowAny {
    fn evaluate(&self, _: &Identity, _: Option<&dyn Owned>, _: Action) -> Decision {
        Decision::Allow
    }
}

/// Dispatch table from `(resource, action)` to the policy guarding it.
/// Pairs that are absent are not exposed at all.
#[derive(Clone)]
pub struct ResourceTable {
    routes: HashMap<(ResourceKind, Action), Arc<dyn AccessPolicy>>,
}

impl ResourceTable {
    pub fn empty() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    pub fn register(
        mut self,
        kind: ResourceKind,
        actions: &[Action],
        policy: Arc<dyn AccessPolicy>,
    ) -> Self {
        for action in actions {
            self.routes.insert((kind, *action), policy.clone());
        }
        self
    }

    pub fn supports(&self, kind: ResourceKind, action: Action) -> bool {
        self.routes.contains_key(&(kind, action))
    }

    /// Evaluate the registered policy; `Deny` becomes `Forbidden`.
    pub fn authorize(
        &self,
        kind: ResourceKind,
        action: Action,
        identity: &Identity,
        resource: Option<&dyn Owned>,
    ) -> Result<()> {
        let policy = self.routes.get(&(kind, action)).ok_or_else(|| {
            AppError::MethodNotAllowed(format!("{:?} is not supported on {}", action, kind.label()))
        })?;

        match policy.evaluate(identity, resource, action) {
            Decision::Allow => Ok(()),
            Decision::Deny => {
                tracing::debug!(
                    resource = kind.label(),
                    ?action,
                    user = ?identity.user_id(),
                    "authorization denied"
                );
                Err(AppError::Forbidden(format!(
                    "You don't have permission to {:?} {}",
                    action,
                    kind.label()
                )))
            }
        }
    }
}

impl Default for ResourceTable {
    /// The REST surface: posts and comments are owner-or-read-only, groups
    /// are read-only, follows are private to signed-in users.
    fn default() -> Self {
        use Action::*;

        let owner_or_read_only: Arc<dyn AccessPolicy> = Arc::new(OwnerOrReadOnly);
        let crud = [List, Retrieve, Create, Update, Delete];

        ResourceTable::empty()
            .register(ResourceKind::Posts, &crud, owner_or_read_only.clone())
            .register(ResourceKind::Comments, &crud, owner_or_read_only)
            .register(ResourceKind::Groups, &[List, Retrieve], Arc::new(AllowAny))
            .register(
                ResourceKind::Follows,
                &[List, Create],
                Arc::new(AuthenticatedOnly),
            )
    }
}
