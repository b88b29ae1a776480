//! Permission gate: which actions a screen may offer to the current actor

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

use crate::core::envelope::PermissionPayload;
use crate::core::gateway::ApiGateway;

/// Screen actions subject to permission checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
    View,
}

impl Action {
    pub fn all() -> &'static [Action] {
        &[Action::Create, Action::Update, Action::Delete, Action::View]
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
            Action::View => write!(f, "view"),
        }
    }
}

/// Resolved permissions for one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub can_create: bool,
    pub can_update: bool,
    pub can_delete: bool,
    pub can_view: bool,
}

impl Default for PermissionSet {
    /// Viewing is allowed without an explicit grant; mutations are not
    fn default() -> Self {
        Self {
            can_create: false,
            can_update: false,
            can_delete: false,
            can_view: true,
        }
    }
}

impl PermissionSet {
    pub fn all() -> Self {
        Self {
            can_create: true,
            can_update: true,
            can_delete: true,
            can_view: true,
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Create => self.can_create,
            Action::Update => self.can_update,
            Action::Delete => self.can_delete,
            Action::View => self.can_view,
        }
    }

    /// Actions whose controls are shown; everything else stays hidden
    pub fn visible_actions(&self) -> Vec<Action> {
        Action::all()
            .iter()
            .copied()
            .filter(|a| self.allows(*a))
            .collect()
    }
}

impl From<PermissionPayload> for PermissionSet {
    fn from(payload: PermissionPayload) -> Self {
        Self {
            can_create: payload.is_create,
            can_update: payload.is_update,
            can_delete: payload.is_delete,
            can_view: payload.is_view.unwrap_or(true),
        }
    }
}

/// Capability descriptor: a logical resource plus the key the permission
/// service knows it by
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionScope {
    /// Logical resource identifier (cache key)
    pub resource: String,
    /// Lookup key sent to the permission service
    pub route: String,
}

impl PermissionScope {
    pub fn new(resource: &str, route: &str) -> Self {
        Self {
            resource: resource.to_string(),
            route: route.to_string(),
        }
    }
}

/// Resolves and caches permission sets for the lifetime of a screen
pub struct PermissionGate {
    gateway: Rc<dyn ApiGateway>,
    cache: RefCell<HashMap<String, PermissionSet>>,
}

impl PermissionGate {
    pub fn new(gateway: Rc<dyn ApiGateway>) -> Self {
        Self {
            gateway,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Cached permission set, if this scope was already resolved
    pub fn cached(&self, scope: &PermissionScope) -> Option<PermissionSet> {
        self.cache.borrow().get(&scope.resource).copied()
    }

    /// Resolve a scope, hitting the backend at most once per resource
    ///
    /// A failed lookup or missing record yields the default set (view only)
    /// and is cached like any other answer.
    pub async fn resolve(&self, scope: &PermissionScope) -> PermissionSet {
        if let Some(set) = self.cached(scope) {
            return set;
        }

        let set = match self.gateway.permissions(&scope.route).await {
            Ok(env) if env.status => env.data.map(PermissionSet::from).unwrap_or_default(),
            Ok(env) => {
                debug!(route = %scope.route, message = ?env.message(), "no permission record");
                PermissionSet::default()
            }
            Err(e) => {
                warn!(route = %scope.route, error = %e, "permission lookup failed, using defaults");
                PermissionSet::default()
            }
        };

        self.cache
            .borrow_mut()
            .insert(scope.resource.clone(), set);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allows_only_view() {
        let set = PermissionSet::default();
        assert!(set.allows(Action::View));
        assert!(!set.allows(Action::Create));
        assert!(!set.allows(Action::Update));
        assert!(!set.allows(Action::Delete));
        assert_eq!(set.visible_actions(), vec![Action::View]);
    }

    #[test]
    fn test_payload_view_defaults_to_true() {
        let set = PermissionSet::from(PermissionPayload {
            is_create: true,
            is_update: false,
            is_delete: true,
            is_view: None,
        });
        assert_eq!(
            set.visible_actions(),
            vec![Action::Create, Action::Delete, Action::View]
        );

        let hidden = PermissionSet::from(PermissionPayload {
            is_view: Some(false),
            ..Default::default()
        });
        assert!(hidden.visible_actions().is_empty());
    }
}
