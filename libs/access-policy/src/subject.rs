use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The authenticated actor a decision is made for.
///
/// `role` is `None` for an unauthenticated session; role predicates then
/// never match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl Subject {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            permissions: BTreeSet::new(),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}
