use crate::{evaluate, AccessRequirement, Subject, Tenant};

/// Content shown only when a requirement holds, with an optional fallback.
///
/// Without a fallback a denied guard resolves to nothing.
#[derive(Debug, Clone)]
pub struct Guarded<T> {
    requirement: AccessRequirement,
    content: T,
    fallback: Option<T>,
}

impl<T> Guarded<T> {
    pub fn new(requirement: AccessRequirement, content: T) -> Self {
        Self {
            requirement,
            content,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: T) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn requirement(&self) -> &AccessRequirement {
        &self.requirement
    }

    pub fn resolve(&self, subject: &Subject, tenant: Option<&Tenant>) -> Option<&T> {
        if evaluate(&self.requirement, subject, tenant) {
            Some(&self.content)
        } else {
            self.fallback.as_ref()
        }
    }

    pub fn into_resolved(self, subject: &Subject, tenant: Option<&Tenant>) -> Option<T> {
        if evaluate(&self.requirement, subject, tenant) {
            Some(self.content)
        } else {
            self.fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin_only() -> AccessRequirement {
        AccessRequirement::new().roles(["admin", "super_admin"])
    }

    #[test]
    fn test_resolve_primary_when_allowed() {
        let guard = Guarded::new(admin_only(), "tenant statistics").with_fallback("summary");
        assert_eq!(
            guard.resolve(&Subject::new("super_admin"), None),
            Some(&"tenant statistics")
        );
    }

    #[test]
    fn test_resolve_fallback_when_denied() {
        let guard = Guarded::new(admin_only(), "tenant statistics").with_fallback("summary");
        assert_eq!(guard.resolve(&Subject::new("reseller"), None), Some(&"summary"));
    }

    #[test]
    fn test_resolve_nothing_without_fallback() {
        let guard = Guarded::new(admin_only(), "delete button");
        assert_eq!(guard.resolve(&Subject::anonymous(), None), None);
        assert_eq!(guard.into_resolved(&Subject::new("admin"), None), Some("delete button"));
    }
}
