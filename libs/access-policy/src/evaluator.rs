use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AccessRequirement, Subject, Tenant};

/// Combination mode selected by `requireAll`.
///
/// The same mode joins the elements inside a group and the groups
/// themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    All,
    Any,
}

impl Combine {
    pub fn from_require_all(require_all: bool) -> Self {
        if require_all {
            Combine::All
        } else {
            Combine::Any
        }
    }

    fn apply<I, F>(self, items: I, predicate: F) -> bool
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> bool,
    {
        let mut items = items.into_iter();
        match self {
            Combine::All => items.all(predicate),
            Combine::Any => items.any(predicate),
        }
    }
}

/// A predicate group of an [`AccessRequirement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Roles,
    Permissions,
    Features,
    TenantTypes,
    TenantIds,
    Config,
}

const GROUPS: [Group; 6] = [
    Group::Roles,
    Group::Permissions,
    Group::Features,
    Group::TenantTypes,
    Group::TenantIds,
    Group::Config,
];

/// Outcome of [`explain`]: the decision plus the result of every group that
/// took part in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub allow: bool,
    pub groups: Vec<(Group, bool)>,
}

/// Decides whether `subject` may see content guarded by `requirement` while
/// `tenant` is active.
///
/// `tenant` is `None` when no tenant is selected; every tenant-based
/// predicate then fails instead of erroring.
///
/// # Example
/// ```
/// use tenant_access_policy::{evaluate, AccessRequirement, Subject};
///
/// let requirement = AccessRequirement::new().roles(["admin", "reseller"]);
/// assert!(evaluate(&requirement, &Subject::new("reseller"), None));
/// ```
pub fn evaluate(
    requirement: &AccessRequirement,
    subject: &Subject,
    tenant: Option<&Tenant>,
) -> bool {
    let combine = Combine::from_require_all(requirement.is_require_all());
    let mut specified = group_outcomes(requirement, subject, tenant)
        .into_iter()
        .flatten()
        .peekable();

    if specified.peek().is_none() {
        return true;
    }

    combine.apply(specified, |outcome| outcome)
}

/// Same decision as [`evaluate`], keeping the per-group outcomes.
pub fn explain(
    requirement: &AccessRequirement,
    subject: &Subject,
    tenant: Option<&Tenant>,
) -> Decision {
    let combine = Combine::from_require_all(requirement.is_require_all());
    let groups: Vec<(Group, bool)> = GROUPS
        .into_iter()
        .zip(group_outcomes(requirement, subject, tenant))
        .filter_map(|(group, outcome)| outcome.map(|outcome| (group, outcome)))
        .collect();

    let allow = groups.is_empty() || combine.apply(&groups, |(_, outcome)| *outcome);

    Decision { allow, groups }
}

/// One slot per entry of `GROUPS`; `None` for groups the requirement leaves
/// unspecified.
fn group_outcomes(
    requirement: &AccessRequirement,
    subject: &Subject,
    tenant: Option<&Tenant>,
) -> [Option<bool>; 6] {
    let combine = Combine::from_require_all(requirement.is_require_all());

    let roles = requirement
        .required_roles()
        .map(|roles| combine.apply(roles, |role| subject.has_role(role)));

    let permissions = requirement.required_permissions().map(|permissions| {
        combine.apply(permissions, |permission| subject.has_permission(permission))
    });

    let features = requirement.required_features().map(|features| {
        combine.apply(features, |feature| {
            tenant.is_some_and(|tenant| tenant.feature_enabled(feature))
        })
    });

    let tenant_types = requirement.required_tenant_types().map(|types| {
        combine.apply(types, |token| {
            tenant.is_some_and(|tenant| tenant.matches_type(token))
        })
    });

    let tenant_ids = requirement.required_tenant_ids().map(|ids| {
        combine.apply(ids, |id| tenant.is_some_and(|tenant| tenant.id == *id))
    });

    let config = requirement.required_config().map(|required| {
        combine.apply(required, |(key, expected)| {
            config_satisfied(expected, tenant.and_then(|tenant| tenant.config_value(key)))
        })
    });

    [roles, permissions, features, tenant_types, tenant_ids, config]
}

/// Booleans compare strictly, lists accept any member, everything else
/// compares strictly.
fn config_satisfied(expected: &Value, actual: Option<&Value>) -> bool {
    match (expected, actual) {
        (_, None) => false,
        (Value::Bool(expected), Some(actual)) => actual.as_bool() == Some(*expected),
        (Value::Array(accepted), Some(actual)) => {
            accepted.iter().any(|candidate| strict_eq(candidate, actual))
        }
        (expected, Some(actual)) => strict_eq(expected, actual),
    }
}

/// Scalar identity: numbers compare numerically, objects and arrays are never
/// equal to anything.
fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(left), Value::Bool(right)) => left == right,
        (Value::String(left), Value::String(right)) => left == right,
        (Value::Number(left), Value::Number(right)) => match (left.as_f64(), right.as_f64()) {
            (Some(left), Some(right)) => left == right,
            _ => left == right,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strict_eq_numbers_ignore_representation() {
        assert!(strict_eq(&json!(1), &json!(1.0)));
        assert!(!strict_eq(&json!(1), &json!("1")));
    }

    #[test]
    fn test_strict_eq_composites_never_match() {
        assert!(!strict_eq(&json!({ "a": 1 }), &json!({ "a": 1 })));
        assert!(!strict_eq(&json!([1]), &json!([1])));
        assert!(strict_eq(&json!(null), &json!(null)));
    }

    #[test]
    fn test_config_bool_requires_bool() {
        assert!(config_satisfied(&json!(true), Some(&json!(true))));
        assert!(!config_satisfied(&json!(true), Some(&json!(1))));
        assert!(!config_satisfied(&json!(false), None));
    }

    #[test]
    fn test_config_list_containment() {
        let accepted = json!(["gold", "platinum"]);
        assert!(config_satisfied(&accepted, Some(&json!("platinum"))));
        assert!(!config_satisfied(&accepted, Some(&json!("silver"))));
        assert!(!config_satisfied(&accepted, Some(&json!(["gold"]))));
    }

    #[test]
    fn test_explain_reports_only_specified_groups() {
        let requirement = AccessRequirement::new()
            .roles("admin")
            .features("betaUI")
            .require_all(true);
        let tenant = Tenant::new("acme", "distributor").with_feature("betaUI", true);

        let decision = explain(&requirement, &Subject::new("reseller"), Some(&tenant));

        assert!(!decision.allow);
        assert_eq!(
            decision.groups,
            vec![(Group::Roles, false), (Group::Features, true)]
        );
    }

    #[test]
    fn test_explain_agrees_with_evaluate_when_unconstrained() {
        let requirement = AccessRequirement::new();
        let decision = explain(&requirement, &Subject::anonymous(), None);
        assert!(decision.allow);
        assert!(decision.groups.is_empty());
        assert!(evaluate(&requirement, &Subject::anonymous(), None));
    }
}
