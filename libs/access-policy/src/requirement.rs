use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A field that callers may give either as a single string or as a list.
///
/// This only exists at the boundary: [`AccessRequirement`] stores every
/// group as a normalized list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// Normalizes into a list. A single empty string counts as "not
    /// specified" and yields `None`; an empty list is kept as specified.
    pub fn normalize(self) -> Option<Vec<String>> {
        match self {
            OneOrMany::One(value) if value.is_empty() => None,
            OneOrMany::One(value) => Some(vec![value]),
            OneOrMany::Many(values) => Some(values),
        }
    }
}

impl From<&str> for OneOrMany {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<String> for OneOrMany {
    fn from(value: String) -> Self {
        OneOrMany::One(value)
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(values: Vec<String>) -> Self {
        OneOrMany::Many(values)
    }
}

impl From<Vec<&str>> for OneOrMany {
    fn from(values: Vec<&str>) -> Self {
        OneOrMany::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for OneOrMany {
    fn from(values: [&str; N]) -> Self {
        OneOrMany::Many(values.iter().map(|value| value.to_string()).collect())
    }
}

/// Declarative bundle of access predicates plus a single combination mode.
///
/// Every group is optional. Groups that are `None` contribute nothing to the
/// decision; a requirement with no groups at all always allows.
///
/// # Example
/// ```
/// use tenant_access_policy::AccessRequirement;
///
/// let requirement = AccessRequirement::new()
///     .roles(["admin", "super_admin"])
///     .features("betaUI");
/// assert!(!requirement.is_unconstrained());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequirement {
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    roles: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    permissions: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    features: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    tenant_types: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    tenant_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    config_requirements: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "null_as_false")]
    require_all: bool,
}

impl AccessRequirement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roles(mut self, roles: impl Into<OneOrMany>) -> Self {
        self.roles = roles.into().normalize();
        self
    }

    pub fn permissions(mut self, permissions: impl Into<OneOrMany>) -> Self {
        self.permissions = permissions.into().normalize();
        self
    }

    pub fn features(mut self, features: impl Into<OneOrMany>) -> Self {
        self.features = features.into().normalize();
        self
    }

    pub fn tenant_types(mut self, tenant_types: impl Into<OneOrMany>) -> Self {
        self.tenant_types = tenant_types.into().normalize();
        self
    }

    pub fn tenant_ids(mut self, tenant_ids: impl Into<OneOrMany>) -> Self {
        self.tenant_ids = tenant_ids.into().normalize();
        self
    }

    /// Adds one required config entry, creating the config group if needed.
    pub fn config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config_requirements
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replaces the config group wholesale. An empty map is still a
    /// specified group.
    pub fn config_requirements(mut self, requirements: Map<String, Value>) -> Self {
        self.config_requirements = Some(requirements);
        self
    }

    pub fn require_all(mut self, require_all: bool) -> Self {
        self.require_all = require_all;
        self
    }

    pub fn required_roles(&self) -> Option<&[String]> {
        self.roles.as_deref()
    }

    pub fn required_permissions(&self) -> Option<&[String]> {
        self.permissions.as_deref()
    }

    pub fn required_features(&self) -> Option<&[String]> {
        self.features.as_deref()
    }

    pub fn required_tenant_types(&self) -> Option<&[String]> {
        self.tenant_types.as_deref()
    }

    pub fn required_tenant_ids(&self) -> Option<&[String]> {
        self.tenant_ids.as_deref()
    }

    pub fn required_config(&self) -> Option<&Map<String, Value>> {
        self.config_requirements.as_ref()
    }

    pub fn is_require_all(&self) -> bool {
        self.require_all
    }

    /// True when no predicate group is specified.
    pub fn is_unconstrained(&self) -> bool {
        self.roles.is_none()
            && self.permissions.is_none()
            && self.features.is_none()
            && self.tenant_types.is_none()
            && self.tenant_ids.is_none()
            && self.config_requirements.is_none()
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<OneOrMany>::deserialize(deserializer)?.and_then(OneOrMany::normalize))
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_field_normalizes_to_single_element_list() {
        let requirement: AccessRequirement =
            serde_json::from_value(json!({ "roles": "admin" })).unwrap();
        assert_eq!(requirement.required_roles(), Some(&["admin".to_string()][..]));
    }

    #[test]
    fn test_empty_string_is_treated_as_absent() {
        let requirement: AccessRequirement =
            serde_json::from_value(json!({ "roles": "", "permissions": null })).unwrap();
        assert!(requirement.required_roles().is_none());
        assert!(requirement.required_permissions().is_none());
        assert!(requirement.is_unconstrained());
    }

    #[test]
    fn test_empty_list_stays_specified() {
        let requirement: AccessRequirement =
            serde_json::from_value(json!({ "tenantIds": [] })).unwrap();
        assert_eq!(requirement.required_tenant_ids(), Some(&[][..]));
        assert!(!requirement.is_unconstrained());
    }

    #[test]
    fn test_null_require_all_means_any() {
        let requirement: AccessRequirement =
            serde_json::from_value(json!({ "roles": "admin", "requireAll": null })).unwrap();
        assert!(!requirement.is_require_all());
        assert_eq!(requirement.required_roles().map(|roles| roles.len()), Some(1));
    }

    #[test]
    fn test_camel_case_wire_names() {
        let requirement: AccessRequirement = serde_json::from_value(json!({
            "tenantTypes": ["distributor", "reseller"],
            "configRequirements": { "tier": ["gold"] },
            "requireAll": true
        }))
        .unwrap();

        assert!(requirement.is_require_all());
        assert_eq!(requirement.required_tenant_types().map(|types| types.len()), Some(2));
        assert_eq!(
            requirement.required_config().and_then(|cfg| cfg.get("tier")),
            Some(&json!(["gold"]))
        );
    }

    #[test]
    fn test_serializes_only_specified_groups() {
        let requirement = AccessRequirement::new().permissions("users.read");
        let value = serde_json::to_value(&requirement).unwrap();
        assert_eq!(
            value,
            json!({ "permissions": ["users.read"], "requireAll": false })
        );
    }

    #[test]
    fn test_builder_config_accumulates_entries() {
        let requirement = AccessRequirement::new()
            .config("billing", true)
            .config("tier", json!(["gold", "platinum"]));
        let config = requirement.required_config().unwrap();
        assert_eq!(config.len(), 2);
        assert_eq!(config.get("billing"), Some(&json!(true)));
    }
}
