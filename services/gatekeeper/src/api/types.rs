use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tenant_access_policy::{AccessRequirement, Group, Subject};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessQueryRequest {
    #[serde(default)]
    pub subject: Subject,
    #[serde(default)]
    pub requirement: AccessRequirement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessQueryResponse {
    pub result: AccessDecision,
    pub metrics: EvaluationMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessDecision {
    pub allow: bool,
    /// Outcome of each predicate group the requirement specified.
    #[serde(default)]
    pub groups: BTreeMap<Group, bool>,
}

/// Several named requirements evaluated against one subject and tenant,
/// e.g. every guarded element of a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchAccessRequest {
    #[serde(default)]
    pub subject: Subject,
    pub requirements: BTreeMap<String, AccessRequirement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchAccessResponse {
    pub results: BTreeMap<String, bool>,
    pub metrics: EvaluationMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub eval_duration_micros: u64,
    pub tenant_id: String,
    /// False when the tenant is not registered and tenant predicates were
    /// evaluated against an absent tenant.
    pub tenant_found: bool,
    pub evaluated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlagRequest {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(default)]
    pub details: Option<Value>,
}
