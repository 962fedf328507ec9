use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Organizational kind of a tenant.
///
/// The three well-known kinds get their own variants; anything else the
/// portal sends is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TenantType {
    Distributor,
    Reseller,
    EndUser,
    Other(String),
}

impl TenantType {
    pub fn as_str(&self) -> &str {
        match self {
            TenantType::Distributor => "distributor",
            TenantType::Reseller => "reseller",
            TenantType::EndUser => "end_user",
            TenantType::Other(value) => value.as_str(),
        }
    }
}

impl From<String> for TenantType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "distributor" => TenantType::Distributor,
            "reseller" => TenantType::Reseller,
            "end_user" => TenantType::EndUser,
            _ => TenantType::Other(value),
        }
    }
}

impl From<&str> for TenantType {
    fn from(value: &str) -> Self {
        TenantType::from(value.to_string())
    }
}

impl From<TenantType> for String {
    fn from(value: TenantType) -> Self {
        match value {
            TenantType::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TenantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of the active tenant as maintained by the tenant registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    #[serde(rename = "type")]
    pub tenant_type: TenantType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub feature_flags: BTreeMap<String, bool>,
}

impl Tenant {
    pub fn new(id: impl Into<String>, tenant_type: impl Into<TenantType>) -> Self {
        Self {
            id: id.into(),
            tenant_type: tenant_type.into(),
            name: None,
            config: Map::new(),
            feature_flags: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    pub fn with_feature(mut self, flag: impl Into<String>, enabled: bool) -> Self {
        self.feature_flags.insert(flag.into(), enabled);
        self
    }

    pub fn is_distributor(&self) -> bool {
        self.tenant_type == TenantType::Distributor
    }

    pub fn is_reseller(&self) -> bool {
        self.tenant_type == TenantType::Reseller
    }

    pub fn is_end_user(&self) -> bool {
        self.tenant_type == TenantType::EndUser
    }

    /// Unknown flags are disabled.
    pub fn feature_enabled(&self, flag: &str) -> bool {
        self.feature_flags.get(flag).copied().unwrap_or(false)
    }

    pub fn config_value(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    /// Resolves a tenant-type token. The three well-known tokens go through
    /// the derived `is_*` checks; any other token is compared with the raw
    /// type string.
    pub fn matches_type(&self, token: &str) -> bool {
        match token {
            "distributor" => self.is_distributor(),
            "reseller" => self.is_reseller(),
            "end_user" => self.is_end_user(),
            other => self.tenant_type.as_str() == other,
        }
    }
}
