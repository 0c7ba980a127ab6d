//! Service-binding discovery from the platform environment.
//!
//! The platform injects `VCAP_SERVICES` (bound services with credentials) and
//! `VCAP_APPLICATION` (the app's own routes) as JSON strings.

use std::collections::BTreeMap;
use std::env;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::HavocError;

/// Bound services grouped by label (`user-provided`, `p-mysql`, ...).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct VcapServices {
    pub by_label: BTreeMap<String, Vec<BoundService>>,
}

/// One bound service instance with free-form credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct BoundService {
    pub name: String,
    #[serde(default)]
    pub credentials: Map<String, Value>,
}

impl VcapServices {
    pub fn parse(raw: &str) -> Result<Self, HavocError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Read `VCAP_SERVICES`. Returns `None` when unset or malformed.
    pub fn from_env() -> Option<Self> {
        let raw = env::var("VCAP_SERVICES").ok().filter(|s| !s.is_empty())?;
        match Self::parse(&raw) {
            Ok(services) => Some(services),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed VCAP_SERVICES");
                None
            }
        }
    }

    /// Service bound under `name`, whatever its label.
    pub fn find(&self, name: &str) -> Option<&BoundService> {
        self.by_label.values().flatten().find(|s| s.name == name)
    }
}

impl BoundService {
    /// Credential value rendered as a string. Numbers and booleans are
    /// rendered too; `port` is often unquoted.
    pub fn credential(&self, key: &str) -> Option<String> {
        match self.credentials.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// First credential present among `keys`.
    pub fn credential_any(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.credential(k))
    }

    pub fn credential_bool(&self, key: &str) -> bool {
        match self.credentials.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

/// The subset of `VCAP_APPLICATION` the broker reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VcapApplication {
    #[serde(default)]
    pub application_uris: Vec<String>,
}

impl VcapApplication {
    pub fn parse(raw: &str) -> Result<Self, HavocError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_env() -> Option<Self> {
        let raw = env::var("VCAP_APPLICATION").ok().filter(|s| !s.is_empty())?;
        Self::parse(&raw).ok()
    }

    /// First route of the app with the first `-green` removed.
    pub fn public_uri(&self) -> Option<String> {
        self.application_uris
            .first()
            .map(|uri| uri.replacen("-green", "", 1))
    }
}
