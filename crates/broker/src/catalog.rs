//! Service catalog advertised to the marketplace.

use std::path::Path;

use serde::{Deserialize, Serialize};

use havoc_core::HavocError;

/// File name looked up inside `CATALOG_PATH`.
pub const CATALOG_FILE_NAME: &str = "catalog.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub bindable: bool,
    pub plans: Vec<ServicePlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServicePlan {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub free: bool,
}

impl Default for Catalog {
    /// Single bindable service with the one `default` plan.
    fn default() -> Self {
        Self {
            services: vec![Service {
                id: "chaos-galago".to_string(),
                name: "chaos-galago".to_string(),
                description: "Randomly terminates instances of bound applications".to_string(),
                bindable: true,
                plans: vec![ServicePlan {
                    id: "default".to_string(),
                    name: "default".to_string(),
                    description: "Probability and frequency adjustable from the dashboard"
                        .to_string(),
                    free: true,
                }],
                metadata: None,
            }],
        }
    }
}

impl Catalog {
    /// Read `<dir>/catalog.json`.
    pub fn from_dir(dir: &Path) -> Result<Self, HavocError> {
        let path = dir.join(CATALOG_FILE_NAME);
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            HavocError::Config(format!("cannot read catalog {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            HavocError::Config(format!("invalid catalog {}: {}", path.display(), e))
        })
    }

    /// Catalog from the configured directory, or the built-in one when unset.
    pub fn load(dir: Option<&Path>) -> Result<Self, HavocError> {
        match dir {
            Some(dir) => Self::from_dir(dir),
            None => Ok(Self::default()),
        }
    }
}
