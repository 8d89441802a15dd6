use crate::configuration::types::FilterConfiguration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DOCUMENT_VERSION: &str = "1.0.0";

/// The whole persisted store: every named configuration in one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub version: String,
    #[serde(default)]
    pub configs: BTreeMap<String, FilterConfiguration>,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            configs: BTreeMap::new(),
        }
    }
}

/// Listing entry returned when full details are not requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
