//! Configuration store trait
//!
//! Implementors persist named [`FilterConfiguration`] bundles. Each call is a
//! single atomic document operation; no transaction spans several calls.

use crate::configuration::types::FilterConfiguration;
use crate::error_handling::types::StorageError;
use crate::storage::types::{ConfigDocument, ConfigSummary};

pub trait ConfigStore: Send + Sync {
    /// Saves `config` under `name`, replacing any configuration with that name.
    fn save(&self, name: &str, config: &FilterConfiguration) -> Result<(), StorageError>;

    /// Loads the configuration stored under `name`.
    fn load(&self, name: &str) -> Result<FilterConfiguration, StorageError>;

    /// Lists stored configuration names with their descriptions.
    fn list(&self) -> Result<Vec<ConfigSummary>, StorageError>;

    /// Returns the complete stored document.
    fn document(&self) -> Result<ConfigDocument, StorageError>;

    /// Deletes the configuration stored under `name`.
    fn delete(&self, name: &str) -> Result<(), StorageError>;
}
