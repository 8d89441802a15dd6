//! Storage subsystem
//!
//! Persistence for named filter configurations.
//!
//! Components:
//! - `storage_trait`: the `ConfigStore` trait defining a uniform API.
//! - `types`: the persisted document and listing types.
//! - `file_storage`: single JSON document on the filesystem.

pub mod file_storage;
pub mod storage_trait;
pub mod types;

pub use file_storage::FileConfigStore;
pub use storage_trait::ConfigStore;
pub use types::{ConfigDocument, ConfigSummary};
