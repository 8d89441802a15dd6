pub mod analysis;
pub mod configuration;
pub mod controller;
pub mod engine;
pub mod error_handling;
pub mod process_management;
pub mod session_management;
pub mod storage;
pub mod web_interface;

pub use session_management::SessionStatus;

#[cfg(all(test, unix))]
mod test_support;
