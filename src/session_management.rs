//! Session management core module.
//!
//! This module provides the types and submodules tracking background capture
//! sessions: the session snapshot, the registry entry owning the capture
//! process, the concurrent registry, and the start/stop protocol.

use serde::{Deserialize, Serialize};

/// Submodule for the registry entry pairing a session with its process.
pub mod active_session;
/// Submodule for the session snapshot.
pub mod session;
/// Submodule for the start and stop-and-retrieve protocol.
pub mod session_manager;
/// Submodule for the concurrent session map.
pub mod session_registry;

pub use active_session::ActiveCapture;
pub use session::CaptureSession;
pub use session_manager::SessionManager;
pub use session_registry::SessionRegistry;

/// Represents the current status of a capture session.
///
/// Variants:
/// - `Running`: the capture process has not been observed to exit.
/// - `Completed`: the process exited with code 0.
/// - `Error`: the process exited with a non-zero code, was killed by a signal,
///   or could not be waited on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Completed,
    Error,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Running => f.write_str("running"),
            SessionStatus::Completed => f.write_str("completed"),
            SessionStatus::Error => f.write_str("error"),
        }
    }
}
