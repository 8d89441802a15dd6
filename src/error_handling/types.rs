use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    InvalidValue(String),
    DirectoryDoesNotExist(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::InvalidValue(e) => write!(f, "Invalid configuration value: {}", e),
            ConfigError::DirectoryDoesNotExist(e) => write!(f, "Directory error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

/// Errors raised by the named-configuration store.
#[derive(Debug)]
pub enum StorageError {
    ConfigNotFound(String),
    InvalidName(String),
    ReadFailed(String),
    WriteFailed(String),
    InvalidDocument(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConfigNotFound(name) => write!(f, "Configuration '{}' not found", name),
            StorageError::InvalidName(e) => write!(f, "Invalid configuration name: {}", e),
            StorageError::ReadFailed(e) => write!(f, "Configuration store read failed: {}", e),
            StorageError::WriteFailed(e) => write!(f, "Configuration store write failed: {}", e),
            StorageError::InvalidDocument(e) => {
                write!(f, "Configuration store document is invalid: {}", e)
            }
        }
    }
}

impl std::error::Error for StorageError {}

#[derive(Debug)]
pub enum EngineError {
    ExecutableNotFound(Vec<PathBuf>),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::ExecutableNotFound(tried) => {
                let tried = tried
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "tshark executable not found (tried: {})", tried)
            }
        }
    }
}

impl std::error::Error for EngineError {}

#[derive(Debug, PartialEq)]
pub enum SessionError {
    Duplicate(String),
    NotFound(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Duplicate(id) => write!(f, "Session '{}' is already active", id),
            SessionError::NotFound(id) => write!(f, "No active session with id '{}'", id),
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Debug)]
pub enum CaptureError {
    SpawnFailed(String),
    SessionError(SessionError),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::SpawnFailed(e) => write!(f, "Failed to spawn capture process: {}", e),
            CaptureError::SessionError(e) => write!(f, "Capture session error: {}", e),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<SessionError> for CaptureError {
    fn from(err: SessionError) -> Self {
        CaptureError::SessionError(err)
    }
}

#[derive(Debug)]
pub enum AnalysisError {
    FileNotFound(PathBuf),
    Unreadable(PathBuf, std::io::Error),
    SpawnFailed(std::io::Error),
    EngineFailed { code: Option<i32>, stderr: String },
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::FileNotFound(p) => write!(f, "Capture file not found: {}", p.display()),
            AnalysisError::Unreadable(p, e) => {
                write!(f, "Capture file {} is unreadable: {}", p.display(), e)
            }
            AnalysisError::SpawnFailed(e) => write!(f, "Failed to run tshark: {}", e),
            AnalysisError::EngineFailed { code, stderr } => match code {
                Some(code) => write!(f, "tshark exited with code {}: {}", code, stderr.trim()),
                None => write!(f, "tshark was terminated by a signal: {}", stderr.trim()),
            },
        }
    }
}

impl std::error::Error for AnalysisError {}

/// Failures surfaced to callers of the exposed operations.
///
/// The `Display` output names the failing operation and the next step a caller
/// can take.
#[derive(Debug)]
pub enum ControllerError {
    Storage(StorageError),
    Session(SessionError),
    Capture(CaptureError),
    Analysis(AnalysisError),
    Engine(EngineError),
    NoResults { session_id: String, path: PathBuf },
    InvalidRequest(String),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::Storage(StorageError::ConfigNotFound(name)) => write!(
                f,
                "Configuration '{}' not found. Use manage_config with action 'list' to see available configurations.",
                name
            ),
            ControllerError::Storage(e) => write!(f, "Configuration store error: {}", e),
            ControllerError::Session(SessionError::NotFound(id)) => write!(
                f,
                "No active capture session with id '{}'. List active sessions to find a valid id.",
                id
            ),
            ControllerError::Session(SessionError::Duplicate(id)) => write!(
                f,
                "A capture session with id '{}' is already active. Stop it first or choose another session name.",
                id
            ),
            ControllerError::Capture(e) => write!(
                f,
                "Starting capture failed: {}. Check the interface name and capture privileges.",
                clause(e)
            ),
            ControllerError::Analysis(AnalysisError::FileNotFound(p)) => write!(
                f,
                "Analysis failed: file {} does not exist. Check the path and try again.",
                p.display()
            ),
            ControllerError::Analysis(e) => write!(
                f,
                "Analysis failed: {}. Check the display filter and field names.",
                clause(e)
            ),
            ControllerError::Engine(e) => write!(
                f,
                "{}. Install Wireshark/tshark or set tshark_path in the configuration.",
                e
            ),
            ControllerError::NoResults { session_id, path } => write!(
                f,
                "Capture session '{}' produced no results ({} missing or empty). No packets were captured; check the interface and capture filter.",
                session_id,
                path.display()
            ),
            ControllerError::InvalidRequest(e) => write!(f, "Invalid request: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

/// An inner error rendered without its closing full stop.
fn clause(err: &dyn fmt::Display) -> String {
    err.to_string().trim_end().trim_end_matches('.').to_string()
}

impl From<StorageError> for ControllerError {
    fn from(err: StorageError) -> Self {
        ControllerError::Storage(err)
    }
}

impl From<SessionError> for ControllerError {
    fn from(err: SessionError) -> Self {
        ControllerError::Session(err)
    }
}

impl From<CaptureError> for ControllerError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::SessionError(e) => ControllerError::Session(e),
            other => ControllerError::Capture(other),
        }
    }
}

impl From<AnalysisError> for ControllerError {
    fn from(err: AnalysisError) -> Self {
        ControllerError::Analysis(err)
    }
}

impl From<EngineError> for ControllerError {
    fn from(err: EngineError) -> Self {
        ControllerError::Engine(err)
    }
}

#[derive(Debug)]
pub enum WebError {
    BindFailed(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::BindFailed(e) => write!(f, "Web server bind failed: {}", e),
        }
    }
}

impl std::error::Error for WebError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_stderr_sentence_is_not_doubled() {
        let err = ControllerError::Analysis(AnalysisError::EngineFailed {
            code: Some(4),
            stderr: "tshark: \"((\" was unexpected in this context.\n".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Analysis failed: tshark exited with code 4: tshark: \"((\" was unexpected in this context. Check the display filter and field names."
        );
    }

    #[test]
    fn spawn_failure_message_has_next_step() {
        let err = ControllerError::from(CaptureError::SpawnFailed("/usr/bin/tshark: denied.".into()));
        let message = err.to_string();
        assert!(!message.contains(".."));
        assert!(message.ends_with("Check the interface name and capture privileges."));
    }
}
