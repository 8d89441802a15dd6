use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::error_handling::types::EngineError;

const EXECUTABLE_NAME: &str = "tshark";

#[cfg(target_os = "macos")]
const WELL_KNOWN_LOCATIONS: &[&str] = &[
    "/Applications/Wireshark.app/Contents/MacOS/tshark",
    "/opt/homebrew/bin/tshark",
    "/usr/local/bin/tshark",
];

#[cfg(target_os = "windows")]
const WELL_KNOWN_LOCATIONS: &[&str] = &[
    "C:\\Program Files\\Wireshark\\tshark.exe",
    "C:\\Program Files (x86)\\Wireshark\\tshark.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const WELL_KNOWN_LOCATIONS: &[&str] = &["/usr/bin/tshark", "/usr/local/bin/tshark", "/usr/sbin/tshark"];

/// Resolves the tshark executable.
///
/// Candidates are tried in order: the explicit path, `tshark` on `PATH`, then
/// the platform's usual install locations. A candidate is accepted when
/// `<candidate> --version` exits successfully.
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, EngineError> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(path) = explicit {
        candidates.push(path.to_path_buf());
    }
    candidates.push(PathBuf::from(EXECUTABLE_NAME));
    candidates.extend(WELL_KNOWN_LOCATIONS.iter().map(PathBuf::from));

    for candidate in &candidates {
        if is_usable(candidate) {
            info!("Using tshark at {}", candidate.display());
            return Ok(candidate.clone());
        }
    }

    Err(EngineError::ExecutableNotFound(candidates))
}

fn is_usable(candidate: &Path) -> bool {
    let usable = std::process::Command::new(candidate)
        .arg("--version")
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false);

    debug!("tshark candidate {}: usable={}", candidate.display(), usable);
    usable
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn explicit_path_is_preferred() {
        let engine = crate::test_support::fake_engine();

        assert_eq!(locate(Some(&engine)).unwrap(), engine);
    }

    #[test]
    fn unusable_explicit_path_is_listed_in_error() {
        let bogus = PathBuf::from("/nonexistent/wiretap/tshark");
        match locate(Some(&bogus)) {
            Ok(found) => assert_ne!(found, bogus),
            Err(EngineError::ExecutableNotFound(tried)) => {
                assert_eq!(tried.first(), Some(&bogus));
                assert!(tried.contains(&PathBuf::from(EXECUTABLE_NAME)));
            }
        }
    }
}
