use crate::error_handling::types::ConfigError;
use clap::Parser;
use log::{debug, warn};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

/// Application configuration structure that defines all runtime parameters.
///
/// It derives both `clap::Parser` and `serde::Deserialize`, so the same structure
/// is filled either from command-line flags or from a TOML file.
///
/// # Fields Overview
///
/// - `bind_address` / `port`: where the HTTP API listens
/// - `tshark_path`: explicit engine location, searched for when absent
/// - `config_store_path`: JSON document holding the named configurations
/// - `temp_dir`: directory receiving capture files of running sessions
/// - `default_interface`: interface used when a start request names none
/// - `keylog_file`: process-wide TLS key log used when a request names none
#[derive(Parser, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP API binds to.
    #[arg(long, default_value = "127.0.0.1")]
    pub bind_address: IpAddr,

    /// Port the HTTP API listens on.
    #[arg(long, default_value_t = 8765)]
    pub port: u16,

    /// Path to the tshark executable.
    #[arg(long)]
    pub tshark_path: Option<PathBuf>,

    /// JSON file storing named filter configurations.
    #[arg(long, default_value = "wiretap-configs.json")]
    pub config_store_path: PathBuf,

    /// Directory for temporary capture files. Defaults to the system temp dir.
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,

    /// Interface captured when a request does not name one.
    #[arg(long, default_value = "any")]
    pub default_interface: String,

    /// TLS key log file used to decrypt traffic during analysis.
    #[arg(long, env = "SSLKEYLOGFILE")]
    pub keylog_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8765,
            tshark_path: None,
            config_store_path: PathBuf::from("wiretap-configs.json"),
            temp_dir: None,
            default_interface: String::from("any"),
            keylog_file: None,
        }
    }
}

impl Config {
    /// Reads a TOML file. Keys missing from the file take their default value.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::TomlError(e.to_string()))
    }

    /// Directory where capture files are written.
    pub fn capture_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue(String::from(
                "port must be between 1 and 65535",
            )));
        }
        if self.default_interface.trim().is_empty() {
            return Err(ConfigError::InvalidValue(String::from(
                "default_interface must not be empty",
            )));
        }
        let capture_dir = self.capture_dir();
        if !capture_dir.is_dir() {
            return Err(ConfigError::DirectoryDoesNotExist(format!(
                "capture directory {} does not exist",
                capture_dir.display()
            )));
        }
        if let Some(keylog) = &self.keylog_file {
            if !keylog.is_file() {
                warn!(
                    "TLS key log file {} does not exist yet; decryption will be skipped until it does",
                    keylog.display()
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_from_args() {
        std::env::remove_var("SSLKEYLOGFILE");
        let config = Config::try_parse_from([
            "wiretap",
            "--bind-address",
            "0.0.0.0",
            "--port",
            "9000",
            "--default-interface",
            "lo",
        ])
        .unwrap_or_else(|e| panic!("{}", e));

        assert_eq!(config.bind_address, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.port, 9000);
        assert_eq!(config.default_interface, "lo");
        assert_eq!(config.config_store_path, PathBuf::from("wiretap-configs.json"));
        assert_eq!(config.keylog_file, None);
    }

    #[test]
    #[serial]
    fn keylog_file_falls_back_to_environment() {
        std::env::set_var("SSLKEYLOGFILE", "/tmp/keys.log");
        let config = Config::try_parse_from(["wiretap"]).unwrap();
        std::env::remove_var("SSLKEYLOGFILE");

        assert_eq!(config.keylog_file, Some(PathBuf::from("/tmp/keys.log")));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
            port = 9100
            tshark_path = "/opt/wireshark/tshark"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.tshark_path, Some(PathBuf::from("/opt/wireshark/tshark")));
        assert_eq!(config.default_interface, "any");
        assert_eq!(config.bind_address, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn invalid_toml_is_reported() {
        let err = Config::from_toml_str("port = \"not a number\"").unwrap_err();
        assert!(matches!(err, ConfigError::TomlError(_)));
    }

    #[test]
    fn validate_rejects_missing_capture_dir() {
        let config = Config {
            temp_dir: Some(PathBuf::from("/definitely/not/here")),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DirectoryDoesNotExist(_))
        ));
    }

    #[test]
    fn validate_accepts_existing_capture_dir() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            temp_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.capture_dir(), dir.path());
    }
}
