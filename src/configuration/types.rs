//! Parameter types shared by captures, analyses and the named-configuration store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
pub const DEFAULT_MAX_PACKETS: u64 = 100_000;

/// Rendering mode requested from the analysis engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Fields,
    #[default]
    Text,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Fields => "fields",
            OutputFormat::Text => "text",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "fields" => Ok(OutputFormat::Fields),
            "text" => Ok(OutputFormat::Text),
            other => Err(format!(
                "unknown output format '{}' (expected json, fields or text)",
                other
            )),
        }
    }
}

/// A named, persisted bundle of capture and analysis parameters.
///
/// Every field is optional: only the fields present are applied as overrides,
/// and absent fields are not written back when the configuration is saved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_packets: Option<u64>,
}

/// Capture-time parameters, frozen once a session starts.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureParameters {
    pub interface: String,
    pub capture_filter: Option<String>,
    pub timeout_seconds: u64,
    pub max_packets: u64,
}

impl CaptureParameters {
    /// Applies a stored configuration: each field it carries replaces the caller's value.
    pub fn with_overrides(mut self, config: &FilterConfiguration) -> Self {
        if let Some(interface) = &config.interface {
            self.interface = interface.clone();
        }
        if let Some(filter) = &config.capture_filter {
            self.capture_filter = Some(filter.clone());
        }
        if let Some(timeout) = config.timeout {
            self.timeout_seconds = timeout;
        }
        if let Some(max_packets) = config.max_packets {
            self.max_packets = max_packets;
        }
        self
    }
}

/// Analysis-time parameters supplied with a stop or analyze request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisParameters {
    pub display_filter: Option<String>,
    pub output_format: OutputFormat,
    pub custom_fields: Option<String>,
    pub keylog_file: Option<std::path::PathBuf>,
}

impl AnalysisParameters {
    /// Same precedence as [`CaptureParameters::with_overrides`]. The key file is
    /// never part of a stored configuration.
    pub fn with_overrides(mut self, config: &FilterConfiguration) -> Self {
        if let Some(filter) = &config.display_filter {
            self.display_filter = Some(filter.clone());
        }
        if let Some(format) = config.output_format {
            self.output_format = format;
        }
        if let Some(fields) = &config.custom_fields {
            self.custom_fields = Some(fields.clone());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller_capture() -> CaptureParameters {
        CaptureParameters {
            interface: "eth0".to_string(),
            capture_filter: Some("port 53".to_string()),
            timeout_seconds: 1,
            max_packets: 10,
        }
    }

    #[test]
    fn stored_field_wins_over_caller_field() {
        let stored = FilterConfiguration {
            timeout: Some(2),
            ..Default::default()
        };
        let resolved = caller_capture().with_overrides(&stored);
        assert_eq!(resolved.timeout_seconds, 2);
    }

    #[test]
    fn absent_stored_field_keeps_caller_value() {
        let stored = FilterConfiguration {
            timeout: Some(2),
            ..Default::default()
        };
        let resolved = caller_capture().with_overrides(&stored);
        assert_eq!(resolved.max_packets, 10);
        assert_eq!(resolved.interface, "eth0");
        assert_eq!(resolved.capture_filter.as_deref(), Some("port 53"));
    }

    #[test]
    fn analysis_overrides_follow_the_same_rule() {
        let caller = AnalysisParameters {
            display_filter: Some("dns".to_string()),
            output_format: OutputFormat::Text,
            custom_fields: Some("ip.src".to_string()),
            keylog_file: None,
        };
        let stored = FilterConfiguration {
            display_filter: Some("http".to_string()),
            output_format: Some(OutputFormat::Json),
            ..Default::default()
        };
        let resolved = caller.with_overrides(&stored);
        assert_eq!(resolved.display_filter.as_deref(), Some("http"));
        assert_eq!(resolved.output_format, OutputFormat::Json);
        assert_eq!(resolved.custom_fields.as_deref(), Some("ip.src"));
    }

    #[test]
    fn serialization_omits_absent_fields() {
        let config = FilterConfiguration {
            timeout: Some(30),
            ..Default::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json, serde_json::json!({ "timeout": 30 }));
    }

    #[test]
    fn output_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!(" fields ".parse::<OutputFormat>(), Ok(OutputFormat::Fields));
        assert!("pdml".parse::<OutputFormat>().is_err());
    }
}
