//! Request and response types of the exposed operations.
//!
//! Requests deserialize from camelCase JSON; every optional parameter may be
//! omitted and then takes its default or the stored configuration's value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::configuration::types::{FilterConfiguration, OutputFormat};
use crate::session_management::session::CaptureSession;
use crate::storage::types::{ConfigDocument, ConfigSummary};
use crate::SessionStatus;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartCaptureRequest {
    pub interface: Option<String>,
    pub capture_filter: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_packets: Option<u64>,
    pub session_name: Option<String>,
    pub config_name: Option<String>,
}

/// Analysis options shared by stop and file-analysis requests.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisOptions {
    pub display_filter: Option<String>,
    pub output_format: Option<OutputFormat>,
    pub custom_fields: Option<String>,
    pub decryption_key_file: Option<PathBuf>,
    pub config_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopCaptureRequest {
    pub session_id: String,
    #[serde(flatten)]
    pub options: AnalysisOptions,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeFileRequest {
    pub file_path: PathBuf,
    #[serde(flatten)]
    pub options: AnalysisOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigAction {
    Save,
    Load,
    List,
    View,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManageConfigRequest {
    pub action: ConfigAction,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub config: Option<FilterConfiguration>,
    #[serde(default)]
    pub detailed: bool,
}

/// A session that was just started, with the parameters it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedSession {
    pub session_id: String,
    pub interface: String,
    pub capture_filter: Option<String>,
    pub timeout_seconds: u64,
    pub max_packets: u64,
    pub start_time: DateTime<Utc>,
    pub status: SessionStatus,
}

impl From<&CaptureSession> for StartedSession {
    fn from(session: &CaptureSession) -> Self {
        Self {
            session_id: session.id.clone(),
            interface: session.interface.clone(),
            capture_filter: session.capture_filter.clone(),
            timeout_seconds: session.timeout_seconds,
            max_packets: session.max_packets,
            start_time: session.start_time,
            status: session.status,
        }
    }
}

impl StartedSession {
    pub fn summary(&self) -> String {
        let mut text = format!(
            "Capture session '{}' started on interface {}\n",
            self.session_id, self.interface
        );
        if let Some(filter) = &self.capture_filter {
            text.push_str(&format!("Capture filter: {}\n", filter));
        }
        text.push_str(&format!(
            "Stops after {}s or {} packets, whichever comes first.\nUse stop_capture_session with sessionId '{}' to retrieve the results.",
            self.timeout_seconds, self.max_packets, self.session_id
        ));
        text
    }
}

/// Result of a configuration management action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ConfigResponse {
    Saved {
        name: String,
    },
    Loaded {
        name: String,
        config: FilterConfiguration,
    },
    Listed {
        configs: Vec<ConfigSummary>,
    },
    Document {
        document: ConfigDocument,
    },
    Deleted {
        name: String,
    },
}

impl ConfigResponse {
    pub fn summary(&self) -> String {
        match self {
            ConfigResponse::Saved { name } => format!("Configuration '{}' saved.", name),
            ConfigResponse::Loaded { name, config } => format!(
                "Configuration '{}':\n{}",
                name,
                serde_json::to_string_pretty(config).unwrap_or_default()
            ),
            ConfigResponse::Listed { configs } if configs.is_empty() => {
                "No saved configurations.".to_string()
            }
            ConfigResponse::Listed { configs } => {
                let mut text = format!("{} saved configuration(s):", configs.len());
                for entry in configs {
                    match &entry.description {
                        Some(description) => {
                            text.push_str(&format!("\n- {}: {}", entry.name, description))
                        }
                        None => text.push_str(&format!("\n- {}", entry.name)),
                    }
                }
                text
            }
            ConfigResponse::Document { document } => {
                serde_json::to_string_pretty(document).unwrap_or_default()
            }
            ConfigResponse::Deleted { name } => format!("Configuration '{}' deleted.", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stop_request_flattens_analysis_options() {
        let request: StopCaptureRequest = serde_json::from_value(json!({
            "sessionId": "s1",
            "displayFilter": "dns",
            "outputFormat": "fields",
            "customFields": "ip.src,dns.qry.name",
            "decryptionKeyFile": "/keys.log"
        }))
        .unwrap();

        assert_eq!(request.session_id, "s1");
        assert_eq!(request.options.display_filter.as_deref(), Some("dns"));
        assert_eq!(request.options.output_format, Some(OutputFormat::Fields));
        assert_eq!(
            request.options.decryption_key_file,
            Some(PathBuf::from("/keys.log"))
        );
        assert_eq!(request.options.config_name, None);
    }

    #[test]
    fn start_request_fields_are_all_optional() {
        let request: StartCaptureRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(request, StartCaptureRequest::default());
    }

    #[test]
    fn manage_config_request_parses_action() {
        let request: ManageConfigRequest = serde_json::from_value(json!({
            "action": "save",
            "name": "x",
            "config": { "timeout": 30 }
        }))
        .unwrap();
        assert_eq!(request.action, ConfigAction::Save);
        assert_eq!(request.config.unwrap().timeout, Some(30));
        assert!(!request.detailed);

        assert!(serde_json::from_value::<ManageConfigRequest>(json!({ "action": "purge" })).is_err());
    }

    #[test]
    fn listing_summary_names_each_configuration() {
        let response = ConfigResponse::Listed {
            configs: vec![
                ConfigSummary {
                    name: "dns".into(),
                    description: Some("DNS only".into()),
                },
                ConfigSummary {
                    name: "web".into(),
                    description: None,
                },
            ],
        };
        assert_eq!(
            response.summary(),
            "2 saved configuration(s):\n- dns: DNS only\n- web"
        );
        assert_eq!(
            ConfigResponse::Listed { configs: vec![] }.summary(),
            "No saved configurations."
        );
    }
}
