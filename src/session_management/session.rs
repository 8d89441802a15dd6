use crate::configuration::types::CaptureParameters;
use crate::SessionStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSession {
    pub id: String,
    pub interface: String,
    pub capture_filter: Option<String>,
    pub timeout_seconds: u64,
    pub max_packets: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub exit_code: Option<i32>,
    pub error_message: Option<String>,
    pub temp_file: PathBuf,
}

impl CaptureSession {
    pub fn new(id: String, parameters: &CaptureParameters, temp_file: PathBuf) -> Self {
        Self {
            id,
            interface: parameters.interface.clone(),
            capture_filter: parameters.capture_filter.clone(),
            timeout_seconds: parameters.timeout_seconds,
            max_packets: parameters.max_packets,
            start_time: Utc::now(),
            end_time: None,
            status: SessionStatus::Running,
            exit_code: None,
            error_message: None,
            temp_file,
        }
    }
}
