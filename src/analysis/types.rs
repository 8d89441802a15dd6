use std::path::PathBuf;

use crate::configuration::types::{AnalysisParameters, OutputFormat};

/// Fields extracted in `fields` mode when the caller names none.
pub const DEFAULT_FIELDS: [&str; 6] = [
    "frame.number",
    "frame.time_relative",
    "ip.src",
    "ip.dst",
    "tcp.srcport",
    "tcp.dstport",
];

/// One analysis run over an existing capture file.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub file: PathBuf,
    pub display_filter: Option<String>,
    pub output_format: OutputFormat,
    /// Comma separated field names, only used in `fields` mode.
    pub custom_fields: Option<String>,
    pub keylog_file: Option<PathBuf>,
}

impl AnalysisRequest {
    pub fn new(file: PathBuf, parameters: &AnalysisParameters) -> Self {
        Self {
            file,
            display_filter: parameters.display_filter.clone(),
            output_format: parameters.output_format,
            custom_fields: parameters.custom_fields.clone(),
            keylog_file: parameters.keylog_file.clone(),
        }
    }

    /// The ordered field list for `fields` mode.
    pub fn field_list(&self) -> Vec<String> {
        let custom: Vec<String> = self
            .custom_fields
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(String::from)
            .collect();
        if custom.is_empty() {
            DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect()
        } else {
            custom
        }
    }
}
