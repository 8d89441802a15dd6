use serde::Serialize;

/// API error payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    pub message: String,
}

/// Successful tool call: readable text plus the structured result, when there is one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResponse {
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResponse {
    pub fn text(output: String) -> Self {
        Self { output, data: None }
    }

    pub fn with_data<T: Serialize>(output: String, data: &T) -> Self {
        Self {
            output,
            data: serde_json::to_value(data).ok(),
        }
    }
}
