// Web Interface module root
pub mod routes;
pub mod types;
pub mod web_server;

// Re-export commonly used items
pub use routes::error_status;
pub use types::{ApiError, ToolResponse};
pub use web_server::WebServer;
