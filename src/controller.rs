//! Operation surface of the service.
//!
//! [`Controller`] wires the configuration store, the session manager and the
//! analysis invoker together and exposes the capture, analysis and
//! configuration operations to the HTTP API.

pub mod controller_handler;
pub mod types;

pub use controller_handler::Controller;
pub use types::{
    AnalysisOptions, AnalyzeFileRequest, ConfigAction, ConfigResponse, ManageConfigRequest,
    StartCaptureRequest, StartedSession, StopCaptureRequest,
};
