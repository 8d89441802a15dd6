use crate::process_management::CaptureProcess;
use crate::session_management::session::CaptureSession;

/// Represents a registered capture, containing the session state and the
/// handle of the capture process driving it.
pub struct ActiveCapture {
    /// The session metadata and state.
    pub session: CaptureSession,
    /// Handle to the capture process; `None` before the process is attached,
    /// once its exit has been observed, or after a stop request took it.
    pub process: Option<CaptureProcess>,
    /// Set once a stop request has claimed the session.
    pub stopping: bool,
}

impl ActiveCapture {
    pub fn new(session: CaptureSession) -> Self {
        Self {
            session,
            process: None,
            stopping: false,
        }
    }
}
