use crate::analysis::{trim, AnalysisInvoker, AnalysisRequest};
use crate::configuration::types::{AnalysisParameters, CaptureParameters};
use crate::error_handling::types::{AnalysisError, CaptureError, ControllerError};
use crate::process_management::{CaptureController, CaptureRequest, StopOutcome};
use crate::session_management::active_session::ActiveCapture;
use crate::session_management::session::CaptureSession;
use crate::session_management::session_registry::SessionRegistry;
use chrono::Utc;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Upper bound on the wait for a capture file to stop growing.
pub const FILE_SETTLE_LIMIT: Duration = Duration::from_secs(1);
const FILE_SETTLE_INTERVAL: Duration = Duration::from_millis(250);

/// The structure related to capture session management
///
/// This structure starts background captures and turns a stop request into
/// analysis output.
///
/// # Fields Overview
///
/// - `registry`: the shared map of known sessions, also updated by process supervisors
/// - `controller`: spawns and terminates capture processes
/// - `invoker`: decodes the capture file once a session is stopped
/// - `capture_dir`: directory receiving the per-session capture files
pub struct SessionManager {
    registry: Arc<SessionRegistry>,
    controller: CaptureController,
    invoker: Arc<AnalysisInvoker>,
    capture_dir: PathBuf,
}

impl SessionManager {
    pub fn new(
        controller: CaptureController,
        invoker: Arc<AnalysisInvoker>,
        capture_dir: PathBuf,
    ) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new()),
            controller,
            invoker,
            capture_dir,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Starts a background capture and returns the registered session.
    ///
    /// The session id is `name` when one is given, otherwise a generated one.
    /// The id is registered before the engine is spawned, so a duplicate never
    /// starts a process; a spawn failure unregisters it again.
    pub fn start_session(
        &self,
        name: Option<&str>,
        parameters: CaptureParameters,
    ) -> Result<CaptureSession, CaptureError> {
        let id = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => generate_session_id(),
        };
        let temp_file = self.capture_file_for(&id);
        let session = CaptureSession::new(id.clone(), &parameters, temp_file.clone());
        self.registry.register(ActiveCapture::new(session.clone()))?;

        let request = CaptureRequest {
            session_id: id.clone(),
            parameters,
            output_file: temp_file,
        };
        match self.controller.start(&request, Arc::clone(&self.registry)) {
            Ok(process) => {
                if let Err(mut orphan) = self.registry.attach_process(&id, process) {
                    warn!(
                        "Session {} was stopped or ended before its capture was attached, terminating pid {:?}",
                        id, orphan.pid
                    );
                    orphan.request_termination();
                }
                info!("Capture session {} started on {}", id, session.interface);
                Ok(session)
            }
            Err(e) => {
                // frees the id for a retry
                let _ = self.registry.remove(&id);
                Err(e)
            }
        }
    }

    pub fn get(&self, id: &str) -> Result<CaptureSession, ControllerError> {
        Ok(self.registry.get(id)?)
    }

    pub fn list(&self) -> Vec<CaptureSession> {
        self.registry.list()
    }

    /// Stops a session, analyzes what it captured and returns the report.
    ///
    /// Only the first of several concurrent stops of one id proceeds; the others
    /// are told the session does not exist. The session leaves the registry
    /// before analysis starts, so its id is reusable whatever the analysis
    /// outcome. A missing or empty capture file
    /// is reported as `NoResults` and left in place.
    pub async fn stop_and_retrieve(
        &self,
        id: &str,
        parameters: AnalysisParameters,
    ) -> Result<String, ControllerError> {
        let (session, process) = self.registry.begin_stop(id)?;

        let outcome = self.controller.stop(&session, process).await;
        debug!("Stop of session {} ended with {:?}", id, outcome);

        let removed = self.registry.remove(id)?;
        let session = removed.session;
        let path = session.temp_file.clone();

        let size = tokio::fs::metadata(&path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if size == 0 {
            warn!(
                "Capture session {} left no data in {}",
                id,
                path.display()
            );
            return Err(ControllerError::NoResults {
                session_id: id.to_string(),
                path,
            });
        }
        wait_for_stable_size(&path, size).await;

        let format = parameters.output_format;
        let request = AnalysisRequest::new(path.clone(), &parameters);
        let raw = match self.invoker.analyze(&request).await {
            Ok(raw) => raw,
            Err(AnalysisError::FileNotFound(_)) | Err(AnalysisError::Unreadable(_, _)) => {
                return Err(ControllerError::NoResults {
                    session_id: id.to_string(),
                    path,
                });
            }
            Err(e) => {
                warn!(
                    "Analysis of session {} failed, capture kept at {}",
                    id,
                    path.display()
                );
                return Err(e.into());
            }
        };
        let output = trim(raw, format);

        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("Failed to delete capture file {}: {}", path.display(), e);
        }

        Ok(render_report(&session, &outcome, &output))
    }

    fn capture_file_for(&self, id: &str) -> PathBuf {
        let suffix = Uuid::new_v4().simple().to_string();
        self.capture_dir
            .join(format!("{}-{}.pcapng", sanitize(id), &suffix[..8]))
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        let remaining = self.registry.list();
        if !remaining.is_empty() {
            let ids: Vec<&str> = remaining.iter().map(|s| s.id.as_str()).collect();
            warn!(
                "SessionManager dropped with {} session(s) still registered: {:?}",
                ids.len(),
                ids
            );
        }
    }
}

/// `capture_<unix millis>_<8 hex chars>`
pub fn generate_session_id() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("capture_{}_{}", Utc::now().timestamp_millis(), &random[..8])
}

/// Maps an id onto characters safe in a file name.
pub fn sanitize(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect();
    if cleaned.is_empty() {
        "session".to_string()
    } else {
        cleaned
    }
}

/// Polls the file size until two readings agree or [`FILE_SETTLE_LIMIT`] elapses.
async fn wait_for_stable_size(path: &Path, mut last: u64) -> u64 {
    let deadline = tokio::time::Instant::now() + FILE_SETTLE_LIMIT;
    while tokio::time::Instant::now() < deadline {
        tokio::time::sleep(FILE_SETTLE_INTERVAL).await;
        let current = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(last);
        if current == last {
            debug!("{} settled at {} bytes", path.display(), current);
            return current;
        }
        last = current;
    }
    debug!("{} still growing after {:?}", path.display(), FILE_SETTLE_LIMIT);
    last
}

fn render_report(session: &CaptureSession, outcome: &StopOutcome, output: &str) -> String {
    let ended = session.end_time.unwrap_or_else(Utc::now);
    let seconds = (ended - session.start_time).num_milliseconds() as f64 / 1000.0;

    let mut report = format!(
        "Capture session '{}' stopped\nInterface: {}\n",
        session.id, session.interface
    );
    if let Some(filter) = &session.capture_filter {
        report.push_str(&format!("Capture filter: {}\n", filter));
    }
    report.push_str(&format!("Status: {}", session.status));
    if let Some(code) = session.exit_code {
        report.push_str(&format!(" (exit code {})", code));
    }
    report.push_str(&format!("\nDuration: {:.1}s\n", seconds));
    if *outcome == StopOutcome::GracePeriodExpired {
        report.push_str("Note: the capture process did not exit within the grace period\n");
    }
    report.push('\n');
    if output.trim().is_empty() {
        report.push_str("No packets matched.");
    } else {
        report.push_str(output);
    }
    report
}
