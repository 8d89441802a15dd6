use log::{debug, error, info, warn};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{oneshot, watch};

use crate::error_handling::types::CaptureError;
use crate::process_management::types::{
    CaptureProcess, CaptureRequest, ProcessOutcome, StopOutcome,
};
use crate::session_management::session::CaptureSession;
use crate::session_management::session_registry::SessionRegistry;
use crate::SessionStatus;

/// Time given to a capture process to flush its file and exit after the
/// termination signal. Stop proceeds once it elapses, whether or not the
/// process has exited.
pub const TERMINATION_GRACE: Duration = Duration::from_secs(2);

/// Starts, observes and stops capture processes, one per session.
///
/// Design notes:
/// - The engine writes raw capture data to the session's private file and
///   stops by itself on its duration or packet-count condition.
/// - Processes run in their own process group and are not killed when the
///   handle is dropped, so they outlive a restart of this server.
/// - Termination is a single graceful signal followed by a bounded wait; the
///   process is never killed forcibly.
pub struct CaptureController {
    engine: PathBuf,
}

impl CaptureController {
    pub fn new(engine: PathBuf) -> Self {
        Self { engine }
    }

    /// Launches the capture engine for `request` and returns without waiting on it.
    ///
    /// Side effects:
    /// - Spawns the engine writing to `request.output_file`.
    /// - Forwards the engine's stderr to the debug log.
    /// - Starts a supervisor task that records the process exit (or process
    ///   error) in `registry` exactly once.
    pub fn start(
        &self,
        request: &CaptureRequest,
        registry: Arc<SessionRegistry>,
    ) -> Result<CaptureProcess, CaptureError> {
        let args = capture_arguments(request);
        debug!(
            "Spawning capture for session {}: {} {:?}",
            request.session_id,
            self.engine.display(),
            args
        );

        let mut std_cmd = std::process::Command::new(&self.engine);
        std_cmd
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_cmd.process_group(0);
        }
        let mut cmd = Command::from(std_cmd);
        cmd.kill_on_drop(false);

        let mut child = cmd.spawn().map_err(|e| {
            error!(
                "Failed to spawn capture for session {}: {}",
                request.session_id, e
            );
            CaptureError::SpawnFailed(format!("{}: {}", self.engine.display(), e))
        })?;
        let pid = child.id();

        if let Some(stderr) = child.stderr.take() {
            let mut reader = BufReader::new(stderr).lines();
            let sid = request.session_id.clone();
            tokio::spawn(async move {
                while let Ok(Some(line)) = reader.next_line().await {
                    debug!("[tshark:{}][stderr] {}", sid, line);
                }
            });
        }

        let (terminate_tx, terminate_rx) = oneshot::channel();
        let (outcome_tx, outcome_rx) = watch::channel(None);
        tokio::spawn(supervise(
            child,
            request.session_id.clone(),
            registry,
            terminate_rx,
            outcome_tx,
        ));

        info!(
            "Started capture for session {} on {} (pid {:?}) writing to {}",
            request.session_id,
            request.parameters.interface,
            pid,
            request.output_file.display()
        );
        Ok(CaptureProcess::new(pid, terminate_tx, outcome_rx))
    }

    /// Stops the capture process of `session`, if it is still running.
    ///
    /// Sends the graceful termination signal and waits up to
    /// [`TERMINATION_GRACE`] for the process to exit. A process that outlives the
    /// grace period is left running and the caller proceeds anyway. Removing the
    /// session from the registry is the caller's job.
    pub async fn stop(
        &self,
        session: &CaptureSession,
        process: Option<CaptureProcess>,
    ) -> StopOutcome {
        let Some(mut process) = process else {
            debug!("Session {} has no process left to stop", session.id);
            return StopOutcome::NoProcess;
        };

        if session.status != SessionStatus::Running || process.has_exited() {
            debug!(
                "Capture for session {} already finished ({:?})",
                session.id,
                process.outcome()
            );
            return StopOutcome::AlreadyFinished;
        }

        if !process.request_termination() {
            // the supervisor is gone, so the process has been reaped
            return StopOutcome::AlreadyFinished;
        }

        match process.wait_for_exit(TERMINATION_GRACE).await {
            Some(outcome) => {
                info!("Capture for session {} terminated: {:?}", session.id, outcome);
                StopOutcome::Terminated(outcome)
            }
            None => {
                warn!(
                    "Capture for session {} (pid {:?}) did not exit within {:?}, proceeding anyway",
                    session.id, process.pid, TERMINATION_GRACE
                );
                StopOutcome::GracePeriodExpired
            }
        }
    }
}

/// Builds the engine command line for a live capture.
///
/// A zero timeout or packet limit drops the corresponding stop condition.
pub fn capture_arguments(request: &CaptureRequest) -> Vec<OsString> {
    let parameters = &request.parameters;
    let mut args: Vec<OsString> = vec![
        "-i".into(),
        parameters.interface.clone().into(),
        "-w".into(),
        request.output_file.clone().into_os_string(),
    ];
    if parameters.timeout_seconds > 0 {
        args.push("-a".into());
        args.push(format!("duration:{}", parameters.timeout_seconds).into());
    }
    if parameters.max_packets > 0 {
        args.push("-c".into());
        args.push(parameters.max_packets.to_string().into());
    }
    if let Some(filter) = parameters.capture_filter.as_deref() {
        args.push("-f".into());
        args.push(filter.into());
    }
    args.push("-q".into());
    args
}

/// Owns the child until it ends, then publishes how it ended.
async fn supervise(
    mut child: Child,
    session_id: String,
    registry: Arc<SessionRegistry>,
    mut terminate_rx: oneshot::Receiver<()>,
    outcome_tx: watch::Sender<Option<ProcessOutcome>>,
) {
    let waited = tokio::select! {
        status = child.wait() => status,
        Ok(()) = &mut terminate_rx => {
            send_termination_signal(&session_id, child.id());
            child.wait().await
        }
    };

    let outcome = match waited {
        Ok(status) => {
            let code = status.code();
            registry.record_exit(&session_id, code);
            ProcessOutcome::Exited(code)
        }
        Err(e) => {
            error!("Waiting on capture for session {} failed: {}", session_id, e);
            registry.record_error(&session_id, e.to_string());
            ProcessOutcome::Failed(e.to_string())
        }
    };
    // nobody listening once the handle is dropped
    let _ = outcome_tx.send(Some(outcome));
}

#[cfg(unix)]
fn send_termination_signal(session_id: &str, pid: Option<u32>) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid else {
        debug!("Capture for session {} already reaped", session_id);
        return;
    };
    match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        Ok(()) => debug!("Sent SIGTERM to capture {} (pid {})", session_id, pid),
        Err(e) => warn!(
            "Failed to signal capture {} (pid {}): {}",
            session_id, pid, e
        ),
    }
}

#[cfg(not(unix))]
fn send_termination_signal(session_id: &str, pid: Option<u32>) {
    warn!(
        "Graceful termination is not supported on this platform; capture {} (pid {:?}) keeps running until its own stop condition",
        session_id, pid
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::types::CaptureParameters;

    fn request(filter: Option<&str>, timeout: u64, max_packets: u64) -> CaptureRequest {
        CaptureRequest {
            session_id: "s1".into(),
            parameters: CaptureParameters {
                interface: "eth0".into(),
                capture_filter: filter.map(String::from),
                timeout_seconds: timeout,
                max_packets,
            },
            output_file: PathBuf::from("/tmp/s1.pcapng"),
        }
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn capture_arguments_carry_both_stop_conditions() {
        let args = strings(capture_arguments(&request(Some("tcp port 443"), 60, 100)));
        assert_eq!(
            args,
            vec![
                "-i", "eth0", "-w", "/tmp/s1.pcapng", "-a", "duration:60", "-c", "100", "-f",
                "tcp port 443", "-q"
            ]
        );
    }

    #[test]
    fn zero_limits_are_omitted() {
        let args = strings(capture_arguments(&request(None, 0, 0)));
        assert_eq!(args, vec!["-i", "eth0", "-w", "/tmp/s1.pcapng", "-q"]);
    }
}
