//! Core types used by the capture process subsystem.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::{oneshot, watch};

use crate::configuration::types::CaptureParameters;

/// How a capture process ended, as seen by its supervisor task.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// The process exited; `None` when it was killed by a signal.
    Exited(Option<i32>),
    /// Waiting on the process failed.
    Failed(String),
}

/// Everything needed to launch one capture.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub session_id: String,
    pub parameters: CaptureParameters,
    pub output_file: PathBuf,
}

/// What a stop request did to the capture process.
#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
    /// No process handle was left to act on.
    NoProcess,
    /// The process had already exited on its own.
    AlreadyFinished,
    /// Termination was requested and the process exited within the grace period.
    Terminated(ProcessOutcome),
    /// Termination was requested but the process outlived the grace period.
    GracePeriodExpired,
}

/// Handle to a running capture process.
///
/// The OS child itself is owned by a supervisor task; this handle can ask that
/// task to terminate the process and observe how it ended.
#[derive(Debug)]
pub struct CaptureProcess {
    /// OS process id at spawn time.
    pub pid: Option<u32>,
    terminate_tx: Option<oneshot::Sender<()>>,
    outcome_rx: watch::Receiver<Option<ProcessOutcome>>,
}

impl CaptureProcess {
    pub(crate) fn new(
        pid: Option<u32>,
        terminate_tx: oneshot::Sender<()>,
        outcome_rx: watch::Receiver<Option<ProcessOutcome>>,
    ) -> Self {
        Self {
            pid,
            terminate_tx: Some(terminate_tx),
            outcome_rx,
        }
    }

    pub fn has_exited(&self) -> bool {
        self.outcome_rx.borrow().is_some()
    }

    pub fn outcome(&self) -> Option<ProcessOutcome> {
        self.outcome_rx.borrow().clone()
    }

    /// Asks the supervisor to send a graceful termination signal. Returns
    /// `false` when a request was already made or the supervisor is gone.
    pub(crate) fn request_termination(&mut self) -> bool {
        match self.terminate_tx.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Waits at most `limit` for the process to end.
    pub(crate) async fn wait_for_exit(&mut self, limit: Duration) -> Option<ProcessOutcome> {
        match tokio::time::timeout(limit, self.outcome_rx.wait_for(|o| o.is_some())).await {
            Ok(Ok(outcome)) => outcome.clone(),
            _ => None,
        }
    }
}
