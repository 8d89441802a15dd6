use crate::error_handling::types::SessionError;
use crate::process_management::CaptureProcess;
use crate::session_management::active_session::ActiveCapture;
use crate::session_management::session::CaptureSession;
use crate::SessionStatus;
use chrono::Utc;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// The authority on which capture sessions exist and what state they are in.
///
/// Every operation takes the same lock, so a status change made by a process
/// observer is visible to the next `get` from any other task. The lock is never
/// held across an await point.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, ActiveCapture>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ActiveCapture>> {
        // a panicking holder cannot leave the map half-updated
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers a new session. Fails if the id is already present, whatever
    /// the status of the existing session.
    pub fn register(&self, active: ActiveCapture) -> Result<(), SessionError> {
        let mut sessions = self.lock();
        let id = active.session.id.clone();
        if sessions.contains_key(&id) {
            debug!("Rejecting duplicate session id {}", id);
            return Err(SessionError::Duplicate(id));
        }
        sessions.insert(id.clone(), active);
        debug!("Registered session {} ({} active)", id, sessions.len());
        Ok(())
    }

    /// Returns a snapshot of the session.
    pub fn get(&self, id: &str) -> Result<CaptureSession, SessionError> {
        self.lock()
            .get(id)
            .map(|active| active.session.clone())
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// Removes the session. Of two concurrent removals of the same id, only the
    /// first succeeds.
    pub fn remove(&self, id: &str) -> Result<ActiveCapture, SessionError> {
        let removed = self
            .lock()
            .remove(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        info!("Removed session {} from the registry", id);
        Ok(removed)
    }

    /// Hands a freshly spawned process to its session.
    ///
    /// The process is given back when the session is gone, already claimed by
    /// a stop request, or already finished; the caller must then terminate it.
    pub fn attach_process(
        &self,
        id: &str,
        process: CaptureProcess,
    ) -> Result<(), CaptureProcess> {
        match self.lock().get_mut(id) {
            Some(active)
                if active.session.status == SessionStatus::Running && !active.stopping =>
            {
                active.process = Some(process);
                Ok(())
            }
            Some(_) => {
                debug!(
                    "Session {} was stopped or finished before its process was attached",
                    id
                );
                Err(process)
            }
            None => Err(process),
        }
    }

    /// Claims the session for a stop request.
    ///
    /// Returns the session snapshot and its process handle, leaving `None`
    /// behind. Only one stop can claim a session; any later one is told the
    /// session does not exist.
    pub fn begin_stop(
        &self,
        id: &str,
    ) -> Result<(CaptureSession, Option<CaptureProcess>), SessionError> {
        let mut sessions = self.lock();
        let active = match sessions.get_mut(id) {
            Some(active) if !active.stopping => active,
            Some(_) => {
                debug!("Session {} is already being stopped", id);
                return Err(SessionError::NotFound(id.to_string()));
            }
            None => return Err(SessionError::NotFound(id.to_string())),
        };
        active.stopping = true;
        Ok((active.session.clone(), active.process.take()))
    }

    /// Records the observed exit of the session's process.
    ///
    /// Only the first observation is kept; a no-op when the session has already
    /// been removed.
    pub fn record_exit(&self, id: &str, exit_code: Option<i32>) -> bool {
        let mut sessions = self.lock();
        let Some(active) = sessions.get_mut(id) else {
            debug!("Exit of {} observed after removal, ignoring", id);
            return false;
        };
        if active.session.status != SessionStatus::Running {
            return false;
        }
        active.session.end_time = Some(Utc::now());
        active.session.exit_code = exit_code;
        active.session.status = if exit_code == Some(0) {
            SessionStatus::Completed
        } else {
            SessionStatus::Error
        };
        active.process = None;
        info!(
            "Capture {} exited with code {:?} ({})",
            id, exit_code, active.session.status
        );
        true
    }

    /// Records a process-level failure; the session ends in `Error` whatever
    /// the exit code.
    pub fn record_error(&self, id: &str, message: String) -> bool {
        let mut sessions = self.lock();
        let Some(active) = sessions.get_mut(id) else {
            debug!("Process error for {} observed after removal, ignoring", id);
            return false;
        };
        if active.session.status != SessionStatus::Running {
            return false;
        }
        active.session.end_time = Some(Utc::now());
        active.session.status = SessionStatus::Error;
        active.session.error_message = Some(message);
        active.process = None;
        info!("Capture {} failed at process level", id);
        true
    }

    /// Snapshots of every registered session, oldest first.
    pub fn list(&self) -> Vec<CaptureSession> {
        let mut sessions: Vec<CaptureSession> = self
            .lock()
            .values()
            .map(|active| active.session.clone())
            .collect();
        sessions.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        sessions
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
