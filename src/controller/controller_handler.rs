use log::debug;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::analysis::{trim, AnalysisInvoker, AnalysisRequest};
use crate::configuration::config::Config;
use crate::configuration::types::{
    AnalysisParameters, CaptureParameters, FilterConfiguration, DEFAULT_MAX_PACKETS,
    DEFAULT_TIMEOUT_SECONDS,
};
use crate::controller::types::{
    AnalysisOptions, AnalyzeFileRequest, ConfigAction, ConfigResponse, ManageConfigRequest,
    StartCaptureRequest, StartedSession, StopCaptureRequest,
};
use crate::engine::locator::locate;
use crate::error_handling::types::{AnalysisError, ControllerError, WebError};
use crate::process_management::CaptureController;
use crate::session_management::session::CaptureSession;
use crate::session_management::session_manager::SessionManager;
use crate::storage::{ConfigStore, FileConfigStore};
use crate::web_interface::web_server::WebServer;

/// Owns every long-lived component; cloned behind an `Arc` into the HTTP handlers.
pub struct Controller {
    pub config: Config,
    sessions: Arc<SessionManager>,
    store: Arc<dyn ConfigStore>,
    invoker: Arc<AnalysisInvoker>,
}

impl Controller {
    /// Builds the controller from the application configuration, locating the
    /// capture engine and opening the configuration store.
    pub fn new(config: Config) -> Result<Self, ControllerError> {
        let engine = locate(config.tshark_path.as_deref())?;
        let store: Arc<dyn ConfigStore> =
            Arc::new(FileConfigStore::new(&config.config_store_path));
        Ok(Self::with_parts(config, engine, store))
    }

    pub fn with_parts(config: Config, engine: PathBuf, store: Arc<dyn ConfigStore>) -> Self {
        let invoker = Arc::new(AnalysisInvoker::new(engine.clone()));
        let sessions = Arc::new(SessionManager::new(
            CaptureController::new(engine),
            Arc::clone(&invoker),
            config.capture_dir(),
        ));
        Self {
            config,
            sessions,
            store,
            invoker,
        }
    }

    /// Serves the HTTP API until the server stops.
    pub async fn run(self) -> Result<(), WebError> {
        let addr = SocketAddr::new(self.config.bind_address, self.config.port);
        WebServer::new(Arc::new(self), addr).start().await
    }

    /// Loads the named configuration, if a name was given.
    fn stored_overrides(
        &self,
        config_name: Option<&str>,
    ) -> Result<Option<FilterConfiguration>, ControllerError> {
        match config_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => {
                let config = self.store.load(name)?;
                debug!("Applying stored configuration '{}'", name);
                Ok(Some(config))
            }
            None => Ok(None),
        }
    }

    fn analysis_parameters(
        &self,
        options: &AnalysisOptions,
    ) -> Result<AnalysisParameters, ControllerError> {
        let parameters = AnalysisParameters {
            display_filter: options.display_filter.clone(),
            output_format: options.output_format.unwrap_or_default(),
            custom_fields: options.custom_fields.clone(),
            keylog_file: options
                .decryption_key_file
                .clone()
                .or_else(|| self.config.keylog_file.clone()),
        };
        Ok(match self.stored_overrides(options.config_name.as_deref())? {
            Some(stored) => parameters.with_overrides(&stored),
            None => parameters,
        })
    }

    pub fn start_capture_session(
        &self,
        request: StartCaptureRequest,
    ) -> Result<StartedSession, ControllerError> {
        let mut parameters = CaptureParameters {
            interface: request
                .interface
                .clone()
                .unwrap_or_else(|| self.config.default_interface.clone()),
            capture_filter: request.capture_filter.clone(),
            timeout_seconds: request.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            max_packets: request.max_packets.unwrap_or(DEFAULT_MAX_PACKETS),
        };
        if let Some(stored) = self.stored_overrides(request.config_name.as_deref())? {
            parameters = parameters.with_overrides(&stored);
        }
        if parameters.interface.trim().is_empty() {
            return Err(ControllerError::InvalidRequest(
                "interface must not be empty".to_string(),
            ));
        }

        let session = self
            .sessions
            .start_session(request.session_name.as_deref(), parameters)?;
        Ok(StartedSession::from(&session))
    }

    pub async fn stop_capture_session(
        &self,
        request: StopCaptureRequest,
    ) -> Result<String, ControllerError> {
        let session_id = request.session_id.trim();
        if session_id.is_empty() {
            return Err(ControllerError::InvalidRequest(
                "sessionId is required".to_string(),
            ));
        }
        self.sessions.get(session_id)?;
        // capture parameters are frozen at start, only analysis takes overrides
        let parameters = self.analysis_parameters(&request.options)?;
        self.sessions.stop_and_retrieve(session_id, parameters).await
    }

    /// Analyzes an existing capture file; sessions are not involved.
    pub async fn analyze_pcap_file(
        &self,
        request: AnalyzeFileRequest,
    ) -> Result<String, ControllerError> {
        if request.file_path.as_os_str().is_empty() {
            return Err(ControllerError::InvalidRequest(
                "filePath is required".to_string(),
            ));
        }
        let parameters = self.analysis_parameters(&request.options)?;
        if !request.file_path.exists() {
            return Err(AnalysisError::FileNotFound(request.file_path).into());
        }

        let format = parameters.output_format;
        let analysis = AnalysisRequest::new(request.file_path.clone(), &parameters);
        let output = trim(self.invoker.analyze(&analysis).await?, format);

        let mut report = format!(
            "Analysis of {} ({} output)\n\n",
            request.file_path.display(),
            format
        );
        if output.trim().is_empty() {
            report.push_str("No packets matched.");
        } else {
            report.push_str(&output);
        }
        Ok(report)
    }

    pub fn manage_config(
        &self,
        request: ManageConfigRequest,
    ) -> Result<ConfigResponse, ControllerError> {
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        let required = |action: &str| {
            name.map(String::from).ok_or_else(|| {
                ControllerError::InvalidRequest(format!("action '{}' requires a name", action))
            })
        };

        match request.action {
            ConfigAction::Save => {
                let name = required("save")?;
                let config = request.config.ok_or_else(|| {
                    ControllerError::InvalidRequest("action 'save' requires a config".to_string())
                })?;
                self.store.save(&name, &config)?;
                Ok(ConfigResponse::Saved { name })
            }
            ConfigAction::Load => {
                let name = required("load")?;
                let config = self.store.load(&name)?;
                Ok(ConfigResponse::Loaded { name, config })
            }
            ConfigAction::List if request.detailed => Ok(ConfigResponse::Document {
                document: self.store.document()?,
            }),
            ConfigAction::List => Ok(ConfigResponse::Listed {
                configs: self.store.list()?,
            }),
            ConfigAction::View => match name {
                Some(name) => {
                    let config = self.store.load(name)?;
                    Ok(ConfigResponse::Loaded {
                        name: name.to_string(),
                        config,
                    })
                }
                None => Ok(ConfigResponse::Document {
                    document: self.store.document()?,
                }),
            },
            ConfigAction::Delete => {
                let name = required("delete")?;
                self.store.delete(&name)?;
                Ok(ConfigResponse::Deleted { name })
            }
        }
    }

    /// Every registered session, including finished ones not yet stopped.
    pub fn list_capture_sessions(&self) -> Vec<CaptureSession> {
        self.sessions.list()
    }
}
