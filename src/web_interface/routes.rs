use log::{debug, error, info, warn};
use std::convert::Infallible;
use std::sync::Arc;
use warp::filters::body::BodyDeserializeError;
use warp::{http::StatusCode, reject, reply, Filter, Rejection, Reply};

use super::types::{ApiError, ToolResponse};
use crate::controller::types::{
    AnalyzeFileRequest, ManageConfigRequest, StartCaptureRequest, StopCaptureRequest,
};
use crate::controller::Controller;
use crate::error_handling::types::{
    AnalysisError, CaptureError, ControllerError, SessionError, StorageError,
};

/// Largest accepted request body.
const MAX_BODY_BYTES: u64 = 64 * 1024;

/// HTTP status reported for each failure kind.
pub fn error_status(err: &ControllerError) -> StatusCode {
    match err {
        ControllerError::Storage(StorageError::ConfigNotFound(_)) => StatusCode::NOT_FOUND,
        ControllerError::Storage(StorageError::InvalidName(_)) => StatusCode::BAD_REQUEST,
        ControllerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ControllerError::Session(SessionError::NotFound(_)) => StatusCode::NOT_FOUND,
        ControllerError::Session(SessionError::Duplicate(_)) => StatusCode::CONFLICT,
        ControllerError::Capture(CaptureError::SessionError(SessionError::Duplicate(_))) => {
            StatusCode::CONFLICT
        }
        ControllerError::Capture(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ControllerError::Analysis(AnalysisError::FileNotFound(_)) => StatusCode::NOT_FOUND,
        ControllerError::Analysis(AnalysisError::EngineFailed { .. }) => StatusCode::BAD_GATEWAY,
        ControllerError::Analysis(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ControllerError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ControllerError::NoResults { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ControllerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
    }
}

fn success(response: ToolResponse) -> reply::Response {
    reply::with_status(reply::json(&response), StatusCode::OK).into_response()
}

fn api_error(status: StatusCode, message: String) -> reply::Response {
    reply::with_status(reply::json(&ApiError { message }), status).into_response()
}

fn failure(operation: &str, err: ControllerError) -> reply::Response {
    let status = error_status(&err);
    warn!("{} failed ({}): {}", operation, status, err);
    api_error(status, err.to_string())
}

/// Every route, with rejected requests answered as `ApiError` bodies.
pub fn api(
    controller: Arc<Controller>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    health_route()
        .or(list_sessions_route(controller.clone()))
        .or(start_capture_route(controller.clone()))
        .or(stop_capture_route(controller.clone()))
        .or(analyze_file_route(controller.clone()))
        .or(manage_config_route(controller))
        .recover(handle_rejection)
}

/// Maps warp rejections onto the same error body the operations use.
pub async fn handle_rejection(err: Rejection) -> Result<reply::Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (
            StatusCode::NOT_FOUND,
            "Unknown endpoint. Use GET / for usage or POST /tools/<operation>.".to_string(),
        )
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            format!(
                "Invalid request: {}. Check the JSON body fields and their types.",
                e
            ),
        )
    } else if err.find::<reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("Request body exceeds {} bytes.", MAX_BODY_BYTES),
        )
    } else if err.find::<reject::LengthRequired>().is_some() {
        (
            StatusCode::LENGTH_REQUIRED,
            "A Content-Length header is required.".to_string(),
        )
    } else if err.find::<reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Send the request body as application/json.".to_string(),
        )
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed. Tool operations are POST requests.".to_string(),
        )
    } else {
        error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };
    debug!("Rejected request ({}): {}", status, message);
    Ok(api_error(status, message))
}

fn with_controller(
    controller: Arc<Controller>,
) -> impl Filter<Extract = (Arc<Controller>,), Error = Infallible> + Clone {
    warp::any().map(move || controller.clone())
}

fn tool(
    name: &'static str,
) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::path("tools")
        .and(warp::path(name))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
}

/// GET /
pub fn health_route() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path::end()
        .and(warp::get())
        .map(|| "wiretap is running. POST /tools/<operation> to use it; see /sessions for JSON.")
}

/// GET /sessions
pub fn list_sessions_route(
    controller: Arc<Controller>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("sessions")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_controller(controller))
        .map(|controller: Arc<Controller>| {
            reply::with_status(
                reply::json(&controller.list_capture_sessions()),
                StatusCode::OK,
            )
        })
}

/// POST /tools/start_capture_session
pub fn start_capture_route(
    controller: Arc<Controller>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    tool("start_capture_session")
        .and(warp::body::json())
        .and(with_controller(controller))
        .and_then(
            |request: StartCaptureRequest, controller: Arc<Controller>| async move {
                let res = match controller.start_capture_session(request) {
                    Ok(started) => {
                        info!("Started capture session {}", started.session_id);
                        success(ToolResponse::with_data(started.summary(), &started))
                    }
                    Err(e) => failure("start_capture_session", e),
                };
                Ok::<_, Rejection>(res)
            },
        )
}

/// POST /tools/stop_capture_session
pub fn stop_capture_route(
    controller: Arc<Controller>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    tool("stop_capture_session")
        .and(warp::body::json())
        .and(with_controller(controller))
        .and_then(
            |request: StopCaptureRequest, controller: Arc<Controller>| async move {
                let res = match controller.stop_capture_session(request).await {
                    Ok(output) => success(ToolResponse::text(output)),
                    Err(e) => failure("stop_capture_session", e),
                };
                Ok::<_, Rejection>(res)
            },
        )
}

/// POST /tools/analyze_pcap_file
pub fn analyze_file_route(
    controller: Arc<Controller>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    tool("analyze_pcap_file")
        .and(warp::body::json())
        .and(with_controller(controller))
        .and_then(
            |request: AnalyzeFileRequest, controller: Arc<Controller>| async move {
                let res = match controller.analyze_pcap_file(request).await {
                    Ok(output) => success(ToolResponse::text(output)),
                    Err(e) => failure("analyze_pcap_file", e),
                };
                Ok::<_, Rejection>(res)
            },
        )
}

/// POST /tools/manage_config
pub fn manage_config_route(
    controller: Arc<Controller>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    tool("manage_config")
        .and(warp::body::json())
        .and(with_controller(controller))
        .and_then(
            |request: ManageConfigRequest, controller: Arc<Controller>| async move {
                // the store does synchronous file I/O
                let outcome =
                    tokio::task::spawn_blocking(move || controller.manage_config(request)).await;
                let res = match outcome {
                    Ok(Ok(response)) => {
                        success(ToolResponse::with_data(response.summary(), &response))
                    }
                    Ok(Err(e)) => failure("manage_config", e),
                    Err(e) => {
                        error!("manage_config task failed: {}", e);
                        api_error(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "Configuration operation did not complete.".to_string(),
                        )
                    }
                };
                Ok::<_, Rejection>(res)
            },
        )
}
