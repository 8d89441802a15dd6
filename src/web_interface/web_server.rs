use log::info;
use std::net::SocketAddr;
use std::sync::Arc;

use super::routes::api;
use crate::controller::Controller;
use crate::error_handling::types::WebError;

/// HTTP front end exposing the controller operations.
pub struct WebServer {
    controller: Arc<Controller>,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(controller: Arc<Controller>, addr: SocketAddr) -> Self {
        Self { controller, addr }
    }

    /// Serves until the process stops.
    pub async fn start(&self) -> Result<(), WebError> {
        // warp panics on an unusable address
        std::net::TcpListener::bind(self.addr)
            .map_err(|e| WebError::BindFailed(format!("{}: {}", self.addr, e)))?;

        info!("HTTP API listening on http://{}", self.addr);
        warp::serve(api(self.controller.clone())).run(self.addr).await;

        Ok(())
    }
}
