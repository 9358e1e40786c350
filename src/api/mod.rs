//! Server module for exposing message generation via a REST API
//!
//! Provides a small HTTP surface over a shared [`Orchestrator`]. Routing, CORS
//! and body-size limits live here; the orchestrator knows nothing about HTTP.

mod handlers;
mod types;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};

use crate::orchestrator::Orchestrator;
use handlers::{handle_generate, handle_health};

pub use types::{ErrorResponse, GenerateRequest};

/// Default cap on request bodies, in bytes
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024;

/// Main server struct that owns the shared orchestrator
pub struct Server {
    orchestrator: Arc<Orchestrator>,
    /// Maximum accepted request body size in bytes
    pub body_limit: usize,
}

/// Internal server state shared between request handlers
#[derive(Clone)]
struct ServerState {
    orchestrator: Arc<Orchestrator>,
}

impl Server {
    /// Creates a new server instance around an orchestrator
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Sets the maximum accepted request body size
    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    /// Builds the router without binding a socket
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/generate", post(handle_generate))
            .route("/health", get(handle_health))
            .layer(RequestBodyLimitLayer::new(self.body_limit))
            .layer(CorsLayer::permissive())
            .with_state(ServerState {
                orchestrator: self.orchestrator.clone(),
            })
    }

    /// Starts the server and listens for requests on the specified address
    ///
    /// # Arguments
    /// * `addr` - Address to bind to (e.g. "127.0.0.1:3000")
    pub async fn run(self, addr: &str) -> Result<(), crate::error::LLMError> {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| crate::error::LLMError::InvalidRequest(e.to_string()))?;
        log::info!("Listening on {}", addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| crate::error::LLMError::InvalidRequest(e.to_string()))?;

        Ok(())
    }
}
