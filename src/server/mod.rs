//! HTTP surface for Switchboard
//!
//! This module implements the single program endpoint: POST / accepts a
//! program document and relays the engine's buffered response onto the
//! wire; GET /health reports liveness.

use axum::extract::Json;
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use tracing::{error, info};

use crate::engine::{Engine, Response};
use crate::error::{Error, Result};
use crate::program::Program;

/// Default server port
pub const DEFAULT_PORT: u16 = 8080;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Create a new server config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host address
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Get the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Build the application router
pub fn router() -> Router {
    Router::new()
        .route("/", post(execute_program))
        .route("/health", get(health))
}

/// Start the server and serve requests until shutdown
pub async fn serve(config: ServerConfig) -> Result<()> {
    let address: std::net::SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| Error::Internal(format!("invalid bind address: {e}")))?;

    info!(%address, "switchboard server listening");
    axum::Server::bind(&address)
        .serve(router().into_make_service())
        .await
        .map_err(|e| Error::Internal(format!("server error: {e}")))
}

async fn health() -> &'static str {
    "OK"
}

/// Run one engine lifecycle for the posted program
async fn execute_program(Json(program): Json<Program>) -> axum::response::Response {
    match Engine::execute(&program).await {
        Ok(response) => relay(response),
        Err(error) => {
            error!("request rejected: {error}");
            (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response()
        }
    }
}

/// Convert the engine's buffered response into a wire response
fn relay(buffered: Response) -> axum::response::Response {
    let status =
        StatusCode::from_u16(buffered.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let headers = buffered.headers().to_vec();

    let mut response = (status, buffered.into_body()).into_response();
    for (name, value) in headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => error!(header = %name, "dropping malformed response header"),
        }
    }
    response
}
