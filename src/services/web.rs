//! Axum-based HTTP server for the configuration portal.
//!
//! Provides endpoints for:
//! - GET `/`, `/status` - Device status
//! - GET `/switch?on=true|false` - Switch the relay
//! - GET `/store?ssid=...` - Store configuration fields
//! - GET `/reboot` - Restart the device
//!
//! Routing and argument parsing are shared with the ESP32 server through
//! [`PortalRequest::parse`]; this module only adapts them to axum.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{error, info};
use tower_http::cors::{Any, CorsLayer};

use crate::messages::ReplyBody;
use crate::portal::PortalRequest;
use crate::traits::{HttpMethod, HttpRequest, HttpResponse};

use super::api::ApiResponse;
use super::shared::PortalService;

// Axum integration: allow HttpResponse to be returned directly from handlers
impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, self.content_type)],
            Body::from(self.body),
        )
            .into_response()
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Every portal route: parse, then hand to the device on a blocking thread.
///
/// The device lock may be held by a control loop pass that is waiting on
/// the broker, so it is never taken on an async worker.
async fn portal<T: PortalService + 'static>(
    State(service): State<Arc<T>>,
    method: Method,
    uri: Uri,
) -> Response {
    let method = if method == Method::POST {
        HttpMethod::Post
    } else {
        HttpMethod::Get
    };
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let request = HttpRequest::from_uri(method, target);

    let portal_request = match PortalRequest::parse(&request) {
        Ok(req) => req,
        Err(resp) => return resp.into_response(),
    };

    let result = tokio::task::spawn_blocking(move || service.handle(portal_request)).await;
    match result {
        Ok(Ok(reply)) => Json(ApiResponse::ok(ReplyBody::from(&reply))).into_response(),
        Ok(Err(message)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<()>::err(message)),
        )
            .into_response(),
        Err(e) => {
            error!("[Portal] Handler task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::err("internal error")),
            )
                .into_response()
        }
    }
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::err("Not found")),
    )
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors_permissive: true,
        }
    }
}

impl WebServerConfig {
    /// Create a new config with the given address
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Set whether CORS should be permissive
    pub fn cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }
}

/// Build the Axum router with all routes
pub fn build_router<T: PortalService + 'static>(
    service: Arc<T>,
    config: &WebServerConfig,
) -> Router {
    let mut router = Router::new()
        .route("/", get(portal::<T>))
        .route("/status", get(portal::<T>))
        .route("/switch", get(portal::<T>).post(portal::<T>))
        .route("/store", get(portal::<T>).post(portal::<T>))
        .route("/reboot", get(portal::<T>).post(portal::<T>))
        .fallback(not_found)
        .with_state(service);

    // Add CORS if requested
    if config.cors_permissive {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}

/// Start the web server
///
/// This function runs until the server is shut down.
pub async fn run_server<T: PortalService + 'static>(
    service: Arc<T>,
    config: WebServerConfig,
) -> Result<(), std::io::Error> {
    let router = build_router(service, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("[Portal] Listening on http://{}", config.addr);

    axum::serve(listener, router).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = WebServerConfig::default();
        assert_eq!(config.addr.port(), 8080);
        assert!(config.cors_permissive);
    }

    #[test]
    fn config_builder() {
        let config = WebServerConfig::new(([127, 0, 0, 1], 9000)).cors(false);
        assert_eq!(config.addr, SocketAddr::from(([127, 0, 0, 1], 9000)));
        assert!(!config.cors_permissive);
    }

    #[test]
    fn http_response_into_axum() {
        let resp = HttpResponse::bad_request("missing on").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
