//! HTTP configuration portal for ESP32.
//!
//! Runs the portal on the ESP-IDF HTTP server. Routing and argument parsing
//! use [`PortalRequest::parse`], the same code the desktop server runs.
//!
//! The device itself lives in the main loop, so handlers never touch it:
//! - `GET /`, `GET /status` answer from the status snapshot the main loop
//!   refreshes every pass
//! - `/switch`, `/store` and `/reboot` are queued for the main loop and
//!   acknowledged with `202 Accepted`
//!
//! # Example
//!
//! ```ignore
//! use esp_relay::hal::esp32::{Esp32HttpServer, Esp32SharedState};
//! use std::sync::{Arc, Mutex};
//!
//! let shared = Arc::new(Mutex::new(Esp32SharedState::default()));
//! let server = Esp32HttpServer::new(80, shared.clone())?;
//!
//! // Main loop
//! if let Some(request) = shared.lock().unwrap().pending.take() {
//!     device.handle_portal(request, now_ms)?;
//! }
//! ```

use std::sync::{Arc, Mutex};

use esp_idf_hal::io::Write;
use esp_idf_svc::http::server::{Configuration, EspHttpServer};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::EspIOError;
use log::info;

use crate::device::DeviceStatus;
use crate::messages::status_json;
use crate::portal::PortalRequest;
use crate::traits::{HttpMethod, HttpRequest, HttpResponse};

/// Routes served by the portal.
const ROUTES: [&str; 5] = ["/", "/status", "/switch", "/store", "/reboot"];

/// Shared state between HTTP handlers and the main loop.
///
/// The main loop should:
/// 1. Refresh `status` every pass
/// 2. Take and handle `pending` when present
#[derive(Default)]
pub struct Esp32SharedState {
    /// Latest status snapshot
    pub status: DeviceStatus,
    /// Request waiting for the main loop
    pub pending: Option<PortalRequest>,
}

impl Esp32SharedState {
    /// Answer a request: status from the snapshot, anything else queued.
    fn respond(&mut self, request: PortalRequest) -> HttpResponse {
        match request {
            PortalRequest::Status => status_response(&self.status),
            request if self.pending.is_some() => {
                info!("[Portal] Busy, dropping {:?}", request);
                HttpResponse::error(503, "busy")
            }
            request => {
                self.pending = Some(request);
                let mut resp = HttpResponse::ok_json(r#"{"accepted":true}"#);
                resp.status = 202;
                resp
            }
        }
    }
}

fn status_response(status: &DeviceStatus) -> HttpResponse {
    match status_json(status) {
        Some(json) => HttpResponse::ok_json(&json),
        None => HttpResponse::error(500, "status too large"),
    }
}

/// HTTP server for the configuration portal.
pub struct Esp32HttpServer {
    _server: EspHttpServer<'static>,
}

impl Esp32HttpServer {
    /// Start the portal on `port`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP server fails to start.
    pub fn new(port: u16, shared_state: Arc<Mutex<Esp32SharedState>>) -> anyhow::Result<Self> {
        let server_config = Configuration {
            http_port: port,
            ..Default::default()
        };

        let mut server = EspHttpServer::new(&server_config)?;

        for route in ROUTES {
            for (method, http_method) in [
                (Method::Get, HttpMethod::Get),
                (Method::Post, HttpMethod::Post),
            ] {
                let state = shared_state.clone();
                server.fn_handler(route, method, move |req| {
                    let request = HttpRequest::from_uri(http_method, req.uri());

                    let response = match PortalRequest::parse(&request) {
                        Ok(portal_request) => state.lock().unwrap().respond(portal_request),
                        Err(resp) => resp,
                    };

                    let mut resp = req.into_response(
                        response.status,
                        None,
                        &[("Content-Type", response.content_type)],
                    )?;
                    resp.write_all(&response.body)?;
                    Ok::<_, EspIOError>(())
                })?;
            }
        }

        info!("[HTTP] Portal started on port {}", port);

        Ok(Self { _server: server })
    }
}
