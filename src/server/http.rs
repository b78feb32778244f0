//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo, one task per connection.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::cache;
use crate::config::Args;
use crate::routes::{self, empty_body, json_response, BoxBody};
use crate::service::AccountService;
use crate::types::GatehouseError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub service: Arc<AccountService>,
}

impl AppState {
    pub fn new(args: Args, service: Arc<AccountService>) -> Self {
        Self { args, service }
    }
}

/// Serve until `shutdown` resolves, then drain the write-back queues.
pub async fn run(
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()>,
) -> Result<(), GatehouseError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Gatehouse listening on {}", state.args.listen);

    if state.args.dev_mode {
        warn!("Development mode enabled - in-memory store, single dev token");
    }

    cache::spawn_cleanup_task(Arc::clone(state.service.cache()));
    info!(
        ttl_secs = state.service.cache().config().ttl.as_secs(),
        "Partition cache enabled"
    );

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { handle_request(state, addr, req).await }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service)
                            .await
                        {
                            error!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = &mut shutdown => {
                info!("Shutdown requested, draining write-back queues");
                break;
            }
        }
    }

    let report = state.service.queues().shutdown().await;
    if !report.failed_sheets.is_empty() {
        warn!(failed_sheets = ?report.failed_sheets, "Some writes were lost during shutdown");
    }
    Ok(())
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("[{}] {} {}", addr, method, path);

    let service = state.service.as_ref();
    let response = match (method, path.as_str()) {
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(&state.args),
        (Method::GET, "/status") => routes::status_check(service),

        (Method::OPTIONS, _) => preflight_response(),

        (Method::POST, "/api/v1/accounts/claim") => routes::handle_claim(service, req).await,
        (Method::POST, "/api/v1/accounts/update") => routes::handle_update(service, req).await,
        (Method::POST, "/api/v1/cache/clear") => routes::handle_clear_cache(service, req).await,

        (_, p) => not_found_response(p),
    };

    Ok(response)
}

/// CORS preflight response
fn preflight_response() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .body(empty_body())
        .unwrap()
}

/// Not found response
fn not_found_response(path: &str) -> Response<BoxBody> {
    json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({
            "status": false,
            "message": format!("no route for {}", path),
        }),
    )
}

