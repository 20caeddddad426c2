//! Purpose: Provide the HTTP/JSON server for the bookshelf library.
//! Exports: `ServeConfig`, `serve`, `router`.
//! Role: Axum adapter that translates `Library` results into status codes.
//! Invariants: Validation failures are 400 `{success:false,error}`; other failures are 500.
//! Invariants: Loopback-only unless explicitly allowed.
//! Notes: Bodies are parsed leniently; an unreadable body behaves like `{}`.

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::{Map, Value, json};
use std::future::IntoFuture;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use bookshelf::api::{Error, ErrorKind, Latency, Library};

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub allow_non_loopback: bool,
    pub max_body_bytes: u64,
    pub latency: Latency,
    pub seed_titles: Vec<String>,
}

#[derive(Clone)]
struct AppState {
    library: Library,
}

pub async fn serve(config: ServeConfig) -> Result<(), Error> {
    validate_config(&config)?;

    init_tracing();

    let max_body_bytes: usize = config
        .max_body_bytes
        .try_into()
        .map_err(|_| Error::new(ErrorKind::Usage).with_message("--max-body-bytes is too large"))?;

    let library = Library::new(config.latency).with_titles(config.seed_titles);
    let app = router(library, max_body_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to bind server")
                .with_source(err)
        })?;
    tracing::info!(bind = %config.bind, "bookshelf listening");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("server failed")
                    .with_source(err)
            })?;
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown requested");
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(Duration::from_secs(10), &mut server).await {
                Ok(result) => result.map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("server failed")
                        .with_source(err)
                })?,
                Err(_) => {
                    return Err(Error::new(ErrorKind::Io).with_message("server shutdown timed out"));
                }
            }
        }
    };
    Ok(())
}

pub fn router(library: Library, max_body_bytes: usize) -> Router {
    let state = Arc::new(AppState { library });
    Router::new()
        .route("/healthz", get(healthz))
        .route("/addBook", post(add_book))
        .route("/removeBook", delete(remove_book))
        .route("/updateBook", patch(update_book))
        .route("/getLibrary", get(get_library))
        .route("/saveToDatabase", put(save_to_database))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn is_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(addr) => addr.is_loopback(),
        IpAddr::V6(addr) => addr.is_loopback(),
    }
}

fn validate_config(config: &ServeConfig) -> Result<(), Error> {
    if !is_loopback(config.bind.ip()) && !config.allow_non_loopback {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("non-loopback bind requires explicit opt-in")
            .with_hint("Re-run with --allow-non-loopback or use a loopback address."));
    }

    if config.max_body_bytes == 0 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--max-body-bytes must be greater than zero")
            .with_hint("Use a positive value like 1048576."));
    }

    if config.max_body_bytes > usize::MAX as u64 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--max-body-bytes exceeds platform limits")
            .with_hint("Use a smaller value that fits in memory."));
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}

async fn healthz() -> Response {
    Json(json!({ "ok": true })).into_response()
}

async fn add_book(State(state): State<Arc<AppState>>, headers: HeaderMap, body: Bytes) -> Response {
    let payload = parse_body(&headers, &body);
    match state.library.add_book(string_field(&payload, "book")) {
        Ok(()) => success_response(),
        Err(err) => error_response(err),
    }
}

async fn remove_book(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload = parse_body(&headers, &body);
    match state.library.remove_book(string_field(&payload, "book")) {
        Ok(()) => success_response(),
        Err(err) => error_response(err),
    }
}

async fn update_book(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload = parse_body(&headers, &body);
    let result = state.library.rename_book(
        string_field(&payload, "original_book"),
        string_field(&payload, "new_book"),
    );
    match result {
        Ok(()) => success_response(),
        Err(err) => error_response(err),
    }
}

async fn get_library(State(state): State<Arc<AppState>>) -> Response {
    match state.library.list_books().await {
        Ok(library) => Json(json!({ "library": library })).into_response(),
        Err(err) => error_response(err),
    }
}

async fn save_to_database(State(state): State<Arc<AppState>>) -> Response {
    match state.library.save_to_database().await {
        Ok(saved) => Json(saved).into_response(),
        Err(err) => error_response(err),
    }
}

/// Decodes a JSON or form-urlencoded body into an object; anything else is `{}`.
fn parse_body(headers: &HeaderMap, body: &Bytes) -> Map<String, Value> {
    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));
    if is_form {
        return url::form_urlencoded::parse(body)
            .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
            .collect();
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn string_field<'a>(payload: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str)
}

fn success_response() -> Response {
    Json(json!({ "success": true })).into_response()
}

fn error_response(err: Error) -> Response {
    let status = if err.kind().is_validation() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    }
    let message = err.message().unwrap_or("internal error");
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}
