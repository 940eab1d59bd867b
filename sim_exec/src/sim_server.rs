//! # Simulator server
//!
//! HTTP front end of the simulator. Command documents are posted to the
//! command path, applied to the simulation and answered with telemetry.
//! Renderers poll the snapshot path for a read-only copy of the simulation.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::future::Future;
use std::net::SocketAddr;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use log::{debug, info, warn};
use tokio::net::TcpListener;

// Internal
use comms_if::{
    eqpt::rover::{SimCommand, TelemetryResponse},
    net::NetParams,
};
use crate::sim_state::{RenderSnapshot, SimHandle};
use crate::telemetry::TelemetryResponder;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// State shared by every request handler.
#[derive(Debug, Clone)]
pub struct ServerState {
    pub sim: SimHandle,
    pub responder: TelemetryResponder,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimServerError {
    #[error("Could not bind the server to {0}: {1}")]
    BindError(SocketAddr, std::io::Error),

    #[error("Server failed while running: {0}")]
    ServeError(std::io::Error),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the router serving the simulator's endpoints.
pub fn router(state: ServerState, net_params: &NetParams) -> Router {
    Router::new()
        .route(&net_params.command_path, post(handle_command))
        .route(&net_params.snapshot_path, get(handle_snapshot))
        .layer(DefaultBodyLimit::max(net_params.max_command_bytes))
        .with_state(state)
}

/// Bind a listener for the server.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, SimServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| SimServerError::BindError(addr, e))?;

    info!("Simulator server listening on http://{}", addr);

    Ok(listener)
}

/// Serve requests until `shutdown` completes. Requests already in progress
/// are allowed to finish.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    shutdown: F,
) -> Result<(), SimServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(SimServerError::ServeError)
}

/// Apply a posted command document.
///
/// A body which isn't a command document, or which couldn't be read (for
/// instance because it is over the size limit), is rejected without touching
/// the simulation, but is still answered with telemetry.
pub async fn handle_command(
    State(state): State<ServerState>,
    body: Result<Bytes, BytesRejection>,
) -> (StatusCode, Json<TelemetryResponse>) {
    let status = match body {
        Ok(body) => apply_body(&state, &body),
        Err(e) => {
            warn!("Could not read command body: {}", e.body_text());
            e.status()
        }
    };

    (status, Json(state.responder.respond()))
}

/// Return a snapshot of the simulation.
pub async fn handle_snapshot(
    State(state): State<ServerState>,
) -> Json<RenderSnapshot> {
    Json(state.sim.snapshot())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn apply_body(state: &ServerState, body: &[u8]) -> StatusCode {
    match SimCommand::from_slice(body) {
        Ok(cmd) => {
            let report = state.sim.apply_command(&cmd);
            debug!(
                "Command applied ({} entries, {} discarded)",
                report.num_applied, report.num_discarded
            );
            StatusCode::OK
        }
        Err(e) => {
            warn!("Rejected command: {}", e);
            StatusCode::BAD_REQUEST
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn server_state() -> ServerState {
        ServerState {
            sim: SimHandle::new(),
            responder: TelemetryResponder::default(),
        }
    }

    async fn post_body(state: &ServerState, body: &str)
        -> (StatusCode, TelemetryResponse)
    {
        let (status, Json(resp)) = handle_command(
            State(state.clone()),
            Ok(Bytes::from(body.to_string())),
        ).await;

        (status, resp)
    }

    #[tokio::test]
    async fn test_empty_command() {
        let state = server_state();

        let (status, resp) = post_body(&state, "{}").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp.ultrasonic_range, 80.0);

        let (_, full) = post_body(
            &state,
            r#"{"wheelMotors": {"l": [50, 0]}, "servos": {"0": 10}}"#
        ).await;
        assert_eq!(full, resp);
    }

    #[tokio::test]
    async fn test_command_applied() {
        let state = server_state();

        post_body(&state, r#"{
            "wheelMotors": {"l": [100, 0], "r": [0, 100]},
            "rgbLeds": {"3": [0, 0, 255]}
        }"#).await;

        let Json(snap) = handle_snapshot(State(state.clone())).await;
        assert_eq!(snap.speed_left, 100);
        assert_eq!(snap.speed_right, -100);
        assert_eq!(snap.rgb_leds[3].2, 255);
    }

    #[tokio::test]
    async fn test_malformed_rejected() {
        let state = server_state();
        post_body(&state, r#"{"servos": {"1": 20}}"#).await;
        let before = state.sim.actuators();

        for body in ["", "not json", r#"{"servos": [1, 2]}"#].iter() {
            let (status, resp) = post_body(&state, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(resp.ultrasonic_range, 80.0);
        }

        assert_eq!(state.sim.actuators(), before);
    }

    /// Serve `net_params` on a local port, post `body` to it, and return the
    /// raw HTTP response.
    async fn post_over_http(
        state: ServerState,
        net_params: &NetParams,
        body: &str,
    ) -> String {
        let app = router(state, net_params);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, app, async move {
            rx.await.ok();
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(format!(
            "POST / HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\n\
            Content-Length: {}\r\nConnection: close\r\n\r\n{}",
            addr, body.len(), body
        ).as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        tx.send(()).ok();
        server.await.unwrap().unwrap();

        response
    }

    #[tokio::test]
    async fn test_over_http() {
        let state = server_state();
        let sim = state.sim.clone();

        let response = post_over_http(
            state,
            &NetParams::default(),
            r#"{"servos": {"9": -15}}"#,
        ).await;

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with(r#"{"ultrasonicRange":80.0}"#));
        assert_eq!(sim.actuators().servos_deg[9], -15.0);
    }

    #[tokio::test]
    async fn test_oversized_body_answered() {
        let state = server_state();
        let sim = state.sim.clone();
        let net_params = NetParams {
            max_command_bytes: 64,
            ..Default::default()
        };

        // Valid command padded past the limit
        let body = format!(
            r#"{{"servos": {{"9": -15}}}}{}"#,
            " ".repeat(200)
        );
        let response = post_over_http(state, &net_params, &body).await;

        assert!(response.starts_with("HTTP/1.1 413"));
        assert!(response.ends_with(r#"{"ultrasonicRange":80.0}"#));
        assert_eq!(sim.actuators().servos_deg[9], 0.0);
    }
}
