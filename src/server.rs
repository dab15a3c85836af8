// ─── HTTP Server ───
// Routes for the dashboard plus a permissive CORS layer, since the
// dashboard is served from a different origin than the agent.

use std::net::SocketAddr;

use axum::extract::Request;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;

use crate::commands;
use crate::core::error::{NexusError, NexusResult};
use crate::core::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(commands::status))
        .route("/api/games", get(commands::list_games))
        .route("/api/game/:disc_id", get(commands::game_detail))
        .route("/api/icon/:disc_id", get(commands::icon))
        .route("/api/launch", post(commands::launch))
        .route("/api/refresh", post(commands::refresh))
        .route(
            "/api/config",
            get(commands::get_config).post(commands::set_config),
        )
        .route(
            "/api/game-map",
            get(commands::get_game_map).post(commands::set_game_map),
        )
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok\n"
}

async fn cors(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut res = StatusCode::NO_CONTENT.into_response();
        let headers = res.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        );
        headers.insert(
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static("86400"),
        );
        return res;
    }

    let mut res = next.run(req).await;
    res.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    res
}

pub struct RunningServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<NexusResult<()>>>,
}

impl RunningServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn shutdown(mut self) -> NexusResult<()> {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }

        if let Some(join) = self.join.take() {
            join.await
                .map_err(|e| NexusError::Server(format!("server task panicked: {e}")))??;
        }
        Ok(())
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }

        if let Some(join) = self.join.take() {
            join.abort();
        }
    }
}

/// Bind `addr` and serve in a background task. Port 0 picks a free port;
/// read it back with [`RunningServer::addr`].
pub async fn start(addr: SocketAddr, state: AppState) -> NexusResult<RunningServer> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| NexusError::Server(format!("bind {addr}: {e}")))?;
    let addr = listener
        .local_addr()
        .map_err(|e| NexusError::Server(format!("read bound address: {e}")))?;

    let app = router(state);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let join = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
            .map_err(|e| NexusError::Server(format!("serve: {e}")))?;
        Ok(())
    });

    info!("Agent listening on http://{}", addr);
    Ok(RunningServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        join: Some(join),
    })
}
