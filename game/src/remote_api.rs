//! Localhost HTTP control surface.
//!
//! Handlers never touch the game directly: each request becomes a
//! [`RemoteCmd`] on a channel that the game loop drains between ticks, and the
//! reply comes back on a oneshot.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::color::Color;
use crate::controller::GameController;
use crate::presenter::{Presenter, TonePlayer};
use crate::rng::ColorSource;
use crate::state::GameSnapshot;

const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub enum RemoteCmd {
    GetState {
        respond: oneshot::Sender<GameSnapshot>,
    },
    Start {
        respond: oneshot::Sender<GameSnapshot>,
    },
    Press {
        color: String,
        respond: oneshot::Sender<Result<GameSnapshot, String>>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PressRequest {
    pub color: String,
}

#[derive(Clone)]
struct RemoteState {
    tx: mpsc::UnboundedSender<RemoteCmd>,
}

type ApiError = (StatusCode, String);

async fn health() -> &'static str {
    "ok"
}

async fn send_cmd<T>(
    tx: &mpsc::UnboundedSender<RemoteCmd>,
    cmd: RemoteCmd,
    rx: oneshot::Receiver<T>,
) -> Result<T, ApiError> {
    tx.send(cmd).map_err(|_| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "game command channel closed".to_string(),
        )
    })?;

    match tokio::time::timeout(REPLY_TIMEOUT, rx).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(_)) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "game did not respond".to_string(),
        )),
        Err(_) => Err((StatusCode::GATEWAY_TIMEOUT, "game timed out".to_string())),
    }
}

async fn game_state(State(state): State<RemoteState>) -> Result<Json<GameSnapshot>, ApiError> {
    let (tx, rx) = oneshot::channel();
    let snapshot = send_cmd(&state.tx, RemoteCmd::GetState { respond: tx }, rx).await?;
    Ok(Json(snapshot))
}

async fn game_start(State(state): State<RemoteState>) -> Result<Json<GameSnapshot>, ApiError> {
    let (tx, rx) = oneshot::channel();
    let snapshot = send_cmd(&state.tx, RemoteCmd::Start { respond: tx }, rx).await?;
    Ok(Json(snapshot))
}

async fn game_press(
    State(state): State<RemoteState>,
    Json(payload): Json<PressRequest>,
) -> Result<Json<GameSnapshot>, ApiError> {
    let (tx, rx) = oneshot::channel();
    let res = send_cmd(
        &state.tx,
        RemoteCmd::Press {
            color: payload.color,
            respond: tx,
        },
        rx,
    )
    .await?;

    res.map(Json).map_err(|msg| (StatusCode::BAD_REQUEST, msg))
}

pub fn router(tx: mpsc::UnboundedSender<RemoteCmd>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/state", get(game_state))
        .route("/api/start", post(game_start))
        .route("/api/press", post(game_press))
        .with_state(RemoteState { tx })
        .layer(cors)
}

pub struct RemoteServer {
    pub rx: mpsc::UnboundedReceiver<RemoteCmd>,
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl RemoteServer {
    /// Binds on localhost and serves on the current runtime. Port `0` picks a
    /// free port; see [`RemoteServer::addr`].
    pub async fn start(port: u16) -> io::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel::<RemoteCmd>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let listener =
            tokio::net::TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port))
                .await?;
        let addr = listener.local_addr()?;
        info!(%addr, "remote api listening");

        tokio::spawn(async move {
            let serve = axum::serve(listener, router(tx)).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(err) = serve.await {
                warn!(%err, "remote api server error");
            }
        });

        Ok(Self {
            rx,
            addr,
            shutdown: Some(shutdown_tx),
        })
    }

    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for RemoteServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Applies every command already queued, without waiting for more.
pub fn drain_remote_commands<P, T, R>(
    remote: Option<&mut RemoteServer>,
    game: &mut GameController<P, T, R>,
) where
    P: Presenter,
    T: TonePlayer,
    R: ColorSource,
{
    let Some(remote) = remote else {
        return;
    };

    loop {
        match remote.rx.try_recv() {
            Ok(cmd) => handle_remote_command(game, cmd),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
    }
}

pub fn handle_remote_command<P, T, R>(game: &mut GameController<P, T, R>, cmd: RemoteCmd)
where
    P: Presenter,
    T: TonePlayer,
    R: ColorSource,
{
    match cmd {
        RemoteCmd::GetState { respond } => {
            let _ = respond.send(game.snapshot());
        }
        RemoteCmd::Start { respond } => {
            game.on_start_requested();
            let _ = respond.send(game.snapshot());
        }
        RemoteCmd::Press { color, respond } => match color.parse::<Color>() {
            Ok(color) => {
                game.on_color_pressed(color);
                let _ = respond.send(Ok(game.snapshot()));
            }
            Err(err) => {
                let _ = respond.send(Err(err.to_string()));
            }
        },
    }
}
