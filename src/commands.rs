// ─── Dashboard API ───
// JSON handlers for the web dashboard. Each handler reads the current
// library snapshot; `list_games` and `refresh` rebuild it first.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::core::error::NexusError;
use crate::core::game_map::GameMap;
use crate::core::library::{resolve_save_state, GameRecord};
use crate::core::state::{AppState, Settings};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: &'static str,
    /// Whether a PPSSPP executable has been configured.
    pub configured: bool,
    pub games_found: usize,
}

#[derive(Debug, Serialize)]
pub struct GameListResponse {
    pub games: Vec<GameRecord>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct LaunchRequest {
    #[serde(default, rename = "discID", alias = "disc_id", alias = "discId")]
    pub disc_id: Option<String>,
    /// Save-state filename from the game's list, or a path.
    #[serde(default, rename = "saveState", alias = "save_state")]
    pub save_state: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LaunchResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub success: bool,
    pub games_found: usize,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

/// A [`NexusError`] rendered as `{kind, message}` with a matching status code.
#[derive(Debug)]
pub struct ApiError(pub NexusError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<NexusError> for ApiError {
    fn from(err: NexusError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(NexusError::BadRequest(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            NexusError::NotFound(_) => StatusCode::NOT_FOUND,
            NexusError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        let body = ErrorBody {
            kind: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let configured = match state.config.emulator_path().await {
        Ok(path) => path.is_some(),
        Err(e) => {
            warn!("Cannot read settings: {}", e);
            false
        }
    };

    Json(StatusResponse {
        status: "online",
        configured,
        games_found: state.library.snapshot().len(),
    })
}

/// Rescans before answering so the dashboard always sees the current tree.
pub async fn list_games(State(state): State<AppState>) -> Json<GameListResponse> {
    let snapshot = state.library.rescan().await;
    let games: Vec<GameRecord> = snapshot.games().cloned().collect();

    Json(GameListResponse {
        total: games.len(),
        games,
    })
}

pub async fn game_detail(
    State(state): State<AppState>,
    Path(disc_id): Path<String>,
) -> ApiResult<Json<GameRecord>> {
    let snapshot = state.library.snapshot();
    let game = snapshot
        .get(&disc_id)
        .cloned()
        .ok_or_else(|| NexusError::NotFound(format!("Game {disc_id} not found")))?;
    Ok(Json(game))
}

pub async fn launch(
    State(state): State<AppState>,
    payload: Result<Json<LaunchRequest>, JsonRejection>,
) -> ApiResult<Json<LaunchResponse>> {
    let Json(request) = payload?;

    let disc_id = request
        .disc_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| NexusError::BadRequest("discID required".into()))?;

    let iso_path = state
        .game_map
        .resolve(&disc_id)
        .await?
        .ok_or_else(|| NexusError::NotFound(format!("ISO not found for {disc_id}")))?;
    if !tokio::fs::try_exists(&iso_path).await.unwrap_or(false) {
        let message = format!("ISO not found for {disc_id}: {:?}", iso_path);
        return Err(NexusError::NotFound(message).into());
    }

    let save_state = request
        .save_state
        .filter(|s| !s.trim().is_empty())
        .map(|requested| {
            let snapshot = state.library.snapshot();
            let states = snapshot
                .get(&disc_id)
                .map(|game| game.save_states.as_slice())
                .unwrap_or_default();
            resolve_save_state(states, &requested)
        });

    info!("Launch requested for {} (state: {:?})", disc_id, save_state);
    state
        .launcher
        .launch(&iso_path, save_state.as_deref())
        .await?;

    Ok(Json(LaunchResponse {
        success: true,
        message: format!("Launched {disc_id}"),
    }))
}

pub async fn icon(
    State(state): State<AppState>,
    Path(disc_id): Path<String>,
) -> ApiResult<Response> {
    let snapshot = state.library.snapshot();
    let icon_path = snapshot
        .get(&disc_id)
        .and_then(|game| game.icon_path.clone())
        .ok_or_else(|| NexusError::NotFound(format!("No icon for {disc_id}")))?;

    let bytes = tokio::fs::read(&icon_path).await.map_err(|e| {
        debug!("Icon {:?} unreadable: {}", icon_path, e);
        NexusError::NotFound(format!("No icon for {disc_id}"))
    })?;

    Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response())
}

pub async fn get_config(State(state): State<AppState>) -> ApiResult<Json<Settings>> {
    Ok(Json(state.config.get().await?))
}

pub async fn set_config(
    State(state): State<AppState>,
    payload: Result<Json<Settings>, JsonRejection>,
) -> ApiResult<Json<Settings>> {
    let Json(settings) = payload?;
    Ok(Json(state.config.set(settings).await?))
}

pub async fn get_game_map(State(state): State<AppState>) -> ApiResult<Json<GameMap>> {
    Ok(Json(state.game_map.list_all().await?))
}

pub async fn set_game_map(
    State(state): State<AppState>,
    payload: Result<Json<GameMap>, JsonRejection>,
) -> ApiResult<Json<GameMap>> {
    let Json(map) = payload?;
    Ok(Json(state.game_map.set_all(map).await?))
}

pub async fn refresh(State(state): State<AppState>) -> Json<RefreshResponse> {
    let snapshot = state.library.rescan().await;
    Json(RefreshResponse {
        success: true,
        games_found: snapshot.len(),
    })
}
