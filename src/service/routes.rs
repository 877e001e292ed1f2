//! HTTP API and Prometheus metrics server
//!
//! A thin JSON surface over the match recorder using Axum. Handlers call
//! the synchronous core directly; the in-memory store never blocks on I/O.

use crate::error::{LadderError, StorageError};
use crate::service::app::AppState;
use crate::service::health::{HealthCheck, HealthStatus};
use crate::types::{GameKind, PlayerId, TeamId};
use crate::validation::{parse_id, DoublesSubmission, SinglesSubmission};
use anyhow::{Context, Result};
use axum::{
    extract::{FromRequest, Path, Query, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Serves the ladder API, health and metrics endpoints
pub struct HttpServer {
    config: HttpServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Bind and serve until `shutdown` resolves
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid HTTP server address")?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        info!("HTTP server listening on http://{}", addr);

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("HTTP server shutdown signal received");
            })
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with every endpoint
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/metrics", get(metrics_handler))
        .route("/players", get(list_players).post(register_player))
        .route("/standings", get(standings))
        .route("/players/{id}", get(get_player))
        .route("/players/{id}/opponents", get(player_opponents))
        .route("/players/{id}/games", get(player_games))
        .route("/teams", get(list_teams))
        .route("/teams/{id}", get(get_team))
        .route("/games/singles", post(record_singles))
        .route("/games/doubles", post(record_doubles))
        .route("/games/recent", get(recent_games))
        .with_state(state)
}

/// A core failure rendered as `{ "error": kind, "message": text }`
#[derive(Debug)]
pub struct ApiError {
    error: LadderError,
    game: Option<GameKind>,
}

impl ApiError {
    fn for_game(game: GameKind) -> impl FnOnce(LadderError) -> Self {
        move |error| Self {
            error,
            game: Some(game),
        }
    }

    pub fn status(&self) -> StatusCode {
        match &self.error {
            LadderError::UnknownPlayer { .. } | LadderError::UnknownTeam { .. } => {
                StatusCode::NOT_FOUND
            }
            LadderError::Storage(StorageError::Conflict { .. }) => StatusCode::CONFLICT,
            LadderError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Text shown to whoever typed the result in
    pub fn message(&self) -> String {
        match &self.error {
            LadderError::InvalidInput { field } if field == "body" => {
                "Request body must be a JSON object.".to_string()
            }
            LadderError::InvalidInput { field } if field.ends_with("_score") => {
                "Scores must be integers! Clown.".to_string()
            }
            LadderError::InvalidInput { field } => format!("Invalid {} received! Clown.", field),
            LadderError::DuplicateCompetitor => match self.game {
                Some(GameKind::Doubles) => "You selected the same player twice! Clown.",
                _ => "You selected the same player! Clown.",
            }
            .to_string(),
            LadderError::UnknownPlayer { player_id } => {
                format!("Player {} does not exist! Clown.", player_id)
            }
            LadderError::UnknownTeam { team_id } => format!("Team {} does not exist.", team_id),
            LadderError::ScoreOutOfRange { side, .. } => {
                format!("Score for {} was outside the range of 0-11! Clown.", side)
            }
            LadderError::IllegalTiebreakScore | LadderError::IllegalWinByOne => {
                "If win-by-two (tiebreaker), the resulting score must be 11-9!".to_string()
            }
            LadderError::IndeterminateResult => "Surely somebody won the game?".to_string(),
            LadderError::Storage(StorageError::Conflict { .. }) => {
                "The ladder changed while saving this game, please submit it again.".to_string()
            }
            LadderError::Storage(_) => "The game could not be saved.".to_string(),
        }
    }
}

impl From<LadderError> for ApiError {
    fn from(error: LadderError) -> Self {
        Self { error, game: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.error.kind(),
            "message": self.message(),
        });
        (self.status(), Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// JSON object body; malformed bodies are rejected as `InvalidInput { field: "body" }`
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> ApiResult<Self> {
        let invalid_body = || ApiError::from(LadderError::invalid_input("body"));

        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| {
                debug!("Rejected request body: {}", rejection.body_text());
                invalid_body()
            })?;

        // Positional arrays would otherwise fill struct fields in order
        if !value.is_object() {
            debug!("Rejected non-object request body");
            return Err(invalid_body());
        }

        serde_json::from_value(value).map(JsonBody).map_err(|e| {
            debug!("Request body did not match the expected shape: {}", e);
            invalid_body()
        })
    }
}

fn player_id(raw: &str) -> std::result::Result<PlayerId, ApiError> {
    Ok(parse_id("player_id", Some(raw))?)
}

fn team_id(raw: &str) -> std::result::Result<TeamId, ApiError> {
    Ok(parse_id("team_id", Some(raw))?)
}

#[derive(Debug, Deserialize)]
struct NewPlayer {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RecentQuery {
    limit: Option<usize>,
}

async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "service": "foos-ladder",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/health",
            "/metrics",
            "/players",
            "/standings",
            "/teams",
            "/games/singles",
            "/games/doubles",
            "/games/recent"
        ]
    }))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    debug!("Health check requested");

    match HealthCheck::check(&state).await {
        Ok(health) => {
            let status = match health.status {
                HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::OK,
            };
            (status, Json(health)).into_response()
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy", "service": "foos-ladder" })),
            )
                .into_response()
        }
    }
}

async fn liveness_handler(State(state): State<Arc<AppState>>) -> Response {
    match HealthCheck::liveness_check(&state).await {
        Ok(HealthStatus::Unhealthy) | Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": HealthStatus::Unhealthy.to_string() })),
        )
            .into_response(),
        Ok(status) => Json(json!({ "status": status.to_string() })).into_response(),
    }
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    let metric_families = state.metrics().registry().gather();
    let encoder = TextEncoder::new();

    match encoder.encode_to_string(&metric_families) {
        Ok(output) => (
            [(header::CONTENT_TYPE, encoder.format_type().to_string())],
            output,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}

async fn list_players(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.recorder().roster()?))
}

async fn standings(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.recorder().standings()?))
}

async fn register_player(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<NewPlayer>,
) -> ApiResult<impl IntoResponse> {
    let player = state.recorder().register_player(&request.name)?;
    Ok((StatusCode::CREATED, Json(player)))
}

async fn get_player(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.recorder().player(player_id(&raw)?)?))
}

async fn player_opponents(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.opponents().summaries(player_id(&raw)?)?))
}

async fn player_games(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.recorder().player_history(player_id(&raw)?)?))
}

async fn list_teams(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.recorder().team_standings()?))
}

async fn get_team(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.recorder().team(team_id(&raw)?)?))
}

async fn record_singles(
    State(state): State<Arc<AppState>>,
    JsonBody(submission): JsonBody<SinglesSubmission>,
) -> ApiResult<impl IntoResponse> {
    let game = state
        .recorder()
        .record_singles(&submission)
        .map_err(ApiError::for_game(GameKind::Singles))?;
    Ok((StatusCode::CREATED, Json(game)))
}

async fn record_doubles(
    State(state): State<Arc<AppState>>,
    JsonBody(submission): JsonBody<DoublesSubmission>,
) -> ApiResult<impl IntoResponse> {
    let game = state
        .recorder()
        .record_doubles(&submission)
        .map_err(ApiError::for_game(GameKind::Doubles))?;
    Ok((StatusCode::CREATED, Json(game)))
}

async fn recent_games(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.recorder().recent_games(query.limit)?))
}
