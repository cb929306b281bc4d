use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::access_log::{AccessEntry, AccessLog};
use crate::prover::{ProofCommandArgs, ProofGenerator};
use crate::types::{
    parse_int_field, DebugResponse, ErrorResponse, GameResultEcho, GenerateProofRequest,
    HealthResponse, ProofResponse, ProverErrorResponse,
};

const MISSING_FIELDS_ERROR: &str =
    "Missing required fields: username, ships_sunk, and total_shots are required";
const SHIPS_SUNK_ERROR: &str = "Invalid ships sunk: must be a number between 0 and 9";
const TOTAL_SHOTS_ERROR: &str = "Invalid total shots: must be a number between 10 and 100";

/// Shared application state passed to all route handlers.
pub struct AppState {
    pub prover: Arc<dyn ProofGenerator>,
    pub access_log: Arc<dyn AccessLog>,
}

fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn validation_error(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(
            serde_json::to_value(ErrorResponse {
                success: false,
                error: message.to_string(),
            })
            .unwrap(),
        ),
    )
}

/// Display token for the response. Salted with the current time in millis,
/// so it is not reproducible and not a commitment to the proof content.
fn proof_hash(username: &str, ships_sunk: i64, total_shots: i64) -> String {
    let now_ms = Utc::now().timestamp_millis();
    let digest = Sha256::digest(
        format!("{username}{ships_sunk}{total_shots}{now_ms}").as_bytes(),
    );
    format!("0xBS{}", &hex::encode(digest)[..32])
}

/// POST /api/battleship/generate-proof — validate a game result and run the
/// external proof-generation binary.
///
/// Request body: GenerateProofRequest { username, game_result { ships_sunk,
/// total_shots, hit_percentage?, winner? } }
/// Response: ProofResponse on success, 400/500 error JSON otherwise.
pub async fn generate_proof_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateProofRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let username = req.username.unwrap_or_default();
    let game = req.game_result.unwrap_or_default();

    if username.is_empty() || game.ships_sunk.is_none() || game.total_shots.is_none() {
        tracing::warn!("Proof request rejected: missing required fields");
        return validation_error(MISSING_FIELDS_ERROR);
    }

    let ships_sunk = match game.ships_sunk.as_ref().and_then(parse_int_field) {
        Some(n) if (0..=9).contains(&n) => n,
        _ => {
            tracing::warn!("Proof request rejected: invalid ships_sunk {:?}", game.ships_sunk);
            return validation_error(SHIPS_SUNK_ERROR);
        }
    };

    let total_shots = match game.total_shots.as_ref().and_then(parse_int_field) {
        Some(n) if (10..=100).contains(&n) => n,
        _ => {
            tracing::warn!("Proof request rejected: invalid total_shots {:?}", game.total_shots);
            return validation_error(TOTAL_SHOTS_ERROR);
        }
    };

    let hit_percentage = game
        .hit_percentage
        .as_ref()
        .and_then(parse_int_field)
        .unwrap_or_else(|| ((ships_sunk as f64 / total_shots as f64) * 100.0).round() as i64);
    let winner = game.winner.unwrap_or(false);

    let args = ProofCommandArgs::new(username, ships_sunk, total_shots, hit_percentage, winner);

    tracing::info!(
        "New battleship proof request: user_hash={} ships_sunk={} total_shots={} hit_percentage={} winner={}",
        args.user_hash,
        ships_sunk,
        total_shots,
        hit_percentage,
        winner
    );

    match state.prover.run(&args).await {
        Ok(_) => {
            tracing::info!("Battleship proof generated and verified");
            (
                StatusCode::OK,
                Json(
                    serde_json::to_value(ProofResponse {
                        success: true,
                        proof_hash: proof_hash(&args.username, ships_sunk, total_shots),
                        username: args.username.clone(),
                        game_result: GameResultEcho {
                            ships_sunk,
                            total_shots,
                            hit_percentage,
                            winner,
                        },
                        timestamp: Utc::now().timestamp(),
                        verified: true,
                    })
                    .unwrap(),
                ),
            )
        }
        Err(e) => {
            tracing::error!("Proof generation error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(
                    serde_json::to_value(ProverErrorResponse {
                        success: false,
                        error: "Could not generate proof".to_string(),
                        details: e.details(),
                        command: args.redacted_command(state.prover.program()),
                    })
                    .unwrap(),
                ),
            )
        }
    }
}

/// GET /api/battleship/debug — Debug endpoint.
pub async fn debug_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(
            serde_json::to_value(DebugResponse {
                status: "ok".to_string(),
                timestamp: iso_timestamp(),
                message: "Battleship ZK Proof API is working".to_string(),
            })
            .unwrap(),
        ),
    )
}

/// GET /battleship/health — Health check endpoint.
pub async fn health_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(
            serde_json::to_value(HealthResponse {
                status: "ok".to_string(),
                timestamp: iso_timestamp(),
            })
            .unwrap(),
        ),
    )
}

/// Records one access-log line per inbound request, whatever the outcome.
/// The sink swallows its own errors, so logging never affects the response.
pub async fn log_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let entry = AccessEntry {
        timestamp: iso_timestamp(),
        ip: request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        method: request.method().to_string(),
        url: request.uri().to_string(),
        user_agent: request
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string(),
    };
    state.access_log.record(entry).await;
    next.run(request).await
}

/// Build the axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> axum::Router {
    use axum::routing::{get, post};
    use tower_http::cors::{Any, CorsLayer};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    axum::Router::new()
        .route(
            "/api/battleship/generate-proof",
            post(generate_proof_handler),
        )
        .route("/api/battleship/debug", get(debug_handler))
        .route("/battleship/health", get(health_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            log_requests,
        ))
        .layer(cors)
        .with_state(state)
}
