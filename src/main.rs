mod access_log;
mod prover;
mod routes;
mod types;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::access_log::FileAccessLog;
use crate::prover::SubprocessProver;
use crate::routes::{build_router, AppState};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "battleship_proof_api=info".into()),
        )
        .init();

    // Prover binary and its working directory (the SP1 script crate lives in
    // a sibling directory of the service).
    let prover_bin = std::env::var("PROVER_BIN").unwrap_or_else(|_| "prove".to_string());
    let script_dir = std::env::var("SCRIPT_DIR").unwrap_or_else(|_| "../script".to_string());
    let timeout_secs: u64 = std::env::var("PROOF_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(300);

    tracing::info!(
        "Prover: {} (cwd: {}, timeout: {}s)",
        prover_bin,
        script_dir,
        timeout_secs
    );

    let prover = SubprocessProver::new(
        prover_bin,
        PathBuf::from(script_dir),
        Duration::from_secs(timeout_secs),
    );

    let log_path =
        std::env::var("ACCESS_LOG").unwrap_or_else(|_| "battleship_access.log".to_string());
    tracing::info!("Access log: {}", log_path);
    let access_log = FileAccessLog::new(PathBuf::from(log_path));

    // Build application state
    let state = Arc::new(AppState {
        prover: Arc::new(prover),
        access_log: Arc::new(access_log),
    });

    // Build router
    let app = build_router(state);

    // Determine port from env or default
    let port = std::env::var("PORT").unwrap_or_else(|_| "4001".to_string());
    let addr = format!("0.0.0.0:{}", port);

    tracing::info!("Battleship ZK Proof Server running at http://localhost:{}", port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            panic!("Failed to bind to {}: {}", addr, e);
        });

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap_or_else(|e| {
        panic!("Server error: {}", e);
    });
}
