use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of POST /api/battleship/generate-proof.
///
/// Every field is optional so the handler can produce the exact
/// missing-fields error instead of a generic deserialization failure.
#[derive(Debug, Deserialize)]
pub struct GenerateProofRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub game_result: Option<GameResultBody>,
}

/// Raw game-result fields as submitted by the client.
///
/// `ships_sunk` and `total_shots` arrive as either JSON numbers or numeric
/// strings, so they are kept as raw values until validated.
#[derive(Debug, Default, Deserialize)]
pub struct GameResultBody {
    #[serde(default)]
    pub ships_sunk: Option<Value>,
    #[serde(default)]
    pub total_shots: Option<Value>,
    #[serde(default)]
    pub hit_percentage: Option<Value>,
    #[serde(default)]
    pub winner: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ProofResponse {
    pub success: bool,
    #[serde(rename = "proofHash")]
    pub proof_hash: String,
    pub username: String,
    pub game_result: GameResultEcho,
    /// Unix seconds.
    pub timestamp: i64,
    pub verified: bool,
}

/// Normalized game-result fields echoed back on success.
#[derive(Debug, Serialize)]
pub struct GameResultEcho {
    pub ships_sunk: i64,
    pub total_shots: i64,
    pub hit_percentage: i64,
    pub winner: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// 500 body for prover failures. `command` has the username redacted.
#[derive(Debug, Serialize)]
pub struct ProverErrorResponse {
    pub success: bool,
    pub error: String,
    pub details: String,
    pub command: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct DebugResponse {
    pub status: String,
    pub timestamp: String,
    pub message: String,
}

/// Interpret a raw JSON value the way the original API did: integers pass
/// through, numeric strings are parsed, everything else is rejected.
pub fn parse_int_field(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
