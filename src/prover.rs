use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::process::Command;
use tokio::sync::Mutex;

/// Validated, normalized inputs for one proof-generation run, plus the
/// SHA-256 hex digest of the username passed to the prover as `--user-hash`.
#[derive(Debug, Clone)]
pub struct ProofCommandArgs {
    pub username: String,
    pub ships_sunk: i64,
    pub total_shots: i64,
    pub hit_percentage: i64,
    pub winner: bool,
    pub user_hash: String,
}

impl ProofCommandArgs {
    pub fn new(
        username: String,
        ships_sunk: i64,
        total_shots: i64,
        hit_percentage: i64,
        winner: bool,
    ) -> Self {
        let user_hash = hex::encode(Sha256::digest(username.as_bytes()));
        Self {
            username,
            ships_sunk,
            total_shots,
            hit_percentage,
            winner,
            user_hash,
        }
    }

    /// Argument vector for the prover CLI. `--winner` is only appended for an
    /// actual win; the CLI declares it as an optional flag.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--prove".to_string(),
            "--username".to_string(),
            self.username.clone(),
            "--ships-sunk".to_string(),
            self.ships_sunk.to_string(),
            "--total-shots".to_string(),
            self.total_shots.to_string(),
            "--hit-percentage".to_string(),
            self.hit_percentage.to_string(),
        ];
        if self.winner {
            args.push("--winner".to_string());
            args.push("true".to_string());
        }
        args.push("--user-hash".to_string());
        args.push(self.user_hash.clone());
        args
    }

    /// Command string for error payloads, with the user-supplied username
    /// replaced so it is never echoed back to the client.
    pub fn redacted_command(&self, program: &str) -> String {
        let args: Vec<String> = self
            .to_args()
            .into_iter()
            .map(|a| {
                if a == self.username {
                    "<redacted>".to_string()
                } else {
                    a
                }
            })
            .collect();
        format!("{} {}", program, args.join(" "))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProverError {
    #[error("failed to spawn prover: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("prover exited with status {code:?}")]
    NonZeroExit { code: Option<i32>, stderr: String },
    #[error("prover timed out after {0:?}")]
    Timeout(Duration),
}

impl ProverError {
    /// Diagnostic text surfaced in the 500 response `details` field.
    pub fn details(&self) -> String {
        match self {
            ProverError::NonZeroExit { stderr, .. } => stderr.clone(),
            other => other.to_string(),
        }
    }
}

/// Collaborator that turns validated proof arguments into a process outcome.
/// Kept behind a trait so the HTTP layer can be tested with a double.
#[async_trait]
pub trait ProofGenerator: Send + Sync {
    async fn run(&self, args: &ProofCommandArgs) -> Result<Output, ProverError>;

    /// Program name used when reporting the constructed command.
    fn program(&self) -> &str;
}

/// Runs the external proof-generation binary in a fixed working directory.
///
/// Invocations are serialized through a Mutex: the prover is memory-hungry
/// and there is no admission control upstream, so at most one proof runs at
/// a time. Each run is bounded by `timeout`; a timed-out child is killed.
pub struct SubprocessProver {
    program: String,
    working_dir: PathBuf,
    timeout: Duration,
    mutex: Mutex<()>,
}

impl SubprocessProver {
    pub fn new(program: String, working_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            program,
            working_dir,
            timeout,
            mutex: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ProofGenerator for SubprocessProver {
    async fn run(&self, args: &ProofCommandArgs) -> Result<Output, ProverError> {
        let _guard = self.mutex.lock().await;

        tracing::info!(
            "Running prover: program={} user_hash={} ships_sunk={} total_shots={}",
            self.program,
            args.user_hash,
            args.ships_sunk,
            args.total_shots
        );

        let child = Command::new(&self.program)
            .args(args.to_args())
            .current_dir(&self.working_dir)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ProverError::Timeout(self.timeout))??;

        if !output.status.success() {
            return Err(ProverError::NonZeroExit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        tracing::info!(
            "Prover finished: {} bytes stdout",
            output.stdout.len()
        );

        Ok(output)
    }

    fn program(&self) -> &str {
        &self.program
    }
}
