use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

/// One access-log record: timestamp, client address, method, URL, user agent.
#[derive(Debug, Clone)]
pub struct AccessEntry {
    pub timestamp: String,
    pub ip: String,
    pub method: String,
    pub url: String,
    pub user_agent: String,
}

impl AccessEntry {
    pub fn format_line(&self) -> String {
        format!(
            "[{}] IP: {} | Method: {} | URL: {} | User-Agent: {}\n",
            self.timestamp, self.ip, self.method, self.url, self.user_agent
        )
    }
}

/// Sink for access-log entries. Recording never fails from the caller's
/// point of view; sinks deal with their own errors.
#[async_trait]
pub trait AccessLog: Send + Sync {
    async fn record(&self, entry: AccessEntry);
}

/// Appends one line per entry to a log file.
///
/// The file is opened in append mode for each write, so concurrent appends
/// rely on the OS append semantics for small writes. Write errors are logged
/// and swallowed; they must never affect the HTTP response.
pub struct FileAccessLog {
    path: PathBuf,
}

impl FileAccessLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl AccessLog for FileAccessLog {
    async fn record(&self, entry: AccessEntry) {
        let line = entry.format_line();
        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(&self.path)
                .await?;
            file.write_all(line.as_bytes()).await?;
            // tokio files buffer internally; flush before drop or the
            // write may be lost.
            file.flush().await
        }
        .await;

        if let Err(e) = result {
            tracing::error!("Error writing to log file {}: {}", self.path.display(), e);
        }
    }
}
