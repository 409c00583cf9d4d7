use crate::domain::model::Endpoint;
use crate::utils::error::{OpsError, Result};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Instant;
use url::Url;

pub const POSTGRES_DEFAULT_PORT: u16 = 5432;
pub const REDIS_DEFAULT_PORT: u16 = 6379;

/// 從連線字串取出主機與埠號
///
/// The port falls back to the scheme's well-known port, then to `default_port`.
pub fn endpoint_from_url(field: &str, raw: &str, default_port: u16) -> Result<Endpoint> {
    let invalid = |reason: String| OpsError::InvalidConfigValueError {
        field: field.to_string(),
        value: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(format!("Invalid URL format: {}", e)))?;

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| invalid("URL has no host".to_string()))?;
    // IPv6 hosts come back bracketed
    let host = host.trim_start_matches('[').trim_end_matches(']').to_string();

    let port = url.port().unwrap_or(match url.scheme() {
        "postgres" | "postgresql" | "postgresql+asyncpg" | "postgresql+psycopg2" => {
            POSTGRES_DEFAULT_PORT
        }
        "redis" | "rediss" => REDIS_DEFAULT_PORT,
        _ => default_port,
    });

    Ok(Endpoint { host, port })
}

/// 固定間隔輪詢 TCP 連線，直到目標接受連線
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    interval: Duration,
    timeout: Option<Duration>,
    progress_every: u64,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            timeout: None,
            progress_every: 50,
        }
    }
}

impl ReadinessGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_progress_every(mut self, attempts: u64) -> Self {
        self.progress_every = attempts.max(1);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the number of attempts it took.
    pub async fn wait_for(&self, name: &str, endpoint: &Endpoint) -> Result<u64> {
        let started = Instant::now();
        let deadline = self.timeout.map(|t| started + t);
        let mut attempts: u64 = 0;

        tracing::info!("⏳ Waiting for {} at {}", name, endpoint);
        if self.timeout.is_none() {
            tracing::warn!("⚠️ No readiness timeout configured for {}, waiting indefinitely", name);
        }

        loop {
            attempts += 1;

            let connect = TcpStream::connect((endpoint.host.as_str(), endpoint.port));
            let outcome = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, connect).await {
                    Ok(result) => result,
                    Err(_) => return Err(self.timed_out(name, endpoint, started)),
                },
                None => connect.await,
            };

            match outcome {
                Ok(_stream) => {
                    tracing::info!(
                        "✅ {} is accepting connections ({} attempts, {:?})",
                        name,
                        attempts,
                        started.elapsed()
                    );
                    return Ok(attempts);
                }
                Err(e) => {
                    if attempts % self.progress_every == 0 {
                        tracing::info!(
                            "⏳ Still waiting for {} at {} after {:?}: {}",
                            name,
                            endpoint,
                            started.elapsed(),
                            e
                        );
                    } else {
                        tracing::trace!("{} not ready: {}", endpoint, e);
                    }
                }
            }

            if let Some(deadline) = deadline {
                if Instant::now() + self.interval >= deadline {
                    return Err(self.timed_out(name, endpoint, started));
                }
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    fn timed_out(&self, name: &str, endpoint: &Endpoint, started: Instant) -> OpsError {
        tracing::error!("❌ {} at {} never became ready", name, endpoint);
        OpsError::ReadinessTimeout {
            target: format!("{} ({})", name, endpoint),
            waited: started.elapsed(),
        }
    }
}
