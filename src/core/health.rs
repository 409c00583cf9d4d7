use crate::core::compose::Compose;
use crate::domain::model::{ProbeKind, ProbeResult};
use crate::domain::ports::CommandRunner;
use crate::utils::error::Result;
use reqwest::Client;
use std::time::Duration;

/// 對資料庫、快取與 API 各做一次健康檢查，失敗只回報不中斷
pub struct HealthProber<'a> {
    runner: &'a dyn CommandRunner,
    client: Client,
}

impl<'a> HealthProber<'a> {
    pub fn new(runner: &'a dyn CommandRunner, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { runner, client })
    }

    pub async fn database(&self, compose: &Compose, service: &str, user: &str) -> ProbeResult {
        let command = compose.exec(service, ["pg_isready", "-U", user]).capture();
        let target = format!("{} (pg_isready)", service);

        match self.runner.run(&command).await {
            Ok(output) if output.success() => {
                probe(ProbeKind::Database, target, true, output.stdout_text())
            }
            Ok(output) => probe(
                ProbeKind::Database,
                target,
                false,
                format!("pg_isready exited with {:?}", output.code),
            ),
            Err(e) => probe(ProbeKind::Database, target, false, e.to_string()),
        }
    }

    pub async fn cache(&self, compose: &Compose, service: &str) -> ProbeResult {
        let command = compose.exec(service, ["redis-cli", "ping"]).capture();
        let target = format!("{} (redis-cli ping)", service);

        match self.runner.run(&command).await {
            Ok(output) if output.success() && output.stdout_text().eq_ignore_ascii_case("PONG") => {
                probe(ProbeKind::Cache, target, true, "PONG".to_string())
            }
            Ok(output) => probe(
                ProbeKind::Cache,
                target,
                false,
                format!(
                    "unexpected reply {:?} (exit {:?})",
                    output.stdout_text(),
                    output.code
                ),
            ),
            Err(e) => probe(ProbeKind::Cache, target, false, e.to_string()),
        }
    }

    pub async fn http(&self, url: &str) -> ProbeResult {
        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                let status = response.status();
                // 健康端點回傳 {"status": "healthy", ...}，非 JSON 也算通過
                let detail = match response.json::<serde_json::Value>().await {
                    Ok(body) => body
                        .get("status")
                        .and_then(|s| s.as_str())
                        .map(|s| format!("{} ({})", status, s))
                        .unwrap_or_else(|| status.to_string()),
                    Err(_) => status.to_string(),
                };
                probe(ProbeKind::Http, url.to_string(), true, detail)
            }
            Ok(response) => probe(
                ProbeKind::Http,
                url.to_string(),
                false,
                response.status().to_string(),
            ),
            Err(e) => probe(ProbeKind::Http, url.to_string(), false, e.to_string()),
        }
    }
}

fn probe(kind: ProbeKind, target: String, healthy: bool, detail: String) -> ProbeResult {
    if healthy {
        tracing::info!("✅ {} is healthy: {}", kind, detail);
    } else {
        tracing::warn!("❌ {} check failed: {}", kind, detail);
    }
    ProbeResult {
        kind,
        target,
        healthy,
        detail,
    }
}
