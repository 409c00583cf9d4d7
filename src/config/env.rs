use crate::domain::model::Environment;
use crate::utils::error::{OpsError, Result};
use std::collections::HashMap;
use std::time::Duration;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const REDIS_URL: &str = "REDIS_URL";
pub const ENVIRONMENT: &str = "ENVIRONMENT";
pub const CREATE_INITIAL_DATA: &str = "CREATE_INITIAL_DATA";
pub const READINESS_TIMEOUT_SECONDS: &str = "READINESS_TIMEOUT_SECONDS";

/// 容器啟動時從環境變數讀取的設定
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntrypointSettings {
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub environment: Environment,
    pub create_initial_data: bool,
    pub readiness_timeout: Option<Duration>,
}

impl EntrypointSettings {
    pub fn from_process_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let non_empty = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let readiness_timeout = match non_empty(READINESS_TIMEOUT_SECONDS) {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| OpsError::InvalidConfigValueError {
                    field: READINESS_TIMEOUT_SECONDS.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            database_url: non_empty(DATABASE_URL),
            redis_url: non_empty(REDIS_URL),
            environment: Environment::parse(&non_empty(ENVIRONMENT).unwrap_or_default()),
            create_initial_data: non_empty(CREATE_INITIAL_DATA)
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
            readiness_timeout,
        })
    }
}

pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
