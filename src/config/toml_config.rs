use crate::utils::error::{OpsError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "ops.toml";

/// `ops.toml` 的完整結構；所有區段皆為選填，缺少時使用預設值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpsConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub compose: ComposeConfig,
    #[serde(default)]
    pub env_file: EnvFileConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub entrypoint: EntrypointConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposeConfig {
    pub program: Option<String>,
    pub base_file: Option<String>,
    pub production_overlay: Option<String>,
    pub api_service: Option<String>,
    pub db_service: Option<String>,
    pub cache_service: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvFileConfig {
    pub path: Option<String>,
    pub template: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub user: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployConfig {
    pub required_tools: Option<Vec<String>>,
    pub settle_seconds: Option<u64>,
    pub health_url: Option<String>,
    pub probe_timeout_seconds: Option<u64>,
    pub log_tail: Option<u32>,
    pub urls: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupConfig {
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntrypointConfig {
    pub migrate_command: Option<Vec<String>>,
    pub seed_command: Option<Vec<String>>,
    pub poll_interval_ms: Option<u64>,
    pub timeout_seconds: Option<u64>,
    pub progress_every: Option<u64>,
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

impl OpsConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 檔案不存在時回傳預設配置
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::debug!("📁 Loading configuration from: {}", path.display());
            Self::from_file(path)
        } else {
            tracing::debug!("📁 {} not found, using built-in defaults", path.display());
            Ok(Self::default())
        }
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| OpsError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${POSTGRES_USER})，未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::{Captures, Regex};
        use std::sync::OnceLock;

        static ENV_REF: OnceLock<Regex> = OnceLock::new();
        let re = ENV_REF.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex is valid")
        });

        re.replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn project_name(&self) -> &str {
        self.project.name.as_deref().unwrap_or("hotel-booking-api")
    }

    pub fn compose_program(&self) -> &str {
        self.compose.program.as_deref().unwrap_or("docker-compose")
    }

    pub fn compose_base_file(&self) -> &str {
        self.compose.base_file.as_deref().unwrap_or("docker-compose.yml")
    }

    pub fn compose_production_overlay(&self) -> &str {
        self.compose
            .production_overlay
            .as_deref()
            .unwrap_or("docker-compose.prod.yml")
    }

    pub fn api_service(&self) -> &str {
        self.compose.api_service.as_deref().unwrap_or("api")
    }

    pub fn db_service(&self) -> &str {
        self.compose.db_service.as_deref().unwrap_or("db")
    }

    pub fn cache_service(&self) -> &str {
        self.compose.cache_service.as_deref().unwrap_or("redis")
    }

    pub fn env_file_path(&self) -> &str {
        self.env_file.path.as_deref().unwrap_or(".env")
    }

    pub fn env_template_path(&self) -> &str {
        self.env_file.template.as_deref().unwrap_or(".env.example")
    }

    pub fn database_user(&self) -> &str {
        self.database.user.as_deref().unwrap_or("postgres")
    }

    pub fn database_name(&self) -> &str {
        self.database.name.as_deref().unwrap_or("hotel_booking")
    }

    pub fn required_tools(&self) -> Vec<String> {
        self.deploy
            .required_tools
            .clone()
            .unwrap_or_else(|| argv(&["docker", "docker-compose"]))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.deploy.settle_seconds.unwrap_or(10))
    }

    pub fn health_url(&self) -> &str {
        self.deploy
            .health_url
            .as_deref()
            .unwrap_or("http://localhost:8000/health")
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.deploy.probe_timeout_seconds.unwrap_or(5))
    }

    pub fn log_tail(&self) -> u32 {
        self.deploy.log_tail.unwrap_or(50)
    }

    /// 部署完成後顯示的服務網址（依名稱排序）
    pub fn service_urls(&self) -> Vec<(String, String)> {
        match &self.deploy.urls {
            Some(urls) => urls.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            None => [
                ("API", "http://localhost:8000"),
                ("API Docs", "http://localhost:8000/docs"),
                ("ReDoc", "http://localhost:8000/redoc"),
                ("Prometheus", "http://localhost:9090"),
                ("Grafana", "http://localhost:3000"),
                ("Keycloak", "http://localhost:8080"),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        }
    }

    pub fn backup_directory(&self) -> &str {
        self.backup.directory.as_deref().unwrap_or("backups")
    }

    pub fn migrate_command(&self) -> Vec<String> {
        self.entrypoint
            .migrate_command
            .clone()
            .unwrap_or_else(|| argv(&["alembic", "upgrade", "head"]))
    }

    pub fn seed_command(&self) -> Vec<String> {
        self.entrypoint
            .seed_command
            .clone()
            .unwrap_or_else(|| argv(&["python", "-m", "app.db_init", "create-initial-data"]))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.entrypoint.poll_interval_ms.unwrap_or(100))
    }

    pub fn readiness_timeout(&self) -> Option<Duration> {
        self.entrypoint.timeout_seconds.map(Duration::from_secs)
    }

    pub fn progress_every(&self) -> u64 {
        self.entrypoint.progress_every.unwrap_or(50)
    }
}

impl Validate for OpsConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("deploy.health_url", self.health_url(), &["http", "https"])?;
        validation::validate_path("compose.base_file", self.compose_base_file())?;
        validation::validate_path("compose.production_overlay", self.compose_production_overlay())?;
        validation::validate_path("env_file.path", self.env_file_path())?;
        validation::validate_path("env_file.template", self.env_template_path())?;
        validation::validate_path("backup.directory", self.backup_directory())?;
        validation::validate_non_empty_list("deploy.required_tools", &self.required_tools())?;
        validation::validate_command("entrypoint.migrate_command", &self.migrate_command())?;
        validation::validate_command("entrypoint.seed_command", &self.seed_command())?;

        if let Some(interval) = self.entrypoint.poll_interval_ms {
            validation::validate_positive_number("entrypoint.poll_interval_ms", interval, 1)?;
        }
        if let Some(every) = self.entrypoint.progress_every {
            validation::validate_positive_number("entrypoint.progress_every", every, 1)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_without_file() {
        let config = OpsConfig::load_or_default("/nonexistent/ops.toml").unwrap();

        assert_eq!(config.compose_program(), "docker-compose");
        assert_eq!(config.compose_production_overlay(), "docker-compose.prod.yml");
        assert_eq!(config.settle_delay(), Duration::from_secs(10));
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert!(config.readiness_timeout().is_none());
        assert_eq!(config.required_tools(), vec!["docker", "docker-compose"]);
        assert_eq!(config.service_urls().len(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml_config() {
        let toml_content = r#"
[compose]
program = "podman-compose"
db_service = "postgres"

[deploy]
settle_seconds = 0
health_url = "http://api.internal:8000/health"

[deploy.urls]
API = "http://api.internal:8000"

[entrypoint]
migrate_command = ["python", "-m", "app.db_init", "migrate"]
timeout_seconds = 30
"#;

        let config = OpsConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.compose_program(), "podman-compose");
        assert_eq!(config.db_service(), "postgres");
        assert_eq!(config.cache_service(), "redis");
        assert_eq!(config.settle_delay(), Duration::ZERO);
        assert_eq!(
            config.service_urls(),
            vec![("API".to_string(), "http://api.internal:8000".to_string())]
        );
        assert_eq!(config.migrate_command()[3], "migrate");
        assert_eq!(config.readiness_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("BOOKING_OPS_TEST_DB_USER", "hotel_admin");

        let toml_content = r#"
[database]
user = "${BOOKING_OPS_TEST_DB_USER}"
name = "${BOOKING_OPS_TEST_UNSET_VAR}"
"#;

        let config = OpsConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.database_user(), "hotel_admin");
        assert_eq!(config.database_name(), "${BOOKING_OPS_TEST_UNSET_VAR}");

        std::env::remove_var("BOOKING_OPS_TEST_DB_USER");
    }

    #[test]
    fn test_config_validation() {
        let invalid_url = OpsConfig::from_toml_str("[deploy]\nhealth_url = \"invalid-url\"\n").unwrap();
        assert!(invalid_url.validate().is_err());

        let no_tools = OpsConfig::from_toml_str("[deploy]\nrequired_tools = []\n").unwrap();
        assert!(no_tools.validate().is_err());

        let zero_interval = OpsConfig::from_toml_str("[entrypoint]\npoll_interval_ms = 0\n").unwrap();
        assert!(zero_interval.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = OpsConfig::from_toml_str("[deploy\nsettle_seconds = ").unwrap_err();
        assert!(matches!(err, OpsError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[project]\nname = \"file-test\"\n[backup]\ndirectory = \"dumps\"\n")
            .unwrap();

        let config = OpsConfig::load_or_default(temp_file.path()).unwrap();
        assert_eq!(config.project_name(), "file-test");
        assert_eq!(config.backup_directory(), "dumps");
    }
}
