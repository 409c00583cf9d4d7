use crate::config::{EntrypointSettings, OpsConfig};
use crate::core::readiness::{endpoint_from_url, ReadinessGate, POSTGRES_DEFAULT_PORT, REDIS_DEFAULT_PORT};
use crate::domain::model::CommandSpec;
use crate::domain::ports::CommandRunner;
use crate::utils::error::{OpsError, Result};

/// 容器啟動流程：等待相依服務（僅 production）、遷移、選擇性匯入初始資料
pub struct Entrypoint<'a> {
    settings: &'a EntrypointSettings,
    config: &'a OpsConfig,
    runner: &'a dyn CommandRunner,
}

impl<'a> Entrypoint<'a> {
    pub fn new(
        settings: &'a EntrypointSettings,
        config: &'a OpsConfig,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            settings,
            config,
            runner,
        }
    }

    /// The environment's timeout wins over the config file's.
    pub fn gate(&self) -> ReadinessGate {
        ReadinessGate::new(self.config.poll_interval())
            .with_timeout(self.settings.readiness_timeout.or(self.config.readiness_timeout()))
            .with_progress_every(self.config.progress_every())
    }

    /// Runs everything up to the handoff and returns the command to exec.
    pub async fn prepare(&self, command: &[String]) -> Result<CommandSpec> {
        let handoff = CommandSpec::from_argv(command).ok_or_else(|| OpsError::UsageError {
            message: "no command given to exec after startup".to_string(),
        })?;

        tracing::info!(
            "🚀 Container starting ({} environment)",
            self.settings.environment
        );

        if self.settings.environment.is_production() {
            self.wait_for_dependencies().await?;
        } else {
            tracing::debug!("Skipping readiness checks outside production");
        }

        tracing::info!("🗄️ Running database migrations");
        let migrate = self.command_from_config("entrypoint.migrate_command", self.config.migrate_command())?;
        self.runner.run_checked(&migrate).await?;

        if self.settings.create_initial_data {
            tracing::info!("🌱 Creating initial data");
            let seed = self.command_from_config("entrypoint.seed_command", self.config.seed_command())?;
            self.runner.run_checked(&seed).await?;
        }

        tracing::info!("▶️ Handing off to: {}", handoff.display());
        Ok(handoff)
    }

    async fn wait_for_dependencies(&self) -> Result<()> {
        let gate = self.gate();

        let targets = [
            ("database", "DATABASE_URL", &self.settings.database_url, POSTGRES_DEFAULT_PORT),
            ("cache", "REDIS_URL", &self.settings.redis_url, REDIS_DEFAULT_PORT),
        ];

        for (name, field, url, default_port) in targets {
            match url {
                Some(url) => {
                    let endpoint = endpoint_from_url(field, url, default_port)?;
                    gate.wait_for(name, &endpoint).await?;
                }
                None => tracing::warn!("⚠️ {} is not set, skipping {} readiness check", field, name),
            }
        }
        Ok(())
    }

    fn command_from_config(&self, field: &str, argv: Vec<String>) -> Result<CommandSpec> {
        CommandSpec::from_argv(&argv).ok_or_else(|| OpsError::ConfigValidationError {
            field: field.to_string(),
            message: "command is empty".to_string(),
        })
    }
}
