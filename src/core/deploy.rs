use crate::config::env_file::{ensure_env_file, EnvFileStatus};
use crate::config::OpsConfig;
use crate::core::compose::Compose;
use crate::core::health::HealthProber;
use crate::domain::model::{CommandSpec, DeployReport, Environment, ProbeResult};
use crate::domain::ports::{CommandRunner, Prompter};
use crate::utils::error::{OpsError, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub environment: Environment,
    pub fresh_build: bool,
    pub interactive: bool,
    /// Skips the settle delay and health probes and writes nothing to disk.
    pub dry_run: bool,
}

impl DeployOptions {
    pub fn new(environment: Environment, fresh_build: bool) -> Self {
        Self {
            environment,
            fresh_build,
            interactive: true,
            dry_run: false,
        }
    }
}

/// 部署流程：檢查工具、準備 .env、重建 Compose 堆疊、健康檢查、初始化
pub struct DeployDriver<'a> {
    config: &'a OpsConfig,
    runner: &'a dyn CommandRunner,
    prompter: &'a dyn Prompter,
    root: PathBuf,
}

impl<'a> DeployDriver<'a> {
    pub fn new(config: &'a OpsConfig, runner: &'a dyn CommandRunner, prompter: &'a dyn Prompter) -> Self {
        Self {
            config,
            runner,
            prompter,
            root: PathBuf::from("."),
        }
    }

    /// 相對路徑（.env、範本）以此目錄為基準
    pub fn with_root(mut self, root: impl AsRef<Path>) -> Self {
        self.root = root.as_ref().to_path_buf();
        self
    }

    pub async fn run(&self, options: &DeployOptions) -> Result<DeployReport> {
        let started = Instant::now();
        let mut steps = Vec::new();
        let compose = Compose::for_environment(self.config, &options.environment);

        tracing::info!(
            "🚀 Deploying {} ({} environment, fresh build: {})",
            self.config.project_name(),
            options.environment,
            options.fresh_build
        );

        self.check_prerequisites().await?;
        steps.push("prerequisites".to_string());

        let env_status = ensure_env_file(
            &self.root.join(self.config.env_file_path()),
            &self.root.join(self.config.env_template_path()),
            self.prompter,
            options.interactive,
            options.dry_run,
        )?;
        match env_status {
            EnvFileStatus::Existing => {}
            EnvFileStatus::CreatedFromTemplate => {
                println!("📝 Created {} from {}", self.config.env_file_path(), self.config.env_template_path())
            }
            EnvFileStatus::WouldCreate => {
                println!("🔍 Would create {} from {}", self.config.env_file_path(), self.config.env_template_path())
            }
        }
        steps.push("env-file".to_string());

        tracing::info!("🛑 Stopping existing containers");
        self.runner
            .run_checked(&compose.command(["down", "--remove-orphans"]))
            .await?;
        steps.push("teardown".to_string());

        if options.fresh_build {
            tracing::warn!("🧹 Fresh build requested, removing images and volumes");
            self.runner
                .run_checked(&compose.command(["down", "--volumes", "--rmi", "all", "--remove-orphans"]))
                .await?;
            self.runner
                .run_checked(&CommandSpec::new("docker").args(["system", "prune", "-f"]))
                .await?;
            steps.push("purge".to_string());
        }

        if compose.uses_overlay() {
            tracing::info!("📦 Using production overlay {}", self.config.compose_production_overlay());
        }
        tracing::info!("🏗️ Building and starting services");
        self.runner
            .run_checked(&compose.command(["up", "-d", "--build"]))
            .await?;
        steps.push("up".to_string());

        let probes = if options.dry_run {
            tracing::info!("🔍 Skipping settle delay and health checks in dry-run mode");
            Vec::new()
        } else {
            let settle = self.config.settle_delay();
            if !settle.is_zero() {
                tracing::info!("⏳ Waiting {:?} for services to start", settle);
                tokio::time::sleep(settle).await;
            }
            let probes = self.probe_services(&compose).await?;
            steps.push("health-checks".to_string());
            probes
        };

        tracing::info!("🗄️ Initializing database");
        self.runner
            .run_checked(&compose.exec(
                self.config.api_service(),
                ["python", "-m", "app.db_init", "init"],
            ))
            .await?;
        steps.push("db-init".to_string());

        self.print_service_urls();
        steps.push("urls".to_string());

        println!();
        println!("📜 Recent logs:");
        let tail = format!("--tail={}", self.config.log_tail());
        self.runner
            .run_checked(&compose.command(["logs".to_string(), tail]))
            .await?;
        steps.push("logs".to_string());

        let report = DeployReport {
            environment: options.environment.clone(),
            fresh_build: options.fresh_build,
            overlay_used: compose.uses_overlay(),
            probes,
            steps,
            duration: started.elapsed(),
        };

        if report.all_healthy() {
            tracing::info!("🎉 Deployment finished in {:?}", report.duration);
        } else {
            tracing::warn!(
                "⚠️ Deployment finished in {:?} with failing health checks",
                report.duration
            );
        }

        Ok(report)
    }

    async fn check_prerequisites(&self) -> Result<()> {
        tracing::info!("🔧 Checking required tools");
        for tool in self.config.required_tools() {
            let output = self
                .runner
                .run(&CommandSpec::new(tool.clone()).arg("--version").capture())
                .await?;
            if !output.success() {
                return Err(OpsError::MissingTool { tool });
            }
            tracing::debug!("✅ {} {}", tool, output.stdout_text());
        }
        Ok(())
    }

    async fn probe_services(&self, compose: &Compose) -> Result<Vec<ProbeResult>> {
        tracing::info!("🩺 Running health checks");
        let prober = HealthProber::new(self.runner, self.config.probe_timeout())?;

        let results = vec![
            prober
                .database(compose, self.config.db_service(), self.config.database_user())
                .await,
            prober.cache(compose, self.config.cache_service()).await,
            prober.http(self.config.health_url()).await,
        ];

        for result in &results {
            let mark = if result.healthy { "✅" } else { "❌" };
            println!("{} {}: {}", mark, result.kind, result.detail);
        }
        Ok(results)
    }

    fn print_service_urls(&self) {
        println!();
        println!("🌐 Services:");
        for (name, url) in self.config.service_urls() {
            println!("  {:<12} {}", name, url);
        }
    }
}
