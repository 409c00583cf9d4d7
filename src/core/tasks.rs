use crate::config::env_file::{ensure_env_file, read_env_file, EnvFileStatus};
use crate::config::OpsConfig;
use crate::core::backup::BackupStore;
use crate::core::compose::Compose;
use crate::core::deploy::{DeployDriver, DeployOptions};
use crate::domain::model::{CommandSpec, Environment};
use crate::domain::ports::{CommandRunner, Prompter};
use crate::utils::error::{OpsError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Install,
    Dev,
    Test,
    TestCov,
    Lint,
    Format,
    Clean,
    Build,
    Start,
    Stop,
    Restart,
    Logs,
    Shell,
    DbInit,
    DbReset,
    DbMigrate,
    DbShell,
    Backup,
    Restore { file: Option<PathBuf> },
    DeployProd,
    SecurityScan,
    PerfTest,
    Docs,
    SetupEnv,
    Quality,
    Setup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Run(CommandSpec),
    /// 使用者未確認時中止整個任務
    Confirm { action: String, question: String },
    EnsureEnv,
    Backup,
    Restore { file: Option<PathBuf> },
    Deploy { environment: Environment },
    Print(Vec<String>),
    Task(Task),
}

/// 資料庫帳號與名稱：ops.toml 優先，其次 .env 的 POSTGRES_USER / POSTGRES_DB
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseIdentity {
    pub user: String,
    pub name: String,
}

impl DatabaseIdentity {
    pub fn resolve(config: &OpsConfig, env_vars: &BTreeMap<String, String>) -> Self {
        let pick = |explicit: &Option<String>, key: &str, fallback: &str| {
            explicit
                .clone()
                .or_else(|| env_vars.get(key).cloned().filter(|v| !v.is_empty()))
                .unwrap_or_else(|| fallback.to_string())
        };
        Self {
            user: pick(&config.database.user, "POSTGRES_USER", config.database_user()),
            name: pick(&config.database.name, "POSTGRES_DB", config.database_name()),
        }
    }
}

fn cmd(argv: &[&str]) -> Step {
    let mut parts = argv.iter().copied();
    let program = parts.next().unwrap_or_default();
    Step::Run(CommandSpec::new(program).args(parts))
}

impl Task {
    pub const ALL_NAMES: [&'static str; 26] = [
        "install",
        "dev",
        "test",
        "test-cov",
        "lint",
        "format",
        "clean",
        "build",
        "start",
        "stop",
        "restart",
        "logs",
        "shell",
        "db-init",
        "db-reset",
        "db-migrate",
        "db-shell",
        "backup",
        "restore",
        "deploy-prod",
        "security-scan",
        "perf-test",
        "docs",
        "setup-env",
        "quality",
        "setup",
    ];

    pub fn all() -> Vec<Task> {
        vec![
            Task::Install,
            Task::Dev,
            Task::Test,
            Task::TestCov,
            Task::Lint,
            Task::Format,
            Task::Clean,
            Task::Build,
            Task::Start,
            Task::Stop,
            Task::Restart,
            Task::Logs,
            Task::Shell,
            Task::DbInit,
            Task::DbReset,
            Task::DbMigrate,
            Task::DbShell,
            Task::Backup,
            Task::Restore { file: None },
            Task::DeployProd,
            Task::SecurityScan,
            Task::PerfTest,
            Task::Docs,
            Task::SetupEnv,
            Task::Quality,
            Task::Setup,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Task::Install => "install",
            Task::Dev => "dev",
            Task::Test => "test",
            Task::TestCov => "test-cov",
            Task::Lint => "lint",
            Task::Format => "format",
            Task::Clean => "clean",
            Task::Build => "build",
            Task::Start => "start",
            Task::Stop => "stop",
            Task::Restart => "restart",
            Task::Logs => "logs",
            Task::Shell => "shell",
            Task::DbInit => "db-init",
            Task::DbReset => "db-reset",
            Task::DbMigrate => "db-migrate",
            Task::DbShell => "db-shell",
            Task::Backup => "backup",
            Task::Restore { .. } => "restore",
            Task::DeployProd => "deploy-prod",
            Task::SecurityScan => "security-scan",
            Task::PerfTest => "perf-test",
            Task::Docs => "docs",
            Task::SetupEnv => "setup-env",
            Task::Quality => "quality",
            Task::Setup => "setup",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Task::Install => "Install application and development dependencies",
            Task::Dev => "Run the API locally with auto-reload",
            Task::Test => "Run the test suite",
            Task::TestCov => "Run the test suite with coverage reports",
            Task::Lint => "Run linters and type checks",
            Task::Format => "Format the code base",
            Task::Clean => "Remove caches and build artifacts",
            Task::Build => "Build container images",
            Task::Start => "Start the stack in the background",
            Task::Stop => "Stop the stack",
            Task::Restart => "Restart the stack",
            Task::Logs => "Follow the stack logs",
            Task::Shell => "Open a shell in the API container",
            Task::DbInit => "Create tables and initial data",
            Task::DbReset => "Drop and recreate the database",
            Task::DbMigrate => "Apply schema migrations",
            Task::DbShell => "Open psql in the database container",
            Task::Backup => "Dump the database into the backup directory",
            Task::Restore { .. } => "Restore the database from a dump",
            Task::DeployProd => "Deploy the production stack",
            Task::SecurityScan => "Run security scanners",
            Task::PerfTest => "Run the load test",
            Task::Docs => "Show where the API documentation is served",
            Task::SetupEnv => "Create .env from its template when missing",
            Task::Quality => "Format, lint and test",
            Task::Setup => "Install dependencies, create .env and build images",
        }
    }

    /// 任務的步驟清單（純函式，不執行任何命令）
    pub fn plan(&self, config: &OpsConfig, database: &DatabaseIdentity) -> Vec<Step> {
        let compose = Compose::plain(config);
        let api = config.api_service();
        let db = config.db_service();

        match self {
            Task::Install => vec![
                cmd(&["pip", "install", "-r", "requirements.txt"]),
                cmd(&["pip", "install", "-r", "requirements-dev.txt"]),
            ],
            Task::Dev => vec![cmd(&[
                "uvicorn",
                "app.main:app",
                "--reload",
                "--host",
                "0.0.0.0",
                "--port",
                "8000",
            ])],
            Task::Test => vec![cmd(&["pytest", "tests/", "-v"])],
            Task::TestCov => vec![cmd(&[
                "pytest",
                "tests/",
                "-v",
                "--cov=app",
                "--cov-report=html",
                "--cov-report=term-missing",
            ])],
            Task::Lint => vec![cmd(&["flake8", "app", "tests"]), cmd(&["mypy", "app"])],
            Task::Format => vec![cmd(&["black", "app", "tests"]), cmd(&["isort", "app", "tests"])],
            Task::Clean => vec![
                cmd(&[
                    "find", ".", "-type", "d", "-name", "__pycache__", "-prune", "-exec", "rm",
                    "-rf", "{}", "+",
                ]),
                cmd(&["find", ".", "-type", "f", "-name", "*.pyc", "-delete"]),
                cmd(&[
                    "rm",
                    "-rf",
                    ".pytest_cache",
                    ".mypy_cache",
                    "htmlcov",
                    ".coverage",
                ]),
            ],
            Task::Build => vec![Step::Run(compose.command(["build"]))],
            Task::Start => vec![Step::Run(compose.command(["up", "-d"]))],
            Task::Stop => vec![Step::Run(compose.command(["down"]))],
            Task::Restart => vec![Step::Run(compose.command(["restart"]))],
            Task::Logs => vec![Step::Run(compose.command(["logs", "-f"]))],
            Task::Shell => vec![Step::Run(compose.exec_interactive(api, ["/bin/bash"]))],
            Task::DbInit => vec![Step::Run(
                compose.exec(api, ["python", "-m", "app.db_init", "init"]),
            )],
            Task::DbReset => vec![
                Step::Confirm {
                    action: self.name().to_string(),
                    question: format!(
                        "⚠️ This drops every table in '{}'. Continue?",
                        database.name
                    ),
                },
                Step::Run(compose.exec(api, ["python", "-m", "app.db_init", "reset"])),
            ],
            Task::DbMigrate => vec![Step::Run(compose.exec(api, ["alembic", "upgrade", "head"]))],
            Task::DbShell => vec![Step::Run(compose.exec_interactive(
                db,
                ["psql", "-U", database.user.as_str(), "-d", database.name.as_str()],
            ))],
            Task::Backup => vec![Step::Backup],
            Task::Restore { file } => vec![
                Step::Confirm {
                    action: self.name().to_string(),
                    question: format!(
                        "⚠️ Restoring overwrites the current '{}' database. Continue?",
                        database.name
                    ),
                },
                Step::Restore { file: file.clone() },
            ],
            Task::DeployProd => vec![Step::Deploy {
                environment: Environment::Production,
            }],
            Task::SecurityScan => vec![cmd(&["bandit", "-r", "app"]), cmd(&["safety", "check"])],
            Task::PerfTest => vec![cmd(&[
                "locust",
                "-f",
                "tests/performance/locustfile.py",
                "--host=http://localhost:8000",
            ])],
            Task::Docs => {
                let mut lines = vec!["📚 API documentation:".to_string()];
                lines.extend(
                    config
                        .service_urls()
                        .into_iter()
                        .filter(|(name, _)| {
                            let name = name.to_ascii_lowercase();
                            name.contains("doc") || name == "api"
                        })
                        .map(|(name, url)| format!("  {:<12} {}", name, url)),
                );
                vec![Step::Print(lines)]
            }
            Task::SetupEnv => vec![Step::EnsureEnv],
            Task::Quality => vec![
                Step::Task(Task::Format),
                Step::Task(Task::Lint),
                Step::Task(Task::Test),
            ],
            Task::Setup => vec![
                Step::Task(Task::Install),
                Step::Task(Task::SetupEnv),
                Step::Task(Task::Build),
            ],
        }
    }

    /// Plan with composite tasks expanded in place.
    pub fn flattened_plan(&self, config: &OpsConfig, database: &DatabaseIdentity) -> Vec<Step> {
        self.plan(config, database)
            .into_iter()
            .flat_map(|step| match step {
                Step::Task(inner) => inner.flattened_plan(config, database),
                other => vec![other],
            })
            .collect()
    }
}

/// 依序執行任務步驟；任何步驟失敗即停止
pub struct TaskRunner<'a> {
    config: &'a OpsConfig,
    runner: &'a dyn CommandRunner,
    prompter: &'a dyn Prompter,
    root: PathBuf,
    interactive: bool,
    dry_run: bool,
}

impl<'a> TaskRunner<'a> {
    pub fn new(config: &'a OpsConfig, runner: &'a dyn CommandRunner, prompter: &'a dyn Prompter) -> Self {
        Self {
            config,
            runner,
            prompter,
            root: PathBuf::from("."),
            interactive: true,
            dry_run: false,
        }
    }

    pub fn with_root(mut self, root: impl AsRef<Path>) -> Self {
        self.root = root.as_ref().to_path_buf();
        self
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn database_identity(&self) -> Result<DatabaseIdentity> {
        let env_vars = read_env_file(&self.root.join(self.config.env_file_path()))?;
        Ok(DatabaseIdentity::resolve(self.config, &env_vars))
    }

    pub async fn execute(&self, task: &Task) -> Result<()> {
        let database = self.database_identity()?;
        let steps = task.flattened_plan(self.config, &database);
        tracing::info!("🚀 Running task '{}' ({} steps)", task.name(), steps.len());

        for step in &steps {
            self.execute_step(step, &database).await?;
        }

        tracing::info!("✅ Task '{}' completed", task.name());
        Ok(())
    }

    async fn execute_step(&self, step: &Step, database: &DatabaseIdentity) -> Result<()> {
        match step {
            Step::Run(command) => {
                if command.interactive {
                    tracing::info!("🐚 Opening interactive session: {}", command.display());
                }
                self.runner.run_checked(command).await?;
            }
            Step::Confirm { action, question } => {
                if !self.prompter.confirm(question)? {
                    tracing::warn!("🛑 {} cancelled by user", action);
                    return Err(OpsError::Aborted {
                        action: action.clone(),
                    });
                }
            }
            Step::EnsureEnv => {
                let status = ensure_env_file(
                    &self.root.join(self.config.env_file_path()),
                    &self.root.join(self.config.env_template_path()),
                    self.prompter,
                    false,
                    self.dry_run,
                )?;
                match status {
                    EnvFileStatus::Existing => {
                        println!("✅ {} already exists", self.config.env_file_path())
                    }
                    EnvFileStatus::WouldCreate => println!(
                        "🔍 Would create {} from {}",
                        self.config.env_file_path(),
                        self.config.env_template_path()
                    ),
                    EnvFileStatus::CreatedFromTemplate => println!(
                        "📝 Created {} from {}; edit it before starting the stack",
                        self.config.env_file_path(),
                        self.config.env_template_path()
                    ),
                }
            }
            Step::Backup => {
                let path = self.backup(database).await?;
                if self.dry_run {
                    println!("🔍 Would write backup to {}", path.display());
                } else {
                    println!("💾 Backup written to {}", path.display());
                }
            }
            Step::Restore { file } => self.restore(file.as_deref(), database).await?,
            Step::Deploy { environment } => {
                let options = DeployOptions {
                    environment: environment.clone(),
                    fresh_build: false,
                    interactive: self.interactive,
                    dry_run: self.dry_run,
                };
                DeployDriver::new(self.config, self.runner, self.prompter)
                    .with_root(&self.root)
                    .run(&options)
                    .await?;
            }
            Step::Print(lines) => {
                for line in lines {
                    println!("{}", line);
                }
            }
            Step::Task(inner) => {
                for step in inner.flattened_plan(self.config, database) {
                    Box::pin(self.execute_step(&step, database)).await?;
                }
            }
        }
        Ok(())
    }

    fn backup_store(&self) -> BackupStore {
        BackupStore::new(self.root.join(self.config.backup_directory()))
    }

    async fn backup(&self, database: &DatabaseIdentity) -> Result<PathBuf> {
        let compose = Compose::plain(self.config);
        let dump = self
            .runner
            .run_checked(
                &compose
                    .exec(
                        self.config.db_service(),
                        ["pg_dump", "-U", database.user.as_str(), database.name.as_str()],
                    )
                    .capture(),
            )
            .await?;

        let store = self.backup_store();
        let timestamp = chrono::Local::now();
        if self.dry_run {
            let path = store.directory().join(BackupStore::file_name_for(&timestamp));
            tracing::info!("🔍 [dry-run] skipping write of {}", path.display());
            return Ok(path);
        }
        store.write(&timestamp, &dump.stdout)
    }

    async fn restore(&self, file: Option<&Path>, database: &DatabaseIdentity) -> Result<()> {
        let store = self.backup_store();

        let path = match file {
            Some(path) => path.to_path_buf(),
            None => {
                let latest = store.latest()?;
                let hint = latest
                    .as_ref()
                    .map(|p| format!(" [{}]", p.display()))
                    .unwrap_or_default();
                let answer = self.prompter.ask(&format!("Backup file to restore{}:", hint))?;
                match (answer.trim(), latest) {
                    ("", Some(latest)) => latest,
                    ("", None) => {
                        return Err(OpsError::BackupError {
                            message: format!(
                                "no backup file given and none found in {}",
                                store.directory().display()
                            ),
                        })
                    }
                    (given, _) => PathBuf::from(given),
                }
            }
        };
        let path = if path.is_relative() && !path.exists() {
            self.root.join(&path)
        } else {
            path
        };

        let dump = store.read(&path)?;
        tracing::info!("♻️ Restoring {} ({} bytes)", path.display(), dump.len());

        let compose = Compose::plain(self.config);
        self.runner
            .run_checked(
                &compose
                    .exec(
                        self.config.db_service(),
                        ["psql", "-U", database.user.as_str(), "-d", database.name.as_str()],
                    )
                    .with_stdin(dump),
            )
            .await?;

        println!("✅ Restored {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> DatabaseIdentity {
        DatabaseIdentity::resolve(&OpsConfig::default(), &BTreeMap::new())
    }

    #[test]
    fn test_every_task_has_a_unique_name_and_plan() {
        let config = OpsConfig::default();
        let tasks = Task::all();
        assert_eq!(tasks.len(), Task::ALL_NAMES.len());

        for (task, name) in tasks.iter().zip(Task::ALL_NAMES) {
            assert_eq!(task.name(), name);
            assert!(!task.plan(&config, &identity()).is_empty(), "{name} has no steps");
        }
    }

    #[test]
    fn test_destructive_tasks_confirm_first() {
        let config = OpsConfig::default();
        for task in [Task::DbReset, Task::Restore { file: None }] {
            let plan = task.plan(&config, &identity());
            assert!(matches!(plan[0], Step::Confirm { .. }), "{}", task.name());
        }
    }

    #[test]
    fn test_composite_tasks_are_flattened() {
        let config = OpsConfig::default();
        let steps = Task::Quality.flattened_plan(&config, &identity());

        assert!(steps.iter().all(|s| !matches!(s, Step::Task(_))));
        let programs: Vec<&str> = steps
            .iter()
            .filter_map(|s| match s {
                Step::Run(c) => Some(c.program.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(programs, vec!["black", "isort", "flake8", "mypy", "pytest"]);
    }

    #[derive(Default)]
    struct ProgramLog(std::sync::Mutex<Vec<String>>);

    #[async_trait::async_trait]
    impl CommandRunner for ProgramLog {
        async fn run(&self, command: &CommandSpec) -> Result<crate::domain::model::CommandOutput> {
            self.0.lock().unwrap().push(command.program.clone());
            Ok(crate::domain::model::CommandOutput::ok())
        }
    }

    #[tokio::test]
    async fn test_nested_task_step_runs_its_plan() {
        let config = OpsConfig::default();
        let log = ProgramLog::default();
        let prompter = crate::adapters::NonInteractivePrompter;

        TaskRunner::new(&config, &log, &prompter)
            .execute_step(&Step::Task(Task::Quality), &identity())
            .await
            .unwrap();

        assert_eq!(
            *log.0.lock().unwrap(),
            vec!["black", "isort", "flake8", "mypy", "pytest"]
        );
    }

    #[test]
    fn test_database_identity_precedence() {
        let mut env_vars = BTreeMap::new();
        env_vars.insert("POSTGRES_USER".to_string(), "hotel".to_string());
        env_vars.insert("POSTGRES_DB".to_string(), "bookings".to_string());

        let defaults = OpsConfig::default();
        let from_env = DatabaseIdentity::resolve(&defaults, &env_vars);
        assert_eq!(from_env.user, "hotel");
        assert_eq!(from_env.name, "bookings");

        let explicit = OpsConfig::from_toml_str("[database]\nuser = \"admin\"\n").unwrap();
        let mixed = DatabaseIdentity::resolve(&explicit, &env_vars);
        assert_eq!(mixed.user, "admin");
        assert_eq!(mixed.name, "bookings");
    }

    #[test]
    fn test_db_shell_uses_resolved_identity() {
        let config = OpsConfig::default();
        let database = DatabaseIdentity {
            user: "hotel".to_string(),
            name: "bookings".to_string(),
        };
        match &Task::DbShell.plan(&config, &database)[0] {
            Step::Run(command) => {
                assert!(command.interactive);
                assert_eq!(
                    command.display(),
                    "docker-compose exec db psql -U hotel -d bookings"
                );
            }
            other => panic!("unexpected step {:?}", other),
        }
    }
}
