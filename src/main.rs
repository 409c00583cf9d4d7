use booking_ops::config::{OpsCli, OpsCommand};
use booking_ops::domain::ports::{CommandRunner, Prompter};
use booking_ops::utils::{logger, validation::Validate};
use booking_ops::{
    DryRunRunner, NonInteractivePrompter, OpsConfig, StdinPrompter, SystemRunner, Task, TaskRunner,
};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = OpsCli::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);
    tracing::debug!("CLI args: {:?}", cli);

    // `list` 不屬於任何任務
    let Some(task) = cli.command.task() else {
        debug_assert!(matches!(cli.command, OpsCommand::List));
        print_task_list();
        return;
    };

    // 載入並驗證配置
    let config = match OpsConfig::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    let runner: Box<dyn CommandRunner> = if cli.dry_run {
        println!("🔍 DRY RUN: commands for '{}'", task.name());
        Box::new(DryRunRunner)
    } else {
        Box::new(SystemRunner::new())
    };
    let prompter: Box<dyn Prompter> = if cli.non_interactive {
        Box::new(NonInteractivePrompter)
    } else {
        Box::new(StdinPrompter)
    };

    let task_runner = TaskRunner::new(&config, runner.as_ref(), prompter.as_ref())
        .interactive(!cli.non_interactive)
        .dry_run(cli.dry_run);

    if let Err(e) = task_runner.execute(&task).await {
        tracing::error!(
            "❌ Task '{}' failed: {} (Category: {:?}, Severity: {:?})",
            task.name(),
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }
}

fn print_task_list() {
    println!("📋 Available tasks:");
    for task in Task::all() {
        println!("  {:<14} {}", task.name(), task.description());
    }
}
