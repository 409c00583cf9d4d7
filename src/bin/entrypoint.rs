use anyhow::Context;
use booking_ops::config::EntrypointArgs;
use booking_ops::domain::model::CommandSpec;
use booking_ops::utils::{logger, validation::Validate};
use booking_ops::{Entrypoint, EntrypointSettings, OpsConfig, OpsError, SystemRunner};
use clap::Parser;
use std::time::Duration;

fn main() {
    let args = EntrypointArgs::parse();

    let mut settings = match EntrypointSettings::from_process_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };
    if let Some(secs) = args.timeout {
        settings.readiness_timeout = Some(Duration::from_secs(secs));
    }

    // production 使用 JSON 日誌
    if settings.environment.is_production() {
        logger::init_container_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    let handoff = match prepare(&args, &settings) {
        Ok(handoff) => handoff,
        Err(e) => {
            tracing::error!(
                "❌ Startup failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    if let Err(e) = exec(&handoff) {
        tracing::error!("❌ {:#}", e);
        std::process::exit(127);
    }
}

fn prepare(args: &EntrypointArgs, settings: &EntrypointSettings) -> Result<CommandSpec, OpsError> {
    let config = OpsConfig::load_or_default(&args.config)?;
    config.validate()?;

    // 處理完啟動流程後即關閉 runtime，再交棒給主程序
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let runner = SystemRunner::new();
    runtime.block_on(Entrypoint::new(settings, &config, &runner).prepare(&args.command))
}

#[cfg(unix)]
fn exec(command: &CommandSpec) -> anyhow::Result<()> {
    use std::os::unix::process::CommandExt;

    // exec 只在失敗時返回
    let err = std::process::Command::new(&command.program)
        .args(&command.args)
        .exec();
    Err(err).with_context(|| format!("failed to exec `{}`", command.display()))
}

#[cfg(not(unix))]
fn exec(command: &CommandSpec) -> anyhow::Result<()> {
    let status = std::process::Command::new(&command.program)
        .args(&command.args)
        .status()
        .with_context(|| format!("failed to start `{}`", command.display()))?;
    std::process::exit(status.code().unwrap_or(1));
}
