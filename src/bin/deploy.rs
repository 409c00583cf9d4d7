use booking_ops::config::DeployArgs;
use booking_ops::domain::model::Environment;
use booking_ops::domain::ports::{CommandRunner, Prompter};
use booking_ops::utils::{logger, validation::Validate};
use booking_ops::{
    DeployDriver, DeployOptions, DryRunRunner, NonInteractivePrompter, OpsConfig, StdinPrompter,
    SystemRunner,
};
use clap::Parser;

#[tokio::main]
async fn main() {
    let args = DeployArgs::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    let config = match OpsConfig::load_or_default(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }

    let environment = Environment::parse(&args.environment);
    display_deploy_summary(&config, &args, &environment);

    let runner: Box<dyn CommandRunner> = if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - commands are printed, not executed");
        Box::new(DryRunRunner)
    } else {
        Box::new(SystemRunner::new())
    };
    let prompter: Box<dyn Prompter> = if args.non_interactive {
        Box::new(NonInteractivePrompter)
    } else {
        Box::new(StdinPrompter)
    };

    let options = DeployOptions {
        environment,
        fresh_build: args.fresh_build,
        interactive: !args.non_interactive,
        dry_run: args.dry_run,
    };

    match DeployDriver::new(&config, runner.as_ref(), prompter.as_ref())
        .run(&options)
        .await
    {
        Ok(report) => {
            let healthy = report.probes.iter().filter(|p| p.healthy).count();
            println!();
            println!("✅ Deployment complete ({:?})", report.duration);
            if !report.probes.is_empty() {
                println!("🩺 Health checks passed: {}/{}", healthy, report.probes.len());
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Deployment failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}

fn display_deploy_summary(config: &OpsConfig, args: &DeployArgs, environment: &Environment) {
    println!("📋 Deployment Summary:");
    println!("  Project: {}", config.project_name());
    println!("  Environment: {}", environment);
    println!("  Fresh build: {}", args.fresh_build);
    println!("  Compose file: {}", config.compose_base_file());
    if environment.is_production() {
        println!("  Overlay: {}", config.compose_production_overlay());
    }
    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }
    println!();
}
