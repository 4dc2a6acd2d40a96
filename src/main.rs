// Assay - command line entry point

use anyhow::Context;
use clap::Parser;

use assay::cli::{Cli, Commands};
use assay::commands::{analyze, config};
use assay::logging::init_tracing;
use assay::ConfigService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let service = ConfigService::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Analyze(args) => {
            let report = analyze::run_analyze(&args, service.get_config())
                .await
                .context("analysis failed")?;
            analyze::write_report(&report, args.report.as_deref())
                .context("failed to write report")?;
        }
        Commands::Config { init } => {
            if init {
                if config::init_config(&service)? {
                    eprintln!("wrote default config to {}", service.config_path().display());
                } else {
                    eprintln!("config already exists at {}", service.config_path().display());
                }
            }
            println!("{}", config::show_config(&service)?);
        }
    }
    Ok(())
}
