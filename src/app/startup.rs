use clap::Parser;
use std::path::Path;
use std::process::ExitCode;

use super::cli::{Args, RunMode};
use crate::config::{generate_config, load_config, ConfigResult, DEFAULT_CONFIG_FILE};
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::init_logging;
use crate::transfer::{TransferOrchestrator, TransferPlan, TransferResult, TransferSummary};

/// Parse arguments, initialise logging and run the selected mode
pub async fn startup() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(
        args.log_level.as_deref(),
        args.log_format.as_deref(),
        args.log_file(),
        args.use_color(),
    ) {
        eprintln!("Unable to initialise logging: {}", e);
        return ExitCode::FAILURE;
    }

    log::debug!(
        "scan-smuggler {} (built {}, commit {})",
        env!("CARGO_PKG_VERSION"),
        crate::core::version::build_time(),
        crate::core::version::git_hash()
    );

    match args.mode() {
        Some(RunMode::GenerateConfig) => match run_generate(Path::new(DEFAULT_CONFIG_FILE)) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log_error_with_context(&e, "Generating configuration");
                ExitCode::FAILURE
            }
        },
        Some(RunMode::Transfer(path)) => match run_transfer(&path).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                log_error_with_context(&e, "Running transfer");
                ExitCode::FAILURE
            }
        },
        None => {
            log::error!("FATAL: use either --config <tenable.json> or --config-gen");
            ExitCode::FAILURE
        }
    }
}

/// Write the default configuration document to `path`, never overwriting
pub fn run_generate(path: &Path) -> ConfigResult<()> {
    generate_config(path)?;
    log::info!("Edit {} for your environment", path.display());
    Ok(())
}

/// Load the configuration and move every eligible scan once
pub async fn run_transfer(path: &Path) -> TransferResult<TransferSummary> {
    let config = load_config(path)?;
    log::info!("Loaded configuration from {}", path.display());

    let mut orchestrator = TransferOrchestrator::from_config(&config)?;
    let plan = TransferPlan::from_config(&config);
    Ok(orchestrator.run(&plan).await)
}
