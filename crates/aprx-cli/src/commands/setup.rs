use crate::cli::SetupArgs;
use crate::error::{CliError, Result};
use crate::progress::CliProgressHandler;
use aprx::progress::ProgressReporter;
use aprx::workflows::setup::{self, SetupConfig};
use tracing::info;

pub fn run(args: SetupArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.config)?;
    let mut config: SetupConfig = toml::from_str(&text)
        .map_err(|e| CliError::Config(format!("{}: {}", args.config.display(), e)))?;
    if args.stash_existing {
        config.stash_existing = true;
    }
    info!(
        config = %args.config.display(),
        restraints = config.restraints.len(),
        "running APR setup"
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let summary = setup::run(&config, &reporter)?;
    progress_handler.finish();

    println!(
        "Prepared {} windows ({} attach, {} pull, {} release) for {} restraint(s) under {}",
        summary.total_windows(),
        summary.attach_windows,
        summary.pull_windows,
        summary.release_windows,
        summary.restraint_count,
        summary.window_dir.display()
    );
    Ok(())
}
