use crate::cli::InitConfigArgs;
use crate::config::DEFAULT_CONFIG;
use crate::error::{CliError, Result};
use tracing::info;

pub fn run(args: InitConfigArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        return Err(CliError::Argument(format!(
            "'{}' already exists; pass --force to overwrite",
            args.output.display()
        )));
    }
    std::fs::write(&args.output, DEFAULT_CONFIG)?;
    info!("Wrote default configuration to '{}'.", args.output.display());
    println!("Wrote default configuration to '{}'.", args.output.display());
    Ok(())
}
