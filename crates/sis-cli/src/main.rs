//! sis - Simple Installer System CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sis_cli::{Cli, Commands, cmd};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v.
    let default = if cli.global.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();

    let global = &cli.global;
    match cli.command {
        Commands::Init => cmd::init::init(global),
        Commands::List => cmd::list::list(global).await,
        Commands::Info { packages } => cmd::info::info(global, &packages).await,
        Commands::Install {
            packages,
            force,
            dry_run,
        } => cmd::install::install(global, &packages, force, dry_run).await,
        Commands::Uninstall {
            packages,
            dependents,
        } => cmd::uninstall::uninstall(global, &packages, &dependents).await,
        Commands::Sources { packages, makefile } => {
            cmd::sources::sources(global, &packages, makefile).await
        }
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(())
        }
    }
}
