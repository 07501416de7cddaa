use clap::Parser;
use querybind::cli::{run_cli, Cli};
use querybind::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    // Keep the guard alive so async log lines are flushed on exit
    let _guard = init_logging_with_config(&LogConfig::from_env())?;
    run_cli(Cli::parse())
}
