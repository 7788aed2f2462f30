use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "pktodo",
    version,
    about = "PK Todo: a PIN-gated task list backed by a remote table"
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    /// Config file; defaults to $PKTODO_CONFIG, then the user config dir.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Keep records in memory instead of talking to the remote store.
    #[arg(long = "memory")]
    pub memory: bool,

    /// Unlock at startup instead of waiting for `unlock`.
    #[arg(long = "pin")]
    pub pin: Option<String>,
}

/// `-q` wins over `-v`; the shell is quiet unless asked.
fn log_level(verbose: u8, quiet: u8) -> &'static str {
    match (quiet, verbose) {
        (2.., _) => "error",
        (1, _) | (0, 0) => "warn",
        (0, 1) => "info",
        (0, 2) => "debug",
        (0, _) => "trace",
    }
}

/// Logs go to stderr; stdout carries the screen. `RUST_LOG` overrides the
/// flags.
pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level(verbose, quiet))
            .map_err(|e| anyhow!("invalid log filter: {e}"))?,
    };

    let stderr = std::io::stderr();
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(stderr.is_terminal())
        .try_init();

    // Tests and embedders may already have a subscriber.
    if let Err(err) = installed {
        debug!(error = %err, "keeping existing tracing subscriber");
    }
    Ok(())
}
