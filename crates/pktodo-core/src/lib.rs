pub mod cache;
pub mod cli;
pub mod config;
pub mod controller;
pub mod gateway;
pub mod mutations;
pub mod render;
pub mod shell;
pub mod tabs;
pub mod view;

use std::ffi::OsString;
use std::io::Write;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use crate::controller::{Controller, ControllerSettings};
use crate::gateway::{HttpStore, MemoryStore, RemoteStore};
use crate::render::Renderer;
use crate::shell::Shell;

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        memory = cli.memory,
        "starting pktodo"
    );

    let cfg = config::Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    debug!(file = ?cfg.loaded_file, table = %cfg.store.table, "configuration resolved");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let settings = ControllerSettings::from_config(&cfg);
    let renderer = Renderer::new(&cfg);
    let memory = cli.memory;
    let pin = cli.pin;

    if memory {
        let controller = Controller::new(MemoryStore::new(), settings);
        runtime.block_on(drive(controller, renderer, pin))?;
    } else {
        let store = HttpStore::new(&cfg.store).context("failed to configure remote store")?;
        let controller = Controller::new(store, settings);
        runtime.block_on(drive(controller, renderer, pin))?;
    }

    info!("done");
    Ok(())
}

async fn drive<S: RemoteStore>(
    mut controller: Controller<S>,
    renderer: Renderer,
    pin: Option<String>,
) -> anyhow::Result<()> {
    if let Some(pin) = pin {
        let result = controller.unlock(&pin).await;
        debug!(?result, "startup unlock");
    }

    let mut shell = Shell::new(controller, renderer);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    shell.run(stdin, &mut stdout).await?;
    stdout.flush()?;
    Ok(())
}
