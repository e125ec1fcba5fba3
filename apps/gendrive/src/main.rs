use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use gendrive::Cli;
use gendrive::logging::init_logging;
use gendrive::plugin::{LoadedPlugin, PluginRuntime, locate_plugin};
use gendrive_core::{GenerationDriver, RunConfig};
use tracing::info;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    // Validate before anything is located or loaded; bad input exits 2.
    let config = match cli.run_args().validate() {
        Ok(config) => config,
        Err(e) => Cli::command().error(ErrorKind::ValueValidation, e).exit(),
    };

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &RunConfig) -> Result<()> {
    let path = locate_plugin(cli.plugin.as_deref())?;
    let plugin = LoadedPlugin::open(&path)
        .with_context(|| format!("loading backend plugin {}", path.display()))?;
    info!(id = plugin.id(), version = plugin.version(), "backend plugin ready");

    let mut runtime = PluginRuntime::new(plugin).with_profile_cache(cli.profile_cache());
    if cli.no_device_check {
        runtime = runtime.without_device_check();
    }

    let report = GenerationDriver::new(&runtime).run(config)?;
    report
        .write(config.output(), &mut io::stdout().lock())
        .context("writing report")?;
    Ok(())
}
