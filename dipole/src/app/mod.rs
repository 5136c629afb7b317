mod report;
mod runner;

pub use runner::RunArtifacts;

use crate::config::{Args, Config};
use crate::io::{load_snapshot, setup_output};
use crate::simulation::SimulationSetup;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use std::fs;
use std::path::PathBuf;
use tracing::info;

pub struct DipoleApplication {
    args: Args,
    config: Config,
}

impl DipoleApplication {
    pub fn from_cli() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    pub fn from_args(args: Args) -> Result<Self> {
        let config = load_config(&args)?;
        Ok(Self { args, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(self) -> Result<RunArtifacts> {
        setup_output(self.args.log_file.as_ref(), self.args.verbose);
        info!("Configuration loaded from: {}", self.args.config_file);

        self.config
            .validate()
            .wrap_err("Invalid simulation configuration")?;

        let out_dir = PathBuf::from(&self.config.output.directory);
        fs::create_dir_all(&out_dir)
            .wrap_err_with(|| format!("Unable to create output directory: {}", out_dir.display()))?;

        let setup = build_setup(&self.config)?;
        runner::execute(&self.config, setup, &out_dir)
    }
}

/// Read the YAML file named on the command line and fold the CLI overrides
/// into it.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::from_file(&args.config_file)?;

    if let Some(temperature) = args.temperature {
        config.temperature = temperature;
    }
    if let Some(sweeps) = args.sweeps {
        config.run.sweeps = sweeps;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(ref path) = args.initial_state {
        config.initial_state = Some(path.clone());
    }
    if let Some(ref dir) = args.output_dir {
        config.output.directory = dir.clone();
    }

    Ok(config)
}

fn build_setup(config: &Config) -> Result<SimulationSetup> {
    let mut setup = config
        .to_setup()
        .wrap_err("Invalid simulation configuration")?;

    if let Some(ref path) = config.initial_state {
        info!("Seeding dipoles from snapshot: {}", path);
        let moments = load_snapshot(path)?;
        setup = setup.with_initial_state(moments);
    }

    Ok(setup)
}
