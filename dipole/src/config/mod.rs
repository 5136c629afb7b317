//! Configuration management for dipole simulations
//!
//! This module handles the YAML configuration structures, their defaults,
//! and validation into the engine's typed setup.

mod args;

pub use args::Args;

use crate::error::{DipoleError, Result};
use crate::exact::{ChainModel, MAX_EXACT_CHAIN};
use crate::lattice::LatticeKind;
use crate::params::inverse_temperature;
use crate::simulation::SimulationSetup;
use crate::sweep::temperature_range;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration structure for a dipole simulation
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub lattice: LatticeConfig,
    pub dipole: DipoleParams,
    /// Initial temperature in K
    pub temperature: f64,
    /// External field [x, y] in V/nm
    #[serde(default)]
    pub field: [f64; 2],
    pub seed: Option<u64>,
    /// Snapshot file holding a previously saved state
    pub initial_state: Option<String>,
    #[serde(default)]
    pub run: RunParams,
    #[serde(default)]
    pub protocol: Protocol,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Lattice geometry. Counts are signed so that bad input can be reported
/// instead of failing to parse.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LatticeConfig {
    #[serde(default)]
    pub kind: LatticeKind,
    /// Spacing between neighbouring dipoles in nm
    pub spacing: f64,
    pub rows: i64,
    pub columns: i64,
}

/// Dipole parameters
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DipoleParams {
    /// Dipole strength in e*nm
    pub strength: f64,
    pub orientations: Option<i64>,
    pub eps_rel: Option<f64>,
}

impl DipoleParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        if self.orientations.is_none() {
            self.orientations = Some(3);
        }
        if self.eps_rel.is_none() {
            self.eps_rel = Some(1.0);
        }
        self
    }
}

/// Length of a plain run and how often it is sampled
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RunParams {
    /// Sweeps of N trial moves each
    pub sweeps: i64,
    /// Steps between samples; one sweep when absent
    pub sample_stride: Option<i64>,
}

impl Default for RunParams {
    fn default() -> Self {
        RunParams {
            sweeps: 300,
            sample_stride: None,
        }
    }
}

/// Temperatures either listed or generated from a range
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub enum TemperatureGrid {
    List(Vec<f64>),
    Range { start: f64, stop: f64, step: f64 },
}

impl TemperatureGrid {
    /// Every temperature of the grid, each checked to give a defined beta
    pub fn values(&self) -> Result<Vec<f64>> {
        let values = match self {
            TemperatureGrid::List(values) => values.clone(),
            TemperatureGrid::Range { start, stop, step } => temperature_range(*start, *stop, *step)?,
        };
        for &temperature in &values {
            inverse_temperature(temperature)?;
        }
        Ok(values)
    }
}

/// What to do with the simulation once it is built
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(tag = "type")]
pub enum Protocol {
    /// Run `run.sweeps` sweeps at the initial temperature, sampling as configured
    #[default]
    #[serde(rename = "equilibrate")]
    Equilibrate,
    /// Step through temperatures, recording the energy after each
    #[serde(rename = "temperature_ramp")]
    TemperatureRamp {
        temperatures: TemperatureGrid,
        sweeps_per_point: i64,
    },
    /// Field hysteresis loop along x, recording P_x
    #[serde(rename = "field_sweep")]
    FieldSweep {
        /// Peak field in V/nm
        strength: f64,
        points: i64,
        sweeps_per_point: i64,
        #[serde(default = "default_warmup_sweeps")]
        warmup_sweeps: i64,
    },
    /// Independent simulations per temperature, run in parallel
    #[serde(rename = "parallel_scan")]
    ParallelScan {
        temperatures: TemperatureGrid,
        equilibration_sweeps: i64,
        production_sweeps: i64,
    },
    /// Exact susceptibility of a short three-state chain. The chain takes its
    /// spacing, dipole strength and eps_rel from the lattice and dipole sections.
    #[serde(rename = "exact_chain")]
    ExactChain {
        sites: i64,
        temperatures: TemperatureGrid,
        /// Use the negative-coupling (antiparallel) chain
        #[serde(default)]
        antiparallel: bool,
    },
}

/// Output configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    /// Directory receiving snapshots, series and frames
    #[serde(default = "default_output_directory")]
    pub directory: String,
    /// Write an arrow-field frame before and after the run
    #[serde(default)]
    pub frames: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: default_output_directory(),
            frames: false,
        }
    }
}

// Default value functions
fn default_warmup_sweeps() -> i64 {
    300
}
fn default_output_directory() -> String {
    "saves".to_string()
}

/// Convert a signed count from the configuration into a step count
pub fn non_negative(name: &str, value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        DipoleError::InvalidConfiguration(format!("{name} must not be negative, got {value}"))
    })
}

/// A signed sweep count that must also fit in the step counter for `n` dipoles
fn sweep_count(name: &str, value: i64, n: usize) -> Result<usize> {
    let sweeps = non_negative(name, value)?;
    sweeps.checked_mul(n).ok_or_else(|| {
        DipoleError::InvalidConfiguration(format!(
            "{name} = {value} sweeps of {n} dipoles overflow the step counter"
        ))
    })?;
    Ok(sweeps)
}

fn positive_dimension(name: &str, value: i64) -> Result<usize> {
    match usize::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(DipoleError::InvalidDimension(format!(
            "{name} must be positive, got {value}"
        ))),
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> color_eyre::Result<Self> {
        use color_eyre::eyre::WrapErr;

        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Unable to read configuration file: {}", path.display()))?;
        let config = serde_yml::from_str::<Config>(&content)
            .wrap_err("Failed to parse configuration file")?
            .with_defaults();
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> color_eyre::Result<()> {
        let content = serde_yml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Apply defaults to all configuration sections
    pub fn with_defaults(mut self) -> Self {
        self.dipole = self.dipole.with_defaults();
        self
    }

    /// Check every section and return the first problem found
    pub fn validate(&self) -> Result<()> {
        let n = self.n_dipoles()?;
        if !(self.lattice.spacing.is_finite() && self.lattice.spacing > 0.0) {
            return Err(DipoleError::InvalidConfiguration(
                "lattice spacing must be positive".to_string(),
            ));
        }
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err(DipoleError::NumericDegeneracy(format!(
                "temperature must be positive, got {}",
                self.temperature
            )));
        }
        let eps_rel = self.dipole.eps_rel.unwrap_or(1.0);
        if !(eps_rel.is_finite() && eps_rel > 0.0) {
            return Err(DipoleError::InvalidConfiguration(format!(
                "eps_rel must be positive, got {eps_rel}"
            )));
        }
        if self.dipole.orientations.unwrap_or(3) < 1 {
            return Err(DipoleError::InvalidConfiguration(
                "orientations must be at least 1".to_string(),
            ));
        }

        sweep_count("run.sweeps", self.run.sweeps, n)?;
        if let Some(stride) = self.run.sample_stride {
            if stride < 1 {
                return Err(DipoleError::InvalidConfiguration(
                    "run.sample_stride must be at least 1".to_string(),
                ));
            }
        }

        match &self.protocol {
            Protocol::Equilibrate => {}
            Protocol::TemperatureRamp {
                temperatures,
                sweeps_per_point,
            } => {
                temperatures.values()?;
                sweep_count("sweeps_per_point", *sweeps_per_point, n)?;
            }
            Protocol::FieldSweep {
                strength,
                points,
                sweeps_per_point,
                warmup_sweeps,
            } => {
                if !strength.is_finite() {
                    return Err(DipoleError::InvalidConfiguration(
                        "field sweep strength must be finite".to_string(),
                    ));
                }
                if *points < 1 {
                    return Err(DipoleError::InvalidConfiguration(
                        "field sweep needs at least one point".to_string(),
                    ));
                }
                sweep_count("sweeps_per_point", *sweeps_per_point, n)?;
                sweep_count("warmup_sweeps", *warmup_sweeps, n)?;
            }
            Protocol::ParallelScan {
                temperatures,
                equilibration_sweeps,
                production_sweeps,
            } => {
                temperatures.values()?;
                sweep_count("equilibration_sweeps", *equilibration_sweeps, n)?;
                sweep_count("production_sweeps", *production_sweeps, n)?;
            }
            Protocol::ExactChain {
                sites,
                temperatures,
                ..
            } => {
                if *sites < 1 || *sites > MAX_EXACT_CHAIN as i64 {
                    return Err(DipoleError::InvalidConfiguration(format!(
                        "exact chain supports 1..={MAX_EXACT_CHAIN} sites, got {sites}"
                    )));
                }
                if !self.dipole.strength.is_finite() {
                    return Err(DipoleError::InvalidConfiguration(
                        "dipole strength must be finite".to_string(),
                    ));
                }
                temperatures.values()?;
            }
        }
        Ok(())
    }

    /// Validated engine setup; the seeded state, if any, is attached by the caller
    pub fn to_setup(&self) -> Result<SimulationSetup> {
        self.validate()?;
        let rows = positive_dimension("rows", self.lattice.rows)?;
        let columns = positive_dimension("columns", self.lattice.columns)?;
        let orientations = non_negative("orientations", self.dipole.orientations.unwrap_or(3))?;

        let mut setup = SimulationSetup::new(
            self.lattice.spacing,
            rows,
            columns,
            self.temperature,
            self.dipole.strength,
        )
        .with_orientations(orientations)
        .with_eps_rel(self.dipole.eps_rel.unwrap_or(1.0))
        .with_lattice(self.lattice.kind)
        .with_field(Vector2::new(self.field[0], self.field[1]));
        if let Some(seed) = self.seed {
            setup = setup.with_seed(seed);
        }
        Ok(setup)
    }

    /// Number of lattice sites, rows * columns
    pub fn n_dipoles(&self) -> Result<usize> {
        let rows = positive_dimension("rows", self.lattice.rows)?;
        let columns = positive_dimension("columns", self.lattice.columns)?;
        rows.checked_mul(columns).ok_or_else(|| {
            DipoleError::InvalidDimension(format!("{rows} x {columns} lattice is too large"))
        })
    }

    /// Sample stride in steps, defaulting to one sweep
    pub fn sample_stride(&self) -> Result<usize> {
        match self.run.sample_stride {
            Some(stride) => non_negative("run.sample_stride", stride),
            None => self.n_dipoles(),
        }
    }

    /// Three-state chain built from the configured spacing, strength and eps_rel
    pub fn chain_model(&self, antiparallel: bool) -> ChainModel {
        let model = ChainModel::new(
            self.lattice.spacing,
            self.dipole.strength,
            self.dipole.eps_rel.unwrap_or(1.0),
        );
        if antiparallel {
            model.reversed()
        } else {
            model
        }
    }
}
