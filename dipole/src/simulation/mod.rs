//! Metropolis Monte Carlo engine for a lattice of discrete-orientation dipoles
//!
//! One step picks a random site and a random orientation from the basis,
//! evaluates the O(N) energy decrease of that swap and accepts it with
//! probability min(1, exp(beta * decrease)). Steps are strictly sequential;
//! each instance owns its own seeded generator.

use crate::energy;
use crate::error::{DipoleError, Result};
use crate::lattice::{Lattice, LatticeKind};
use crate::observables::{self, Sample};
use crate::orientation::OrientationBasis;
use crate::params::SimulationParameters;
use crate::state::DipoleState;
use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Everything needed to build a [`DipoleSimulation`]
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSetup {
    /// Lattice spacing in nm
    pub spacing: f64,
    pub rows: usize,
    pub columns: usize,
    /// Initial temperature in K
    pub temperature: f64,
    /// Dipole strength in e*nm
    pub dipole_strength: f64,
    /// Number of allowed orientations (3 gives the clock model)
    pub orientations: usize,
    /// Relative permittivity of the surroundings
    pub eps_rel: f64,
    pub lattice: LatticeKind,
    /// External field in V/nm
    pub field: Vector2<f64>,
    /// Pre-seeded moments in index order; random when absent
    pub initial_state: Option<Vec<Vector2<f64>>>,
    /// RNG seed; drawn from entropy when absent
    pub seed: Option<u64>,
}

impl SimulationSetup {
    pub fn new(spacing: f64, rows: usize, columns: usize, temperature: f64, dipole_strength: f64) -> Self {
        Self {
            spacing,
            rows,
            columns,
            temperature,
            dipole_strength,
            orientations: 3,
            eps_rel: 1.0,
            lattice: LatticeKind::default(),
            field: Vector2::zeros(),
            initial_state: None,
            seed: None,
        }
    }

    pub fn with_orientations(mut self, orientations: usize) -> Self {
        self.orientations = orientations;
        self
    }

    pub fn with_eps_rel(mut self, eps_rel: f64) -> Self {
        self.eps_rel = eps_rel;
        self
    }

    pub fn with_lattice(mut self, lattice: LatticeKind) -> Self {
        self.lattice = lattice;
        self
    }

    pub fn with_field(mut self, field: Vector2<f64>) -> Self {
        self.field = field;
        self
    }

    pub fn with_initial_state(mut self, moments: Vec<Vector2<f64>>) -> Self {
        self.initial_state = Some(moments);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn n_dipoles(&self) -> usize {
        self.rows * self.columns
    }
}

/// Result of a single Metropolis trial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Accepted,
    Rejected,
    /// The drawn orientation was already in place
    Unchanged,
}

/// Counters accumulated since construction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    pub attempted: u64,
    pub accepted: u64,
    pub unchanged: u64,
}

impl RunStatistics {
    pub fn acceptance_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempted as f64
        }
    }
}

/// Probability of accepting a move that lowers the energy by `decrease`.
///
/// Exactly 1 for neutral or favourable moves.
pub fn acceptance_probability(beta: f64, decrease: f64) -> f64 {
    if decrease >= 0.0 {
        1.0
    } else {
        (beta * decrease).exp()
    }
}

/// Metropolis test: draw u in [0, 1) and accept iff u < exp(beta * decrease).
///
/// A NaN decrease is always rejected.
pub fn metropolis_accept<R: Rng + ?Sized>(beta: f64, decrease: f64, rng: &mut R) -> bool {
    let u: f64 = rng.gen();
    u < acceptance_probability(beta, decrease)
}

#[derive(Debug, Clone)]
pub struct DipoleSimulation {
    lattice: Lattice,
    orientations: OrientationBasis,
    state: DipoleState,
    params: SimulationParameters,
    rng: StdRng,
    stats: RunStatistics,
}

impl DipoleSimulation {
    pub fn new(setup: &SimulationSetup) -> Result<Self> {
        let lattice = Lattice::generate(setup.spacing, setup.rows, setup.columns, setup.lattice)?;
        let orientations = OrientationBasis::new(setup.orientations, setup.dipole_strength)?;
        let mut params = SimulationParameters::new(setup.temperature, setup.eps_rel)?;
        params.set_field(setup.field)?;

        let mut rng = match setup.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let state = match &setup.initial_state {
            Some(moments) => DipoleState::from_moments(moments, lattice.len())?,
            None => DipoleState::random(lattice.len(), &orientations, &mut rng),
        };

        info!(
            "Built {} lattice of {} x {} dipoles ({} orientations) at T = {:.2} K",
            lattice.kind,
            setup.rows,
            setup.columns,
            orientations.len(),
            params.temperature()
        );

        Ok(Self {
            lattice,
            orientations,
            state,
            params,
            rng,
            stats: RunStatistics::default(),
        })
    }

    /// One Metropolis trial on a random site
    pub fn step(&mut self) -> StepOutcome {
        self.stats.attempted += 1;

        let index = self.rng.gen_range(0..self.state.len());
        let trial = self
            .orientations
            .get(self.rng.gen_range(0..self.orientations.len()));
        if trial == self.state.moment(index) {
            self.stats.unchanged += 1;
            return StepOutcome::Unchanged;
        }

        let decrease =
            energy::energy_decrease(&self.lattice, &self.state, &self.params, index, trial);
        if metropolis_accept(self.params.beta(), decrease, &mut self.rng) {
            self.state.set_moment(index, trial);
            self.stats.accepted += 1;
            StepOutcome::Accepted
        } else {
            StepOutcome::Rejected
        }
    }

    /// Perform `steps` sequential trials; zero is a no-op.
    ///
    /// Returns the number of accepted moves.
    pub fn run(&mut self, steps: usize) -> u64 {
        let accepted_before = self.stats.accepted;
        for _ in 0..steps {
            self.step();
        }
        let accepted = self.stats.accepted - accepted_before;
        debug!("Ran {} steps, {} accepted", steps, accepted);
        accepted
    }

    /// Trials in `sweeps` sweeps; fails when the count does not fit in `usize`
    pub fn sweep_steps(&self, sweeps: usize) -> Result<usize> {
        sweeps.checked_mul(self.n_dipoles()).ok_or_else(|| {
            DipoleError::InvalidConfiguration(format!(
                "{} sweeps of {} dipoles overflow the step counter",
                sweeps,
                self.n_dipoles()
            ))
        })
    }

    /// One sweep is N trials, on average one per dipole
    pub fn run_sweeps(&mut self, sweeps: usize) -> Result<u64> {
        let steps = self.sweep_steps(sweeps)?;
        Ok(self.run(steps))
    }

    /// Run `steps` trials and sample polarization and energy every `stride` steps.
    ///
    /// Samples are taken after steps stride, 2*stride, ...
    pub fn run_sampled(&mut self, steps: usize, stride: usize) -> Result<Vec<Sample>> {
        if stride == 0 {
            return Err(DipoleError::InvalidConfiguration(
                "sample stride must be at least 1".to_string(),
            ));
        }

        let mut samples = Vec::with_capacity(steps / stride);
        for done in 1..=steps {
            self.step();
            if done % stride == 0 {
                let sample = self.sample();
                debug!(
                    "step {}: P = [{:+.6}, {:+.6}], U = {:.8} eV",
                    sample.step, sample.polarization.x, sample.polarization.y, sample.energy
                );
                samples.push(sample);
            }
        }
        Ok(samples)
    }

    pub fn sample(&self) -> Sample {
        Sample {
            step: self.stats.attempted,
            polarization: self.polarization(),
            energy: self.energy(),
        }
    }

    /// Net dipole moment (O(N))
    pub fn polarization(&self) -> Vector2<f64> {
        observables::polarization(&self.state)
    }

    /// Full internal energy in eV (O(N^2))
    pub fn energy(&self) -> f64 {
        energy::total_energy(&self.lattice, &self.state, &self.params)
    }

    /// Energy decrease of putting `trial` at `index`, without applying it
    pub fn energy_decrease(&self, index: usize, trial: Vector2<f64>) -> f64 {
        energy::energy_decrease(&self.lattice, &self.state, &self.params, index, trial)
    }

    pub fn change_temperature(&mut self, temperature: f64) -> Result<()> {
        self.params.set_temperature(temperature)
    }

    pub fn temperature(&self) -> f64 {
        self.params.temperature()
    }

    pub fn beta(&self) -> f64 {
        self.params.beta()
    }

    pub fn change_electric_field(&mut self, x: f64, y: f64) -> Result<Vector2<f64>> {
        let field = Vector2::new(x, y);
        self.params.set_field(field)?;
        Ok(field)
    }

    pub fn field(&self) -> Vector2<f64> {
        self.params.field()
    }

    pub fn n_dipoles(&self) -> usize {
        self.state.len()
    }

    pub fn accepted(&self) -> u64 {
        self.stats.accepted
    }

    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn orientations(&self) -> &OrientationBasis {
        &self.orientations
    }

    pub fn state(&self) -> &DipoleState {
        &self.state
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }
}
