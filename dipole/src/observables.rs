//! Observables derived from a dipole configuration and from sampled series

use crate::state::DipoleState;
use nalgebra::Vector2;

/// Net dipole moment: vector sum of all current moments
pub fn polarization(state: &DipoleState) -> Vector2<f64> {
    Vector2::new(state.px.iter().sum(), state.py.iter().sum())
}

/// One checkpoint of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Attempted steps completed when the sample was taken
    pub step: u64,
    pub polarization: Vector2<f64>,
    pub energy: f64,
}

/// Running mean and variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance, 0 with fewer than two samples
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

impl Extend<f64> for RunningStats {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

/// Fluctuation susceptibility beta * (<|P|^2> - |<P>|^2) in (e nm)^2 / eV
pub fn fluctuation_susceptibility(samples: &[Vector2<f64>], beta: f64) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let n = samples.len() as f64;
    let mean: Vector2<f64> = samples.iter().sum::<Vector2<f64>>() / n;
    let mean_sq = samples.iter().map(|p| p.norm_squared()).sum::<f64>() / n;
    beta * (mean_sq - mean.norm_squared())
}

/// Heat capacity in units of k_B: beta^2 * (<U^2> - <U>^2)
pub fn heat_capacity(energies: &[f64], beta: f64) -> f64 {
    let mut stats = RunningStats::new();
    stats.extend(energies.iter().copied());
    beta * beta * stats.variance()
}
