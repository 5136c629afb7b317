//! Temperature ramps, field hysteresis loops and parallel temperature scans
//!
//! Ramps and loops drive one simulation through a sequence of parameter
//! values. A scan builds one independent simulation per temperature and runs
//! them in parallel, each with its own seed.

use crate::error::{DipoleError, Result};
use crate::observables::{fluctuation_susceptibility, RunningStats};
use crate::simulation::{DipoleSimulation, SimulationSetup};
use nalgebra::Vector2;
use rayon::prelude::*;
use tracing::info;

/// Set each temperature in turn, equilibrate for `sweeps_per_point` sweeps
/// and record (T, U).
pub fn temperature_ramp(
    sim: &mut DipoleSimulation,
    temperatures: &[f64],
    sweeps_per_point: usize,
) -> Result<Vec<(f64, f64)>> {
    let mut series = Vec::with_capacity(temperatures.len());
    for &temperature in temperatures {
        sim.change_temperature(temperature)?;
        sim.run_sweeps(sweeps_per_point)?;
        let energy = sim.energy();
        info!("T = {:8.2} K  U = {:+.8} eV", temperature, energy);
        series.push((temperature, energy));
    }
    Ok(series)
}

/// Evenly spaced temperatures from `start` up to (and including, within
/// rounding) `stop`.
pub fn temperature_range(start: f64, stop: f64, step: f64) -> Result<Vec<f64>> {
    if !(step.is_finite() && step > 0.0) || stop < start {
        return Err(DipoleError::InvalidConfiguration(format!(
            "temperature range needs step > 0 and stop >= start, got {start}..{stop} by {step}"
        )));
    }
    let count = ((stop - start) / step + 1e-9).floor() as usize + 1;
    Ok((0..count).map(|i| start + step * i as f64).collect())
}

/// Field values of a full hysteresis loop with `points` values per quarter:
/// up from zero, back down, down to the negative side, back up, and up again.
pub fn field_ladder(strength: f64, points: usize) -> Vec<f64> {
    if points == 0 {
        return Vec::new();
    }
    let p = points as i64;
    let scale = strength / points as f64;
    let rising = 0..p;
    let falling = (1..=p).rev();
    let negative = (0..p).map(|v| -v);
    let returning = (1..=p).rev().map(|v| -v);
    let repeat = 0..p;

    rising
        .chain(falling)
        .chain(negative)
        .chain(returning)
        .chain(repeat)
        .map(|v| v as f64 * scale)
        .collect()
}

/// Run a field loop along x and record (E_x, P_x) after each point.
pub fn hysteresis_loop(
    sim: &mut DipoleSimulation,
    strength: f64,
    points: usize,
    warmup_sweeps: usize,
    sweeps_per_point: usize,
) -> Result<Vec<(f64, f64)>> {
    sim.run_sweeps(warmup_sweeps)?;

    let ladder = field_ladder(strength, points);
    let mut series = Vec::with_capacity(ladder.len());
    for field in ladder {
        sim.change_electric_field(field, 0.0)?;
        sim.run_sweeps(sweeps_per_point)?;
        let polarization = sim.polarization().x;
        info!("E = {:+.5} V/nm  P_x = {:+.6} e nm", field, polarization);
        series.push((field, polarization));
    }
    Ok(series)
}

/// Averages collected at one temperature of a scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPoint {
    pub temperature: f64,
    pub mean_energy: f64,
    pub energy_std: f64,
    /// Mean of |P| over the production samples
    pub mean_polarization: f64,
    pub susceptibility: f64,
    pub acceptance_rate: f64,
}

/// Independent simulations, one per temperature, run in parallel.
///
/// Point `i` is seeded with `base_seed + i`, so results do not depend on
/// thread scheduling.
pub fn parallel_temperature_scan(
    setup: &SimulationSetup,
    temperatures: &[f64],
    equilibration_sweeps: usize,
    production_sweeps: usize,
    base_seed: u64,
) -> Result<Vec<ScanPoint>> {
    temperatures
        .par_iter()
        .enumerate()
        .map(|(i, &temperature)| {
            let mut point_setup = setup.clone().with_seed(base_seed.wrapping_add(i as u64));
            point_setup.temperature = temperature;
            let mut sim = DipoleSimulation::new(&point_setup)?;

            sim.run_sweeps(equilibration_sweeps)?;

            let mut energy = RunningStats::new();
            let mut magnitude = RunningStats::new();
            sim.sweep_steps(production_sweeps)?;
            let mut polarizations: Vec<Vector2<f64>> =
                Vec::with_capacity(production_sweeps.min(1 << 16));
            for _ in 0..production_sweeps {
                sim.run_sweeps(1)?;
                let p = sim.polarization();
                energy.push(sim.energy());
                magnitude.push(p.norm());
                polarizations.push(p);
            }

            let point = ScanPoint {
                temperature,
                mean_energy: energy.mean(),
                energy_std: energy.std_dev(),
                mean_polarization: magnitude.mean(),
                susceptibility: fluctuation_susceptibility(&polarizations, sim.beta()),
                acceptance_rate: sim.stats().acceptance_rate(),
            };
            info!(
                "scan T = {:8.2} K  <U> = {:+.6} eV  <|P|> = {:.5}  chi = {:.5}",
                point.temperature, point.mean_energy, point.mean_polarization, point.susceptibility
            );
            Ok(point)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::LatticeKind;
    use approx::assert_relative_eq;

    fn setup() -> SimulationSetup {
        SimulationSetup::new(1.1, 3, 3, 300.0, 0.08789)
            .with_eps_rel(1.5)
            .with_lattice(LatticeKind::TriangularRhombus)
            .with_seed(5)
    }

    #[test]
    fn test_field_ladder_shape() {
        let ladder = field_ladder(3.0, 3);
        let expected = [
            0.0, 1.0, 2.0, 3.0, 2.0, 1.0, 0.0, -1.0, -2.0, -3.0, -2.0, -1.0, 0.0, 1.0, 2.0,
        ];
        assert_eq!(ladder.len(), expected.len());
        for (a, b) in ladder.iter().zip(expected) {
            assert_relative_eq!(*a, b);
        }
        assert!(field_ladder(1.0, 0).is_empty());
    }

    #[test]
    fn test_temperature_range() {
        let temps = temperature_range(0.0, 990.0, 10.0).unwrap();
        assert_eq!(temps.len(), 100);
        assert_relative_eq!(temps[99], 990.0);
        assert_eq!(temperature_range(5.0, 5.0, 1.0).unwrap(), vec![5.0]);
        assert!(temperature_range(10.0, 0.0, 1.0).is_err());
        assert!(temperature_range(0.0, 10.0, 0.0).is_err());
    }

    #[test]
    fn test_temperature_ramp_records_each_point() {
        let mut sim = DipoleSimulation::new(&setup()).unwrap();
        let temps = [400.0, 200.0, 50.0];
        let series = temperature_ramp(&mut sim, &temps, 5).unwrap();
        assert_eq!(series.len(), 3);
        for ((t, u), expected_t) in series.iter().zip(temps) {
            assert_eq!(*t, expected_t);
            assert!(u.is_finite());
        }
        assert_relative_eq!(sim.temperature(), 50.0, max_relative = 1e-12);
        assert_eq!(sim.stats().attempted, 3 * 5 * 9);
    }

    #[test]
    fn test_ramp_rejects_zero_temperature() {
        let mut sim = DipoleSimulation::new(&setup()).unwrap();
        assert!(temperature_ramp(&mut sim, &[100.0, 0.0], 1).is_err());
    }

    #[test]
    fn test_hysteresis_follows_strong_field() {
        let mut sim = DipoleSimulation::new(&setup().with_orientations(4)).unwrap();
        sim.change_temperature(10.0).unwrap();
        let series = hysteresis_loop(&mut sim, 20.0, 2, 10, 100).unwrap();
        assert_eq!(series.len(), 10);
        // At full positive and negative field every dipole points along the field
        let saturation = 9.0 * 0.08789;
        assert_relative_eq!(series[2].1, saturation, max_relative = 1e-9);
        assert_relative_eq!(series[6].1, -saturation, max_relative = 1e-9);
        assert_eq!(sim.field(), Vector2::new(10.0, 0.0));
    }

    #[test]
    fn test_parallel_scan_is_deterministic() {
        let temps = [50.0, 300.0, 900.0];
        let a = parallel_temperature_scan(&setup(), &temps, 20, 50, 7).unwrap();
        let b = parallel_temperature_scan(&setup(), &temps, 20, 50, 7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        for (point, t) in a.iter().zip(temps) {
            assert_eq!(point.temperature, t);
            assert!(point.mean_energy.is_finite());
            assert!(point.susceptibility >= -1e-12);
            assert!(point.acceptance_rate > 0.0);
        }
    }

    #[test]
    fn test_oversized_sweep_counts_rejected() {
        let mut sim = DipoleSimulation::new(&setup()).unwrap();
        assert!(matches!(
            temperature_ramp(&mut sim, &[100.0], usize::MAX / 4),
            Err(DipoleError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            hysteresis_loop(&mut sim, 1.0, 2, usize::MAX / 4, 1),
            Err(DipoleError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            parallel_temperature_scan(&setup(), &[100.0], 0, usize::MAX / 4, 1),
            Err(DipoleError::InvalidConfiguration(_))
        ));
        assert_eq!(sim.stats().attempted, 0);
    }

    #[test]
    fn test_parallel_scan_propagates_errors() {
        assert!(matches!(
            parallel_temperature_scan(&setup(), &[300.0, -1.0], 1, 1, 0),
            Err(DipoleError::NumericDegeneracy(_))
        ));
    }
}
