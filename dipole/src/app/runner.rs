use super::report::{report_exact_chain, report_run_summary, report_samples, report_scan};
use crate::config::{non_negative, Config, Protocol};
use crate::io::{save_series, save_snapshot, FrameWriter};
use crate::simulation::{DipoleSimulation, SimulationSetup};
use crate::sweep::{hysteresis_loop, parallel_temperature_scan, temperature_ramp};
use color_eyre::eyre::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// Files written by a run, in the order they were produced
#[derive(Debug, Default)]
pub struct RunArtifacts {
    pub files: Vec<PathBuf>,
    /// Total energy of the final lattice state, when a lattice was simulated
    pub final_energy: Option<f64>,
}

type NamedSeries = Vec<(&'static str, Vec<(f64, f64)>)>;

pub fn execute(config: &Config, setup: SimulationSetup, out_dir: &Path) -> Result<RunArtifacts> {
    let mut artifacts = RunArtifacts::default();

    match &config.protocol {
        Protocol::Equilibrate => {
            let sweeps = non_negative("run.sweeps", config.run.sweeps)?;
            let stride = config.sample_stride()?;
            run_lattice(config, &setup, out_dir, &mut artifacts, |sim| {
                let steps = sim.sweep_steps(sweeps)?;
                let samples = sim.run_sampled(steps, stride)?;
                report_samples(&samples, sim.beta());

                let energy: Vec<(f64, f64)> =
                    samples.iter().map(|s| (s.step as f64, s.energy)).collect();
                let polarization: Vec<(f64, f64)> = samples
                    .iter()
                    .map(|s| (s.step as f64, s.polarization.norm()))
                    .collect();
                Ok(vec![("energy.dat", energy), ("polarization.dat", polarization)])
            })?;
        }
        Protocol::TemperatureRamp {
            temperatures,
            sweeps_per_point,
        } => {
            let temperatures = temperatures.values()?;
            let sweeps = non_negative("sweeps_per_point", *sweeps_per_point)?;
            run_lattice(config, &setup, out_dir, &mut artifacts, |sim| {
                let series = temperature_ramp(sim, &temperatures, sweeps)?;
                Ok(vec![("UvsT.dat", series)])
            })?;
        }
        Protocol::FieldSweep {
            strength,
            points,
            sweeps_per_point,
            warmup_sweeps,
        } => {
            let points = non_negative("points", *points)?;
            let sweeps = non_negative("sweeps_per_point", *sweeps_per_point)?;
            let warmup = non_negative("warmup_sweeps", *warmup_sweeps)?;
            run_lattice(config, &setup, out_dir, &mut artifacts, |sim| {
                let series = hysteresis_loop(sim, *strength, points, warmup, sweeps)?;
                Ok(vec![("PvsE.dat", series)])
            })?;
        }
        Protocol::ParallelScan {
            temperatures,
            equilibration_sweeps,
            production_sweeps,
        } => {
            let temperatures = temperatures.values()?;
            let equilibration = non_negative("equilibration_sweeps", *equilibration_sweeps)?;
            let production = non_negative("production_sweeps", *production_sweeps)?;
            let base_seed = config.seed.unwrap_or_else(rand::random);
            info!(
                "Scanning {} temperatures in parallel (base seed {})",
                temperatures.len(),
                base_seed
            );

            let points =
                parallel_temperature_scan(&setup, &temperatures, equilibration, production, base_seed)?;
            report_scan(&points);

            let columns: NamedSeries = vec![
                (
                    "scan_energy.dat",
                    points.iter().map(|p| (p.temperature, p.mean_energy)).collect(),
                ),
                (
                    "scan_polarization.dat",
                    points
                        .iter()
                        .map(|p| (p.temperature, p.mean_polarization))
                        .collect(),
                ),
                (
                    "scan_susceptibility.dat",
                    points.iter().map(|p| (p.temperature, p.susceptibility)).collect(),
                ),
            ];
            save_all(out_dir, columns, &mut artifacts)?;
        }
        Protocol::ExactChain {
            sites,
            temperatures,
            antiparallel,
        } => {
            let sites = non_negative("sites", *sites)?;
            let temperatures = temperatures.values()?;
            let model = config.chain_model(*antiparallel);

            let chi = model.susceptibility_curve(&temperatures, sites)?;
            let series: Vec<(f64, f64)> = temperatures.iter().copied().zip(chi).collect();
            report_exact_chain(&model, sites, &series);
            save_all(out_dir, vec![("chi_exact.dat", series)], &mut artifacts)?;
        }
    }

    Ok(artifacts)
}

/// Build one simulation, hand it to `body`, then save the series it returns
/// together with the final snapshot and the optional frames.
fn run_lattice<F>(
    config: &Config,
    setup: &SimulationSetup,
    out_dir: &Path,
    artifacts: &mut RunArtifacts,
    body: F,
) -> Result<()>
where
    F: FnOnce(&mut DipoleSimulation) -> Result<NamedSeries>,
{
    let mut sim = DipoleSimulation::new(setup)?;

    let mut frames = if config.output.frames {
        Some(FrameWriter::new(out_dir.join("frames"))?)
    } else {
        None
    };
    if let Some(frames) = frames.as_mut() {
        artifacts
            .files
            .push(frames.save(sim.lattice(), sim.state(), Some("initial"))?);
    }

    let series = body(&mut sim)?;
    save_all(out_dir, series, artifacts)?;

    let snapshot = out_dir.join("state.dat");
    save_snapshot(&snapshot, sim.state())?;
    info!("Final state written to: {}", snapshot.display());
    artifacts.files.push(snapshot);

    if let Some(frames) = frames.as_mut() {
        artifacts
            .files
            .push(frames.save(sim.lattice(), sim.state(), Some("final"))?);
    }

    report_run_summary(&sim);
    artifacts.final_energy = Some(sim.energy());
    Ok(())
}

fn save_all(out_dir: &Path, series: NamedSeries, artifacts: &mut RunArtifacts) -> Result<()> {
    for (name, values) in series {
        let path = out_dir.join(name);
        save_series(&path, &values)?;
        info!("{} values written to: {}", values.len(), path.display());
        artifacts.files.push(path);
    }
    Ok(())
}
