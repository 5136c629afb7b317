use crate::exact::ChainModel;
use crate::observables::{fluctuation_susceptibility, heat_capacity, RunningStats, Sample};
use crate::simulation::DipoleSimulation;
use crate::sweep::ScanPoint;
use nalgebra::Vector2;
use tracing::info;

pub fn report_samples(samples: &[Sample], beta: f64) {
    if samples.is_empty() {
        info!("No samples taken");
        return;
    }

    let energies: Vec<f64> = samples.iter().map(|s| s.energy).collect();
    let polarizations: Vec<Vector2<f64>> = samples.iter().map(|s| s.polarization).collect();
    let mut energy = RunningStats::new();
    energy.extend(energies.iter().copied());
    let mut magnitude = RunningStats::new();
    magnitude.extend(polarizations.iter().map(|p| p.norm()));

    info!("\nSampled {} checkpoints:", samples.len());
    info!("  <U>   = {:+.8} eV (std {:.3e})", energy.mean(), energy.std_dev());
    info!("  <|P|> = {:.6} e nm", magnitude.mean());
    info!(
        "  chi   = {:.6e} (e nm)^2/eV",
        fluctuation_susceptibility(&polarizations, beta)
    );
    info!("  C/k_B = {:.6e}", heat_capacity(&energies, beta));
}

pub fn report_run_summary(sim: &DipoleSimulation) {
    let stats = sim.stats();
    let p = sim.polarization();

    info!("\nRun finished.");
    info!("  Dipoles:     {}", sim.n_dipoles());
    info!("  Temperature: {:.2} K", sim.temperature());
    info!(
        "  Attempted:   {} ({} accepted, {} unchanged, rate {:.4})",
        stats.attempted,
        stats.accepted,
        stats.unchanged,
        stats.acceptance_rate()
    );
    info!("  Energy:      {:+.10} eV", sim.energy());
    info!("  P:           [{:+.6}, {:+.6}] e nm", p.x, p.y);
}

pub fn report_scan(points: &[ScanPoint]) {
    info!("\n{:>10} {:>16} {:>12} {:>12} {:>14} {:>8}", "T (K)", "<U> (eV)", "std U", "<|P|>", "chi", "acc");
    for point in points {
        info!(
            "{:>10.2} {:>+16.8} {:>12.3e} {:>12.6} {:>14.6e} {:>8.4}",
            point.temperature,
            point.mean_energy,
            point.energy_std,
            point.mean_polarization,
            point.susceptibility,
            point.acceptance_rate
        );
    }
}

pub fn report_exact_chain(model: &ChainModel, sites: usize, series: &[(f64, f64)]) {
    info!(
        "\nExact susceptibility of a {}-site chain (J = {:+.6e} eV):",
        sites, model.coupling
    );
    for (temperature, chi) in series {
        info!("  T = {:8.2} K  chi = {:.8e}", temperature, chi);
    }
}
