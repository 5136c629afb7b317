//! Dipole-dipole energy kernels
//!
//! The full energy is the O(N^2) pair sum, used for sampling and validation.
//! The per-step path only needs the O(N) dipolar field at the trial site:
//! replacing p_k by p' lowers the energy by (p' - p_k) . (F_k + E).
//!
//! Pairs at zero separation are skipped in every sum.

use crate::lattice::Lattice;
use crate::params::SimulationParameters;
use crate::state::DipoleState;
use nalgebra::Vector2;

/// k_units * sum_{i<j} [ (pi.pj)/r^3 - 3 (pi.r)(pj.r)/r^5 ]
pub fn interaction_energy(lattice: &Lattice, state: &DipoleState, k_units: f64) -> f64 {
    let (x, y) = (&lattice.x, &lattice.y);
    let (px, py) = (&state.px, &state.py);
    let n = lattice.len();

    let mut energy = 0.0;
    for i in 0..n.saturating_sub(1) {
        let (xi, yi, pxi, pyi) = (x[i], y[i], px[i], py[i]);
        let mut row = 0.0;
        for j in (i + 1)..n {
            let dx = x[j] - xi;
            let dy = y[j] - yi;
            let r_sq = dx * dx + dy * dy;
            if r_sq == 0.0 {
                continue;
            }
            let inv_r3 = 1.0 / (r_sq * r_sq.sqrt());
            let inv_r5 = inv_r3 / r_sq;
            let pi_dot_pj = pxi * px[j] + pyi * py[j];
            let pi_dot_r = pxi * dx + pyi * dy;
            let pj_dot_r = px[j] * dx + py[j] * dy;
            row += pi_dot_pj * inv_r3 - 3.0 * pi_dot_r * pj_dot_r * inv_r5;
        }
        energy += row;
    }
    k_units * energy
}

/// sum_i E . p_i
pub fn field_coupling(state: &DipoleState, field: Vector2<f64>) -> f64 {
    let sum_x: f64 = state.px.iter().sum();
    let sum_y: f64 = state.py.iter().sum();
    field.x * sum_x + field.y * sum_y
}

/// Total internal energy in eV: pair interactions minus the field coupling
pub fn total_energy(lattice: &Lattice, state: &DipoleState, params: &SimulationParameters) -> f64 {
    interaction_energy(lattice, state, params.k_units()) - field_coupling(state, params.field())
}

/// Dipolar field at site `index` produced by every other dipole:
/// k_units * sum_j [ 3 (pj.r) r / r^5 - pj / r^3 ]
pub fn local_field(
    lattice: &Lattice,
    state: &DipoleState,
    k_units: f64,
    index: usize,
) -> Vector2<f64> {
    let (x, y) = (&lattice.x, &lattice.y);
    let (px, py) = (&state.px, &state.py);
    let (xk, yk) = (x[index], y[index]);

    let mut fx = 0.0;
    let mut fy = 0.0;
    for j in 0..lattice.len() {
        let dx = xk - x[j];
        let dy = yk - y[j];
        let r_sq = dx * dx + dy * dy;
        if r_sq == 0.0 {
            continue;
        }
        let inv_r3 = 1.0 / (r_sq * r_sq.sqrt());
        let three_p_dot_r_inv_r5 = 3.0 * (px[j] * dx + py[j] * dy) * inv_r3 / r_sq;
        fx += three_p_dot_r_inv_r5 * dx - px[j] * inv_r3;
        fy += three_p_dot_r_inv_r5 * dy - py[j] * inv_r3;
    }
    Vector2::new(k_units * fx, k_units * fy)
}

/// Energy decrease from replacing the moment at `index` with `trial`.
///
/// Positive means the move lowers the energy. Equal to
/// `total_energy(before) - total_energy(after)` up to rounding.
pub fn energy_decrease(
    lattice: &Lattice,
    state: &DipoleState,
    params: &SimulationParameters,
    index: usize,
    trial: Vector2<f64>,
) -> f64 {
    let dp = trial - state.moment(index);
    if dp.x == 0.0 && dp.y == 0.0 {
        return 0.0;
    }
    let felt = local_field(lattice, state, params.k_units(), index) + params.field();
    dp.dot(&felt)
}

/// Interaction energy of one dipole with all the others (no field term)
pub fn dipole_energy(lattice: &Lattice, state: &DipoleState, k_units: f64, index: usize) -> f64 {
    -state.moment(index).dot(&local_field(lattice, state, k_units, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::LatticeKind;
    use crate::orientation::OrientationBasis;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const A: f64 = 1.1;
    const P: f64 = 0.08789;

    fn pair(moment: Vector2<f64>) -> (Lattice, DipoleState, SimulationParameters) {
        let lattice = Lattice::generate(A, 1, 2, LatticeKind::Square).unwrap();
        let state = DipoleState::uniform(2, moment);
        let params = SimulationParameters::new(300.0, 1.5).unwrap();
        (lattice, state, params)
    }

    #[test]
    fn test_head_to_tail_pair() {
        let (lattice, state, params) = pair(Vector2::new(P, 0.0));
        let expected = -2.0 * params.k_units() * P * P / (A * A * A);
        assert_relative_eq!(total_energy(&lattice, &state, &params), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_side_by_side_pair() {
        let (lattice, state, params) = pair(Vector2::new(0.0, P));
        let expected = params.k_units() * P * P / (A * A * A);
        assert_relative_eq!(total_energy(&lattice, &state, &params), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_single_dipole_has_no_interaction() {
        let lattice = Lattice::generate(A, 1, 1, LatticeKind::Square).unwrap();
        let state = DipoleState::uniform(1, Vector2::new(0.0, P));
        let mut params = SimulationParameters::new(300.0, 1.0).unwrap();
        assert_eq!(total_energy(&lattice, &state, &params), 0.0);

        params.set_field(Vector2::new(0.0, 2.0)).unwrap();
        assert_relative_eq!(total_energy(&lattice, &state, &params), -2.0 * P);
    }

    #[test]
    fn test_coincident_sites_are_excluded() {
        let mut lattice = Lattice::generate(A, 1, 3, LatticeKind::Square).unwrap();
        lattice.x[1] = lattice.x[0];
        let state = DipoleState::uniform(3, Vector2::new(0.0, P));
        let params = SimulationParameters::new(300.0, 1.0).unwrap();
        assert!(total_energy(&lattice, &state, &params).is_finite());
        assert!(local_field(&lattice, &state, params.k_units(), 0).norm().is_finite());
    }

    #[test]
    fn test_field_lowers_aligned_energy() {
        let (lattice, state, mut params) = pair(Vector2::new(0.0, P));
        let before = total_energy(&lattice, &state, &params);
        params.set_field(Vector2::new(0.0, 1.0)).unwrap();
        assert_relative_eq!(
            total_energy(&lattice, &state, &params),
            before - 2.0 * P,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_interaction_energy_from_local_fields() {
        let lattice = Lattice::generate(A, 4, 5, LatticeKind::TriangularRhombus).unwrap();
        let basis = OrientationBasis::new(3, P).unwrap();
        let state = DipoleState::random(lattice.len(), &basis, &mut StdRng::seed_from_u64(3));
        let k_units = 0.7;
        let from_sites: f64 = (0..lattice.len())
            .map(|i| dipole_energy(&lattice, &state, k_units, i))
            .sum();
        assert_relative_eq!(
            0.5 * from_sites,
            interaction_energy(&lattice, &state, k_units),
            max_relative = 1e-10
        );
    }

    #[test]
    fn test_incremental_matches_full_difference() {
        let mut rng = StdRng::seed_from_u64(2024);
        let cases = [
            (LatticeKind::TriangularRhombus, 5, 10, 3),
            (LatticeKind::TriangularSquare, 7, 7, 7),
            (LatticeKind::Square, 6, 9, 50),
        ];

        for (kind, rows, columns, m) in cases {
            let lattice = Lattice::generate(A, rows, columns, kind).unwrap();
            let basis = OrientationBasis::new(m, P).unwrap();
            let mut state = DipoleState::random(lattice.len(), &basis, &mut rng);
            let mut params = SimulationParameters::new(300.0, 1.5).unwrap();
            params.set_field(Vector2::new(0.03, -0.02)).unwrap();

            for _ in 0..40 {
                let k = rng.gen_range(0..lattice.len());
                let trial = basis.get(rng.gen_range(0..basis.len()));
                let before = total_energy(&lattice, &state, &params);
                let decrease = energy_decrease(&lattice, &state, &params, k, trial);

                let old = state.moment(k);
                state.set_moment(k, trial);
                let after = total_energy(&lattice, &state, &params);
                assert_relative_eq!(decrease, before - after, epsilon = 1e-12, max_relative = 1e-9);

                // Leave roughly half of the trials applied so the state keeps evolving
                if rng.gen_bool(0.5) {
                    state.set_moment(k, old);
                }
            }
        }
    }

    #[test]
    fn test_no_change_has_zero_decrease() {
        let (lattice, state, params) = pair(Vector2::new(0.0, P));
        assert_eq!(energy_decrease(&lattice, &state, &params, 0, state.moment(0)), 0.0);
    }
}
