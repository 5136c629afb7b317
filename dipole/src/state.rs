use crate::error::{DipoleError, Result};
use crate::orientation::OrientationBasis;
use nalgebra::Vector2;
use rand::Rng;

/// Current moment of every dipole, x and y components in separate arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct DipoleState {
    pub px: Vec<f64>,
    pub py: Vec<f64>,
}

impl DipoleState {
    /// Assign every site an orientation drawn uniformly from `basis`
    pub fn random<R: Rng + ?Sized>(n: usize, basis: &OrientationBasis, rng: &mut R) -> Self {
        let mut px = Vec::with_capacity(n);
        let mut py = Vec::with_capacity(n);
        for _ in 0..n {
            let p = basis.get(rng.gen_range(0..basis.len()));
            px.push(p.x);
            py.push(p.y);
        }
        Self { px, py }
    }

    /// Every site set to the same moment
    pub fn uniform(n: usize, moment: Vector2<f64>) -> Self {
        Self {
            px: vec![moment.x; n],
            py: vec![moment.y; n],
        }
    }

    /// Build a state from explicit moments, checking it fits a lattice of `n` sites
    pub fn from_moments(moments: &[Vector2<f64>], n: usize) -> Result<Self> {
        if moments.len() != n {
            return Err(DipoleError::InvalidConfiguration(format!(
                "seeded state has {} dipoles but the lattice has {}",
                moments.len(),
                n
            )));
        }
        if moments.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return Err(DipoleError::InvalidConfiguration(
                "seeded state contains non-finite moments".to_string(),
            ));
        }
        Ok(Self {
            px: moments.iter().map(|p| p.x).collect(),
            py: moments.iter().map(|p| p.y).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.px.len()
    }

    pub fn is_empty(&self) -> bool {
        self.px.is_empty()
    }

    pub fn moment(&self, index: usize) -> Vector2<f64> {
        Vector2::new(self.px[index], self.py[index])
    }

    pub fn set_moment(&mut self, index: usize, moment: Vector2<f64>) {
        self.px[index] = moment.x;
        self.py[index] = moment.y;
    }

    pub fn moments(&self) -> Vec<Vector2<f64>> {
        self.px
            .iter()
            .zip(&self.py)
            .map(|(&x, &y)| Vector2::new(x, y))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_state_uses_basis() {
        let basis = OrientationBasis::new(3, 0.1).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let state = DipoleState::random(200, &basis, &mut rng);
        assert_eq!(state.len(), 200);
        for i in 0..state.len() {
            assert!(basis.vectors().contains(&state.moment(i)));
        }
        // With 200 draws every orientation shows up
        for v in basis.vectors() {
            assert!(state.moments().contains(v));
        }
    }

    #[test]
    fn test_random_state_is_seed_reproducible() {
        let basis = OrientationBasis::new(6, 1.0).unwrap();
        let a = DipoleState::random(50, &basis, &mut StdRng::seed_from_u64(11));
        let b = DipoleState::random(50, &basis, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_moments_length_mismatch() {
        let moments = vec![Vector2::new(0.0, 1.0); 5];
        assert!(matches!(
            DipoleState::from_moments(&moments, 6),
            Err(DipoleError::InvalidConfiguration(_))
        ));
        let state = DipoleState::from_moments(&moments, 5).unwrap();
        assert_eq!(state.moments(), moments);
    }

    #[test]
    fn test_set_moment() {
        let mut state = DipoleState::uniform(4, Vector2::new(0.0, 1.0));
        state.set_moment(2, Vector2::new(-1.0, 0.5));
        assert_eq!(state.moment(2), Vector2::new(-1.0, 0.5));
        assert_eq!(state.moment(1), Vector2::new(0.0, 1.0));
    }
}
