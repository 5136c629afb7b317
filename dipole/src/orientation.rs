use crate::error::{DipoleError, Result};
use nalgebra::Vector2;
use std::f64::consts::PI;

/// The discrete set of moments a dipole may take.
///
/// `M` directions evenly spaced around the unit circle, each scaled by the
/// dipole strength. Shared read-only by every site of a simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientationBasis {
    pub strength: f64,
    vectors: Vec<Vector2<f64>>,
}

impl OrientationBasis {
    pub fn new(count: usize, strength: f64) -> Result<Self> {
        if count < 1 {
            return Err(DipoleError::InvalidConfiguration(
                "orientation count must be at least 1".to_string(),
            ));
        }
        if !strength.is_finite() {
            return Err(DipoleError::InvalidConfiguration(format!(
                "dipole strength must be finite, got {strength}"
            )));
        }

        let vectors = if count == 3 {
            // Clock model: one state along +y, two at +-120 degrees
            let sqrt3half = 3.0_f64.sqrt() * 0.5;
            vec![
                Vector2::new(0.0, 1.0),
                Vector2::new(sqrt3half, -0.5),
                Vector2::new(-sqrt3half, -0.5),
            ]
        } else {
            let del_theta = 2.0 * PI / count as f64;
            (0..count)
                .map(|e| {
                    let theta = del_theta * e as f64;
                    Vector2::new(theta.cos(), theta.sin())
                })
                .collect()
        };

        Ok(Self {
            strength,
            vectors: vectors.into_iter().map(|v| v * strength).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn get(&self, index: usize) -> Vector2<f64> {
        self.vectors[index]
    }

    pub fn vectors(&self) -> &[Vector2<f64>] {
        &self.vectors
    }
}
