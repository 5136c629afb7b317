use crate::error::{DipoleError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lattice geometries a simulation can be built on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum LatticeKind {
    /// Row r, column c at (c*a, r*a)
    #[serde(rename = "square")]
    Square,
    /// Oblique triangular lattice, every row shifted by a/2 relative to the one below
    #[default]
    #[serde(rename = "triangular_rhombus")]
    TriangularRhombus,
    /// Triangular lattice packed into a rectangle, odd rows shifted by a/2
    #[serde(rename = "triangular_square")]
    TriangularSquare,
}

impl FromStr for LatticeKind {
    type Err = DipoleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "square" | "s" => Ok(Self::Square),
            "triangular_rhombus" | "triangular" | "t" => Ok(Self::TriangularRhombus),
            "triangular_square" | "t2" => Ok(Self::TriangularSquare),
            other => Err(DipoleError::InvalidConfiguration(format!(
                "unknown lattice kind '{other}', expected 'square', 'triangular_rhombus' or 'triangular_square'"
            ))),
        }
    }
}

impl fmt::Display for LatticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Square => "square",
            Self::TriangularRhombus => "triangular_rhombus",
            Self::TriangularSquare => "triangular_square",
        };
        f.write_str(name)
    }
}

/// Fixed dipole positions in structure-of-arrays layout.
///
/// Index `r * columns + c` holds the site at row `r`, column `c`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    pub kind: LatticeKind,
    pub spacing: f64,
    pub rows: usize,
    pub columns: usize,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Lattice {
    /// Build the positions for `rows * columns` dipoles.
    ///
    /// The generator is deterministic: identical inputs give identical arrays.
    pub fn generate(spacing: f64, rows: usize, columns: usize, kind: LatticeKind) -> Result<Self> {
        if rows == 0 || columns == 0 {
            return Err(DipoleError::InvalidDimension(format!(
                "rows and columns must be positive, got {rows} x {columns}"
            )));
        }
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(DipoleError::InvalidConfiguration(format!(
                "lattice spacing must be positive and finite, got {spacing}"
            )));
        }

        let row_height = match kind {
            LatticeKind::Square => spacing,
            LatticeKind::TriangularRhombus | LatticeKind::TriangularSquare => {
                spacing * 3.0_f64.sqrt() * 0.5
            }
        };

        let n = rows * columns;
        let mut x = Vec::with_capacity(n);
        let mut y = Vec::with_capacity(n);
        for r in 0..rows {
            let shift = match kind {
                LatticeKind::Square => 0.0,
                LatticeKind::TriangularRhombus => 0.5 * spacing * r as f64,
                LatticeKind::TriangularSquare => 0.5 * spacing * (r % 2) as f64,
            };
            for c in 0..columns {
                x.push(c as f64 * spacing + shift);
                y.push(r as f64 * row_height);
            }
        }

        Ok(Self {
            kind,
            spacing,
            rows,
            columns,
            x,
            y,
        })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn position(&self, index: usize) -> [f64; 2] {
        [self.x[index], self.y[index]]
    }
}
