//! Error taxonomy for the dipole Monte Carlo engine
//!
//! Every variant is an input-validation failure detected eagerly at
//! construction or call time.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DipoleError {
    /// Non-positive lattice row or column count.
    #[error("invalid lattice dimension: {0}")]
    InvalidDimension(String),

    /// Bad orientation count, step count, seeded state, or other option.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A parameter that would make beta (or another derived quantity) undefined.
    #[error("numeric degeneracy: {0}")]
    NumericDegeneracy(String),
}

pub type Result<T> = std::result::Result<T, DipoleError>;
