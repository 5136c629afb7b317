// Metropolis Monte Carlo for 2D lattices of discrete-orientation electric dipoles

pub mod app;
pub mod config;
pub mod energy;
pub mod error;
pub mod exact;
pub mod io;
pub mod lattice;
pub mod observables;
pub mod orientation;
pub mod params;
pub mod simulation;
pub mod state;
pub mod sweep;

pub use error::{DipoleError, Result};
pub use exact::ChainModel;
pub use lattice::{Lattice, LatticeKind};
pub use orientation::OrientationBasis;
pub use simulation::{DipoleSimulation, SimulationSetup, StepOutcome};
