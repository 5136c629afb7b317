//! Input/Output for dipole simulations
//!
//! This module handles logging setup and the flat numeric files a run
//! produces or consumes.

mod output;
mod tables;

pub use output::setup_output;
pub use tables::{
    load_series, load_snapshot, read_snapshot, save_series, save_snapshot, write_arrow_field,
    write_series, write_snapshot, FrameWriter,
};
