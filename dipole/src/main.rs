//! Dipole lattice Monte Carlo command-line interface
//!
//! Runs one configured protocol from a YAML file and writes its series and
//! final snapshot to the output directory.

use color_eyre::eyre::Result;
use dipole::app::DipoleApplication;

fn main() -> Result<()> {
    color_eyre::install()?;
    DipoleApplication::from_cli()?.run()?;
    Ok(())
}
