//! Table-driven inelastic electron scattering for SEM Monte Carlo
//! simulation.
//!
//! The central type is [`TabulatedInelastic`], a scattering mechanism that
//! samples discrete inelastic events for a primary electron travelling in a
//! bound [`Material`]: the inverse mean free path, the energy lost per
//! event, the deflection of the primary, and the energy and trajectory of
//! any generated secondary electron. The underlying physics is supplied as
//! interpolation tables (see [`Table`] and [`TableSet`]), typically computed
//! from a dielectric-function model of the material; the mechanism supplies
//! the per-event sampling logic, the kinematics, and the bookkeeping of the
//! material's band structure.
//!
//! Three published secondary-electron models are available through
//! [`SeModel`]. All quantities are SI; energies in particular are in joules.

mod binding;
pub mod config;
pub mod dispersion;
pub mod electron;
pub mod fast_rng;
pub mod inelastic;
pub mod material;
pub mod tables;

pub use config::Config;
pub use dispersion::dispersion_energy;
pub use electron::{compose_deflection, Electron};
pub use fast_rng::PrnStream;
pub use inelastic::{SeModel, TabulatedInelastic};
pub use material::{BandStructure, Material};
pub use tables::{Table, TableLoadError, TableLoader, TablePaths, TableSet};
