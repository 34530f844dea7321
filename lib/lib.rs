#![allow(non_snake_case)]

//! Builds Lindblad master-equation problems for multilevel atoms (optionally
//! coupled to a cavity) from a declarative description of levels, lasers,
//! cavity modes, and decay channels.
//!
//! The central type is [`system::AtomSystem`], which assembles projectors,
//! Clebsch-Gordan-weighted transition operators, the Zeeman and interaction
//! Hamiltonians, collapse operators, and the initial density matrix, and then
//! hands the problem to any [`integrate::MasterEquationSolver`].

pub mod utils;
pub mod error;
pub mod spin;
pub mod gfactors;
pub mod polarization;
pub mod hilbert;
pub mod envelope;
pub mod entities;
pub mod params;
pub mod integrate;
pub mod system;
pub mod description;
pub mod presets;

pub use error::{ Error, Result, SolverError };
pub use entities::{ Cavity, Decay, Direction, Laser, Level };
pub use params::SystemParams;
pub use integrate::{ MasterEquation, MasterEquationSolver, Rk4Solver, Trajectory };
pub use system::{ AtomSystem, RebuildScope, Solution, SolveOptions };
pub use description::SystemDescription;
