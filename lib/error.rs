//! Error types for system construction and integration.

use thiserror::Error;

/// Result alias for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures while describing, building, or solving an atomic system.
///
/// Configuration variants always name the offending entity. Physically
/// forbidden couplings (e.g. `|Jg - Je| > 1`) are *not* errors; they produce
/// zero operators.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{by} references unknown level '{name}'")]
    UnknownLevel { name: String, by: String },

    #[error("duplicate level name '{0}'")]
    DuplicateLevel(String),

    #[error("{by} couples level '{level}' to itself")]
    SelfCoupling { level: String, by: String },

    #[error(
        "level '{level}' has {found} population entries; expected {expected} \
        (one per magnetic sublevel)"
    )]
    PopulationMismatch { level: String, expected: usize, found: usize },

    #[error("level '{level}': invalid {what} = {value}")]
    InvalidQuantumNumber { level: String, what: &'static str, value: f64 },

    #[error("{by}: invalid polarization ({reason})")]
    InvalidPolarization { by: String, reason: &'static str },

    #[error("{by}: unknown envelope function '{func}'")]
    UnknownEnvelope { func: String, by: String },

    #[error("envelope arguments for '{0}' are declared by more than one laser")]
    EnvelopeNamespaceClash(String),

    #[error("cavity: {0}")]
    InvalidCavity(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("initial state has zero total population")]
    EmptyInitialState,

    #[error("supplied initial state has shape {found:?}; expected {expected:?}")]
    InitialStateShape { expected: [usize; 2], found: [usize; 2] },

    #[error("no {0} with index {1}")]
    NoSuchEntity(&'static str, usize),

    #[error("solver failed: {0}")]
    Solver(#[from] SolverError),

    #[error("JSON (de)serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Failures reported by a [`MasterEquationSolver`][crate::integrate::MasterEquationSolver].
///
/// These are kept distinct from configuration errors; the core never retries
/// a failed integration.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("operator '{what}' has shape {found:?}; expected {expected:?}")]
    DimensionMismatch {
        what: String,
        expected: [usize; 2],
        found: [usize; 2],
    },

    #[error("time grid must be strictly increasing with at least one point")]
    InvalidTimeGrid,

    #[error("state became non-finite at t = {time}")]
    NonFinite { time: f64 },

    #[error("state trace vanished at t = {time}")]
    VanishingTrace { time: f64 },
}
