//! Error types for strata.
//!
//! Configuration problems abort a run before any frequency is solved;
//! model and solver problems are scoped to the frequency that raised them.

use thiserror::Error;

/// Result type alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// A medium or stack definition that cannot produce a valid model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("unknown parameter `{key}` for {model} medium")]
    UnknownParameter { model: &'static str, key: String },

    #[error("parameter `{key}` has the wrong type: expected {expected}")]
    InvalidType { key: String, expected: &'static str },

    #[error("parameters `{first}` and `{second}` are mutually exclusive")]
    MutuallyExclusive { first: String, second: String },

    #[error("{model} medium is under-determined: missing `{missing}`")]
    UnderDetermined { model: &'static str, missing: &'static str },

    #[error("inconsistent parameters: `{key}` given as {given}, derived as {derived}")]
    Inconsistent { key: &'static str, given: f64, derived: f64 },

    #[error("parameter `{key}` = {value} is out of range ({valid})")]
    OutOfRange { key: &'static str, value: f64, valid: &'static str },

    #[error("unsupported option: {details}")]
    Unsupported { details: String },

    #[error("layer stack is empty")]
    EmptyStack,

    #[error("layer {index} has an invalid thickness {thickness}")]
    InvalidThickness { index: usize, thickness: f64 },

    #[error("layer {index} references a medium whose parameters were not resolved")]
    UnresolvedMedium { index: usize },

    #[error("layer {index} references unknown medium `{name}`")]
    UnknownMedium { index: usize, name: String },

    #[error("invalid boundary condition: {details}")]
    InvalidBoundary { details: String },

    #[error("invalid frequency grid: {details}")]
    InvalidGrid { details: String },
}

/// A physically meaningless situation met while building one frequency.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("no coupling rule declared between {left} and {right} media")]
    MissingCoupling { left: &'static str, right: &'static str },

    #[error("non-physical {quantity} at {frequency} Hz")]
    NonPhysical { quantity: &'static str, frequency: f64 },

    #[error("medium parameters must be resolved with compute_missing before use")]
    Unresolved,

    #[error("no frequency state cached; call update_frequency first")]
    StaleState,

    #[error("solver cannot go from {from} to {to}")]
    Phase { from: String, to: &'static str },
}

/// The assembled linear system could not be solved reliably.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("singular system of size {size}")]
    Singular { size: usize },

    #[error("ill-conditioned system: backward error {backward_error:.3e}")]
    IllConditioned { backward_error: f64 },

    #[error("system has {rows} equations for {unknowns} unknowns")]
    Shape { rows: usize, unknowns: usize },

    #[error("solution contains non-finite values")]
    NonFinite,
}

/// Failure of a single frequency point. Recorded by the sweep, never fatal to it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrequencyError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// All errors surfaced by the crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("solver error: {0}")]
    Solver(#[from] SolverError),
}

impl From<FrequencyError> for Error {
    fn from(err: FrequencyError) -> Self {
        match err {
            FrequencyError::Model(e) => Error::Model(e),
            FrequencyError::Solver(e) => Error::Solver(e),
        }
    }
}

impl FrequencyError {
    /// Short machine-readable tag for the failure family.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Model(_) => "model",
            Self::Solver(_) => "solver",
        }
    }
}
