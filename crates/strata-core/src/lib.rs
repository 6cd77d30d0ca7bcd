//! Plane-wave acoustics of layered media in the frequency domain.
//!
//! A [`Problem`] is a stack of fluid, elastic and poroelastic layers excited
//! by an oblique plane wave. Every frequency is solved either by the
//! transfer-matrix method or by one-dimensional finite elements, and yields
//! the reflection, transmission and absorption [`Indicators`] of the stack.

pub mod config;
pub mod constants;
pub mod coupling;
pub mod error;
pub mod fem;
pub mod frequency_response;
pub mod linalg;
pub mod media;
pub mod solver;
pub mod stack;
pub mod tmm;
pub mod transfer_matrix;

pub use config::ProblemConfig;
pub use constants::Air;
pub use coupling::{CouplingRule, CouplingTable};
pub use error::{ConfigurationError, Error, FrequencyError, ModelError, Result, SolverError};
pub use frequency_response::{FrequencyGrid, SweepPoint};
pub use media::{Medium, MediumKind, ModelTag, Parameters};
pub use solver::{Indicators, Method, Solver, SolverConfig};
pub use stack::{Excitation, Layer, LayerStack, PoreCondition, Termination};

/// A fully resolved problem, ready to be swept.
#[derive(Debug, Clone)]
pub struct Problem {
    pub stack: LayerStack,
    pub excitation: Excitation,
    /// Increasing frequencies in Hz.
    pub frequencies: Vec<f64>,
    pub solver: SolverConfig,
}

impl Problem {
    pub fn sweep(&self) -> Result<Vec<SweepPoint>> {
        frequency_response::sweep(self)
    }

    pub fn sweep_parallel(&self) -> Result<Vec<SweepPoint>> {
        frequency_response::sweep_parallel(self)
    }
}

/// Builds the problem described by `config` and sweeps it.
///
/// Configuration errors are returned before any frequency is solved;
/// per-frequency failures are recorded in the returned points.
pub fn compute(config: &ProblemConfig) -> Result<Vec<SweepPoint>> {
    config.build()?.sweep()
}
