//! Per-frequency solve of a configured problem.
//!
//! A [`Solver`] walks through [`SolverPhase`]s: it is configured once with a
//! problem, then for every frequency it assembles, solves and reports
//! [`Indicators`]. Calls out of order fail with [`ModelError::Phase`].

use std::fmt;

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::coupling::CouplingTable;
use crate::error::{FrequencyError, ModelError};
use crate::fem::{self, MeshOptions};
use crate::linalg;
use crate::stack::StackState;
use crate::transfer_matrix::TransferMatrix;
use crate::{tmm, Problem};

/// Numerical method used for every frequency of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    #[default]
    TransferMatrix,
    FiniteElement,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub method: Method,
    /// Only read by [`Method::FiniteElement`].
    pub mesh: MeshOptions,
    pub couplings: CouplingTable,
}

/// Assembled system of one frequency.
#[derive(Debug, Clone)]
pub(crate) enum System {
    /// Fluid-like stack reduced to one 2×2 matrix.
    Chain(TransferMatrix),
    /// Dense system whose solution holds the reflection coefficient and,
    /// for a fluid termination, the transmitted amplitude.
    Linear {
        matrix: DMatrix<Complex64>,
        rhs: DVector<Complex64>,
        reflection: usize,
        transmission: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolverPhase {
    Unconfigured,
    Parameterized,
    /// System assembled at the given frequency in Hz.
    Assembled(f64),
    Solved(f64),
    Finalized,
}

impl fmt::Display for SolverPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconfigured => write!(f, "unconfigured"),
            Self::Parameterized => write!(f, "parameterized"),
            Self::Assembled(freq) => write!(f, "assembled at {freq} Hz"),
            Self::Solved(freq) => write!(f, "solved at {freq} Hz"),
            Self::Finalized => write!(f, "finalized"),
        }
    }
}

/// Acoustic indicators of the stack at one frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    /// Frequency in Hz.
    pub frequency: f64,
    /// Pressure reflection coefficient R.
    pub reflection: Complex64,
    /// Transmitted pressure amplitude T; zero behind a rigid wall.
    pub transmission: Complex64,
    /// α = 1 − |R|²
    pub absorption: f64,
    /// −10·log10 of the transmitted power fraction, in dB.
    pub transmission_loss: Option<f64>,
}

impl Indicators {
    fn new(frequency: f64, state: &StackState, reflection: Complex64, transmission: Option<Complex64>) -> Self {
        let transmission_loss = match (transmission, state.transmitted) {
            (Some(t), Some(fluid)) if t.norm() > 0.0 => {
                let y0 = state.incident.admittance(state.omega, state.kx).re;
                let yt = fluid.admittance(state.omega, state.kx).re;
                Some(-10.0 * (t.norm_sqr() * yt / y0).log10())
            }
            _ => None,
        };
        Self {
            frequency,
            reflection,
            transmission: transmission.unwrap_or_default(),
            absorption: 1.0 - reflection.norm_sqr(),
            transmission_loss,
        }
    }
}

#[derive(Debug)]
pub struct Solver<'p> {
    problem: Option<&'p Problem>,
    phase: SolverPhase,
    state: Option<StackState>,
    system: Option<System>,
    solution: Option<(Complex64, Option<Complex64>)>,
}

impl Default for Solver<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'p> Solver<'p> {
    pub fn new() -> Self {
        Self {
            problem: None,
            phase: SolverPhase::Unconfigured,
            state: None,
            system: None,
            solution: None,
        }
    }

    pub fn phase(&self) -> SolverPhase {
        self.phase
    }

    fn illegal(&self, to: &'static str) -> ModelError {
        ModelError::Phase {
            from: self.phase.to_string(),
            to,
        }
    }

    /// Binds the solver to a problem.
    pub fn configure(&mut self, problem: &'p Problem) -> Result<(), ModelError> {
        match self.phase {
            SolverPhase::Unconfigured | SolverPhase::Finalized => {
                self.problem = Some(problem);
                self.phase = SolverPhase::Parameterized;
                Ok(())
            }
            _ => Err(self.illegal("parameterized")),
        }
    }

    /// Evaluates the stack at `frequency` (Hz) and builds the system of the
    /// configured method. On failure the solver stays ready for another
    /// frequency.
    pub fn assemble(&mut self, frequency: f64) -> Result<(), FrequencyError> {
        let problem = match (self.phase, self.problem) {
            (SolverPhase::Parameterized | SolverPhase::Solved(_), Some(problem)) => problem,
            _ => return Err(self.illegal("assembled").into()),
        };
        self.phase = SolverPhase::Parameterized;
        self.state = None;
        self.system = None;
        self.solution = None;

        let omega = 2.0 * std::f64::consts::PI * frequency;
        let state = problem.stack.state_at(&problem.excitation, omega)?;
        state.check_couplings(&problem.solver.couplings)?;
        let system = match problem.solver.method {
            Method::TransferMatrix => tmm::assemble(&state)?,
            Method::FiniteElement => fem::assemble(&state, &problem.solver.mesh)?,
        };
        trace!(frequency, method = ?problem.solver.method, "assembled");

        self.state = Some(state);
        self.system = Some(system);
        self.phase = SolverPhase::Assembled(frequency);
        Ok(())
    }

    pub fn solve(&mut self) -> Result<(), FrequencyError> {
        let frequency = match self.phase {
            SolverPhase::Assembled(frequency) => frequency,
            _ => return Err(self.illegal("solved").into()),
        };
        let (system, state) = match (self.system.take(), self.state.as_ref()) {
            (Some(system), Some(state)) => (system, state),
            _ => return Err(self.illegal("solved").into()),
        };
        self.phase = SolverPhase::Parameterized;

        let solution = match system {
            System::Chain(matrix) => {
                let y0 = state.incident.admittance(state.omega, state.kx);
                let yt = state.transmitted.map(|fluid| fluid.admittance(state.omega, state.kx));
                matrix.terminate(y0, yt)
            }
            System::Linear {
                matrix,
                rhs,
                reflection,
                transmission,
            } => {
                let x = linalg::solve(matrix, rhs)?;
                (x[reflection], transmission.map(|i| x[i]))
            }
        };
        self.solution = Some(solution);
        self.phase = SolverPhase::Solved(frequency);
        Ok(())
    }

    pub fn indicators(&self) -> Result<Indicators, ModelError> {
        match (self.phase, &self.state, self.solution) {
            (SolverPhase::Solved(frequency), Some(state), Some((r, t))) => Ok(Indicators::new(frequency, state, r, t)),
            _ => Err(self.illegal("indicators")),
        }
    }

    /// Releases the per-frequency data.
    pub fn finish(&mut self) -> Result<(), ModelError> {
        match self.phase {
            SolverPhase::Parameterized | SolverPhase::Solved(_) => {
                self.state = None;
                self.system = None;
                self.solution = None;
                self.phase = SolverPhase::Finalized;
                Ok(())
            }
            _ => Err(self.illegal("finalized")),
        }
    }

    /// Assembles, solves and reports one frequency.
    pub fn solve_frequency(&mut self, frequency: f64) -> Result<Indicators, FrequencyError> {
        self.assemble(frequency)?;
        self.solve()?;
        Ok(self.indicators()?)
    }
}
