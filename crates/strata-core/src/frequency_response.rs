use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigurationError, FrequencyError, Result};
use crate::solver::{Indicators, Solver};
use crate::Problem;

/// Frequencies of a sweep, in Hz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrequencyGrid {
    Explicit { values: Vec<f64> },
    /// `start`, `start + step`, … up to `stop` inclusive.
    Linear { start: f64, stop: f64, step: f64 },
    /// `points` frequencies evenly spaced on a log scale, both ends included.
    Logarithmic { start: f64, stop: f64, points: usize },
}

impl Default for FrequencyGrid {
    /// Eighteen log-spaced frequencies from 100 Hz to 5 kHz, close to the
    /// third-octave band centres.
    fn default() -> Self {
        Self::Logarithmic {
            start: 100.0,
            stop: 5000.0,
            points: 18,
        }
    }
}

/// Most frequencies a linear or logarithmic grid may expand to.
pub const MAX_GRID_POINTS: usize = 1_000_000;

fn invalid(details: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidGrid { details: details.into() }
}

impl FrequencyGrid {
    /// The grid in increasing order.
    ///
    /// Explicit values are only required to be finite: a non-positive one
    /// is kept and fails on its own when solved.
    pub fn frequencies(&self) -> std::result::Result<Vec<f64>, ConfigurationError> {
        let mut values = match *self {
            Self::Explicit { ref values } => {
                if values.is_empty() {
                    return Err(invalid("no frequencies given"));
                }
                if let Some(bad) = values.iter().find(|f| !f.is_finite()) {
                    return Err(invalid(format!("frequency {bad} is not finite")));
                }
                values.clone()
            }
            Self::Linear { start, stop, step } => {
                if !(start > 0.0 && stop.is_finite() && stop >= start) {
                    return Err(invalid(format!("range [{start}, {stop}] must be positive and increasing")));
                }
                if !(step > 0.0 && step.is_finite()) {
                    return Err(invalid(format!("step {step} must be positive")));
                }
                let count = ((stop - start) / step * (1.0 + 1e-12)).floor() + 1.0;
                if !(count <= MAX_GRID_POINTS as f64) {
                    return Err(invalid(format!(
                        "step {step} gives {count:.3e} points, more than {MAX_GRID_POINTS}"
                    )));
                }
                let count = count as usize;
                (0..count).map(|i| start + i as f64 * step).collect()
            }
            Self::Logarithmic { start, stop, points } => {
                if !(start > 0.0 && stop.is_finite() && stop >= start) {
                    return Err(invalid(format!("range [{start}, {stop}] must be positive and increasing")));
                }
                match points {
                    0 => return Err(invalid("at least one point is required")),
                    n if n > MAX_GRID_POINTS => {
                        return Err(invalid(format!("{n} points requested, more than {MAX_GRID_POINTS}")))
                    }
                    1 => vec![start],
                    _ => {
                        let ratio = (stop / start).ln() / (points - 1) as f64;
                        (0..points).map(|i| start * (ratio * i as f64).exp()).collect()
                    }
                }
            }
        };
        values.sort_by(f64::total_cmp);
        Ok(values)
    }
}

/// Why a frequency produced no indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyFailure {
    /// `model` or `solver`.
    pub kind: String,
    pub reason: String,
}

impl From<FrequencyError> for FrequencyFailure {
    fn from(err: FrequencyError) -> Self {
        Self {
            kind: err.kind().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result of one requested frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub frequency: f64,
    pub outcome: std::result::Result<Indicators, FrequencyFailure>,
}

impl SweepPoint {
    pub fn indicators(&self) -> Option<&Indicators> {
        self.outcome.as_ref().ok()
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

fn record(frequency: f64, outcome: std::result::Result<Indicators, FrequencyError>) -> SweepPoint {
    if let Err(err) = &outcome {
        warn!(frequency, kind = err.kind(), %err, "frequency failed");
    }
    SweepPoint {
        frequency,
        outcome: outcome.map_err(FrequencyFailure::from),
    }
}

/// Solves every frequency in turn, recording failures in place.
pub(crate) fn run<F>(frequencies: &[f64], mut solve: F) -> Vec<SweepPoint>
where
    F: FnMut(f64) -> std::result::Result<Indicators, FrequencyError>,
{
    frequencies.iter().map(|&f| record(f, solve(f))).collect()
}

fn summarize(points: &[SweepPoint]) {
    let failed = points.iter().filter(|p| !p.is_ok()).count();
    debug!(points = points.len(), failed, "sweep finished");
}

/// Sweeps the problem's frequencies with a single solver.
pub fn sweep(problem: &Problem) -> Result<Vec<SweepPoint>> {
    debug!(
        points = problem.frequencies.len(),
        method = ?problem.solver.method,
        "sweep started"
    );
    let mut solver = Solver::new();
    solver.configure(problem)?;
    let points = run(&problem.frequencies, |f| solver.solve_frequency(f));
    solver.finish()?;
    summarize(&points);
    Ok(points)
}

/// Same as [`sweep`], one solver per frequency on the rayon pool. The stack
/// is shared read-only; results keep the frequency order.
pub fn sweep_parallel(problem: &Problem) -> Result<Vec<SweepPoint>> {
    debug!(
        points = problem.frequencies.len(),
        method = ?problem.solver.method,
        "parallel sweep started"
    );
    let points: Vec<SweepPoint> = problem
        .frequencies
        .par_iter()
        .map(|&f| {
            let mut solver = Solver::new();
            let outcome = solver
                .configure(problem)
                .map_err(FrequencyError::from)
                .and_then(|()| solver.solve_frequency(f));
            record(f, outcome)
        })
        .collect();
    summarize(&points);
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ModelError, SolverError};
    use num_complex::Complex64;

    fn indicators(frequency: f64) -> Indicators {
        Indicators {
            frequency,
            reflection: Complex64::new(0.5, 0.0),
            transmission: Complex64::new(0.0, 0.0),
            absorption: 0.75,
            transmission_loss: None,
        }
    }

    #[test]
    fn test_linear_grid_includes_stop() {
        let grid = FrequencyGrid::Linear {
            start: 100.0,
            stop: 1000.0,
            step: 100.0,
        };
        let f = grid.frequencies().unwrap();
        assert_eq!(f.len(), 10);
        assert_eq!(f[0], 100.0);
        assert!((f[9] - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_logarithmic_grid_ends() {
        let grid = FrequencyGrid::Logarithmic {
            start: 100.0,
            stop: 10_000.0,
            points: 3,
        };
        let f = grid.frequencies().unwrap();
        assert_eq!(f.len(), 3);
        assert!((f[1] - 1000.0).abs() < 1e-9);
        assert!((f[2] - 10_000.0).abs() < 1e-7);
    }

    #[test]
    fn test_explicit_grid_is_sorted() {
        let grid = FrequencyGrid::Explicit {
            values: vec![2000.0, 125.0, 500.0],
        };
        assert_eq!(grid.frequencies().unwrap(), vec![125.0, 500.0, 2000.0]);
    }

    #[test]
    fn test_invalid_grids() {
        let bad = [
            FrequencyGrid::Explicit { values: vec![] },
            FrequencyGrid::Explicit {
                values: vec![100.0, f64::NAN],
            },
            FrequencyGrid::Linear {
                start: 0.0,
                stop: 100.0,
                step: 10.0,
            },
            FrequencyGrid::Linear {
                start: 10.0,
                stop: 100.0,
                step: 0.0,
            },
            FrequencyGrid::Logarithmic {
                start: 100.0,
                stop: 50.0,
                points: 4,
            },
            FrequencyGrid::Logarithmic {
                start: 100.0,
                stop: 500.0,
                points: 0,
            },
        ];
        for grid in bad {
            assert!(
                matches!(grid.frequencies(), Err(ConfigurationError::InvalidGrid { .. })),
                "{grid:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_grid_size_is_capped() {
        let fine = FrequencyGrid::Linear {
            start: 1.0,
            stop: 1e6,
            step: 1e-12,
        };
        assert!(matches!(fine.frequencies(), Err(ConfigurationError::InvalidGrid { .. })));
        let dense = FrequencyGrid::Logarithmic {
            start: 20.0,
            stop: 20_000.0,
            points: usize::MAX,
        };
        assert!(matches!(dense.frequencies(), Err(ConfigurationError::InvalidGrid { .. })));
        let largest = FrequencyGrid::Linear {
            start: 1.0,
            stop: MAX_GRID_POINTS as f64,
            step: 1.0,
        };
        assert_eq!(largest.frequencies().unwrap().len(), MAX_GRID_POINTS);
    }

    /// A failure at one frequency is recorded against it and the sweep goes
    /// on with the next one.
    #[test]
    fn test_failures_are_recorded_not_dropped() {
        let frequencies = [100.0, 200.0, 300.0];
        let points = run(&frequencies, |f| {
            if f == 200.0 {
                Err(SolverError::Singular { size: 4 }.into())
            } else {
                Ok(indicators(f))
            }
        });
        assert_eq!(points.len(), 3);
        assert!(points[0].is_ok());
        assert!(points[2].is_ok());
        let failure = points[1].outcome.as_ref().unwrap_err();
        assert_eq!(failure.kind, "solver");
        assert!(failure.reason.contains("singular"), "{}", failure.reason);
        assert_eq!(points[1].frequency, 200.0);
    }

    #[test]
    fn test_failure_kind_follows_error_family() {
        let failure = FrequencyFailure::from(FrequencyError::from(ModelError::StaleState));
        assert_eq!(failure.kind, "model");
    }

    #[test]
    fn test_sweep_point_serializes() {
        let point = SweepPoint {
            frequency: 500.0,
            outcome: Ok(indicators(500.0)),
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["frequency"], 500.0);
        assert_eq!(json["outcome"]["Ok"]["absorption"], 0.75);
        let back: SweepPoint = serde_json::from_value(json).unwrap();
        assert_eq!(back, point);
    }
}
