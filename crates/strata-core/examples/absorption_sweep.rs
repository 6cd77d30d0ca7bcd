//! Absorption of a foam panel with an air gap in front of a wall.
//!
//! Builds the problem through the public API, sweeps it with both methods
//! and prints α per frequency.
//!
//! Run with:
//!   cargo run -p strata-core --example absorption_sweep

use std::sync::Arc;

use strata_core::{
    Excitation, FrequencyGrid, Layer, LayerStack, Medium, Method, ModelTag, Parameters, Problem, SolverConfig,
    Termination,
};

fn medium(tag: ModelTag, params: &[(&str, f64)]) -> strata_core::Result<Arc<Medium>> {
    let params: Parameters = params.iter().map(|&(k, v)| (k.to_string(), v.into())).collect();
    let mut medium = Medium::from_dict(tag, &params)?;
    medium.compute_missing()?;
    Ok(Arc::new(medium))
}

fn main() -> strata_core::Result<()> {
    println!("=== Foam panel absorption ===");

    let foam = medium(
        ModelTag::Pem,
        &[
            ("phi", 0.99),
            ("sigma", 10900.0),
            ("alpha", 1.02),
            ("Lambda", 100e-6),
            ("Lambda_prime", 130e-6),
            ("rho_1", 8.43),
            ("E", 4.4e6),
            ("nu", 0.3),
            ("eta", 0.1),
        ],
    )?;
    let gap = Arc::new(Medium::air());

    let stack = LayerStack::new(vec![Layer::new(foam, 0.05), Layer::new(gap, 0.02)], Termination::Rigid)?;
    let frequencies = FrequencyGrid::default().frequencies()?;

    for method in [Method::TransferMatrix, Method::FiniteElement] {
        let problem = Problem {
            stack: stack.clone(),
            excitation: Excitation::at_angle(30.0),
            frequencies: frequencies.clone(),
            solver: SolverConfig {
                method,
                ..SolverConfig::default()
            },
        };
        println!("\n{method:?}, {} cm total, 30° incidence", problem.stack.total_thickness() * 100.0);
        for point in problem.sweep_parallel()? {
            match &point.outcome {
                Ok(indicators) => println!("{:>8.1} Hz  α = {:.3}", point.frequency, indicators.absorption),
                Err(failure) => println!("{:>8.1} Hz  failed: {}", point.frequency, failure.reason),
            }
        }
    }
    Ok(())
}
