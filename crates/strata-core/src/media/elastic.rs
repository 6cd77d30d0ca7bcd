use num_complex::Complex64;

use super::params::{check_range, exclusive, require, ParamReader, Parameters};
use super::state::ElasticState;
use crate::error::ConfigurationError;

pub const MODEL: &str = "elastic";

/// Either Young's modulus and Poisson ratio, or the two Lamé constants.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElasticInputs {
    pub rho: Option<f64>,
    pub young: Option<f64>,
    pub poisson: Option<f64>,
    /// Lamé constants may carry their own loss as an imaginary part.
    pub lambda: Option<Complex64>,
    pub mu: Option<Complex64>,
    pub eta: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElasticParams {
    pub rho: f64,
    /// From the real parts of the Lamé constants when those are given.
    pub young: f64,
    pub poisson: f64,
    /// Loss factor.
    pub eta: f64,
    /// λ(1 + jη)
    pub lambda: Complex64,
    /// μ(1 + jη)
    pub mu: Complex64,
}

impl ElasticParams {
    /// Whether the Lamé constants are the structural-damping ones of
    /// (E, ν, η), so that those three describe the solid completely.
    fn is_structural(&self) -> bool {
        let (lambda, mu) = lame(self.young, self.poisson, self.eta);
        let close = |a: Complex64, b: Complex64| (a - b).norm() <= 1e-12 * a.norm().max(b.norm());
        close(lambda, self.lambda) && close(mu, self.mu)
    }
}

pub(crate) fn parse(params: &Parameters) -> Result<ElasticInputs, ConfigurationError> {
    let mut reader = ParamReader::new(MODEL, params);
    let inputs = ElasticInputs {
        rho: reader.real("rho")?,
        young: reader.real("E")?,
        poisson: reader.real("nu")?,
        lambda: reader.complex("lambda")?,
        mu: reader.complex("mu")?,
        eta: reader.real("eta")?,
    };
    reader.finish()?;

    exclusive(("E", &inputs.young), ("lambda", &inputs.lambda))?;
    exclusive(("E", &inputs.young), ("mu", &inputs.mu))?;
    exclusive(("nu", &inputs.poisson), ("lambda", &inputs.lambda))?;
    exclusive(("nu", &inputs.poisson), ("mu", &inputs.mu))?;
    Ok(inputs)
}

/// Validates a Young's modulus / Poisson ratio pair.
pub(crate) fn check_engineering_constants(young: f64, poisson: f64) -> Result<(), ConfigurationError> {
    check_range("E", young, "> 0", |v| v > 0.0)?;
    check_range("nu", poisson, "in (-1, 0.5)", |v| v > -1.0 && v < 0.5)?;
    Ok(())
}

/// Lamé constants with structural damping: (λ(1+jη), μ(1+jη)).
pub(crate) fn lame(young: f64, poisson: f64, eta: f64) -> (Complex64, Complex64) {
    let loss = Complex64::new(1.0, eta);
    let lambda = young * poisson / ((1.0 + poisson) * (1.0 - 2.0 * poisson));
    let mu = young / (2.0 * (1.0 + poisson));
    (lambda * loss, mu * loss)
}

pub(crate) fn resolve(inputs: &ElasticInputs) -> Result<ElasticParams, ConfigurationError> {
    let rho = require(MODEL, "rho", inputs.rho)?;
    check_range("rho", rho, "> 0", |v| v > 0.0)?;
    let eta = check_range("eta", inputs.eta.unwrap_or(0.0), ">= 0", |v| v >= 0.0)?;

    let loss = Complex64::new(1.0, eta);
    let (young, poisson, lambda, mu) = if inputs.young.is_some() || inputs.poisson.is_some() {
        let young = require(MODEL, "E", inputs.young)?;
        let poisson = require(MODEL, "nu", inputs.poisson)?;
        check_engineering_constants(young, poisson)?;
        let (lambda, mu) = lame(young, poisson, eta);
        (young, poisson, lambda, mu)
    } else if inputs.lambda.is_some() || inputs.mu.is_some() {
        let lambda = require(MODEL, "lambda", inputs.lambda)?;
        let mu = require(MODEL, "mu", inputs.mu)?;
        check_range("mu", mu.re, "> 0", |v| v > 0.0)?;
        check_range("mu", mu.im, "imaginary part >= 0", |v| v >= 0.0)?;
        check_range("lambda", lambda.re, "> -2mu/3", |v| v > -2.0 * mu.re / 3.0)?;
        let young = mu.re * (3.0 * lambda.re + 2.0 * mu.re) / (lambda.re + mu.re);
        let poisson = lambda.re / (2.0 * (lambda.re + mu.re));
        check_engineering_constants(young, poisson)?;
        (young, poisson, lambda * loss, mu * loss)
    } else {
        return Err(ConfigurationError::UnderDetermined {
            model: MODEL,
            missing: "E",
        });
    };

    Ok(ElasticParams {
        rho,
        young,
        poisson,
        eta,
        lambda,
        mu,
    })
}

/// `rho, E, nu, eta` for structurally damped solids; `rho, lambda, mu`
/// with the loss folded into the complex constants otherwise.
pub(crate) fn canonical(params: &ElasticParams) -> Parameters {
    if params.is_structural() {
        Parameters::from([
            ("rho".to_string(), params.rho.into()),
            ("E".to_string(), params.young.into()),
            ("nu".to_string(), params.poisson.into()),
            ("eta".to_string(), params.eta.into()),
        ])
    } else {
        Parameters::from([
            ("rho".to_string(), params.rho.into()),
            ("lambda".to_string(), params.lambda.into()),
            ("mu".to_string(), params.mu.into()),
        ])
    }
}

/// Elastic constants do not depend on frequency.
pub(crate) fn evaluate(params: &ElasticParams) -> ElasticState {
    ElasticState {
        density: params.rho,
        lambda: params.lambda,
        mu: params.mu,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aluminium() -> ElasticInputs {
        ElasticInputs {
            rho: Some(2700.0),
            young: Some(70e9),
            poisson: Some(0.33),
            eta: Some(0.01),
            ..Default::default()
        }
    }

    #[test]
    fn test_lame_constants_carry_loss() {
        let p = resolve(&aluminium()).unwrap();
        let mu = 70e9 / (2.0 * 1.33);
        assert!((p.mu.re - mu).abs() / mu < 1e-12);
        assert!((p.mu.im - 0.01 * mu).abs() / mu < 1e-12);
        assert!(p.lambda.re > 0.0);
    }

    #[test]
    fn test_engineering_constants_from_lame() {
        let reference = resolve(&aluminium()).unwrap();
        let inputs = ElasticInputs {
            rho: Some(2700.0),
            lambda: Some(reference.lambda.re.into()),
            mu: Some(reference.mu.re.into()),
            eta: Some(0.01),
            ..Default::default()
        };
        let p = resolve(&inputs).unwrap();
        assert!((p.young - 70e9).abs() / 70e9 < 1e-12);
        assert!((p.poisson - 0.33).abs() < 1e-12);
    }

    /// Complex Lamé constants keep their own loss, which survives the
    /// canonical parameter set.
    #[test]
    fn test_complex_lame_constants() {
        let lambda = Complex64::new(5.1e10, 2.0e8);
        let mu = Complex64::new(2.6e10, 5.0e8);
        let params = Parameters::from([
            ("rho".to_string(), 2700.0.into()),
            ("lambda".to_string(), lambda.into()),
            ("mu".to_string(), mu.into()),
        ]);
        let p = resolve(&parse(&params).unwrap()).unwrap();
        assert_eq!((p.lambda, p.mu), (lambda, mu));
        assert!((p.poisson - 5.1 / (2.0 * 7.7)).abs() < 1e-12);

        let canonical = canonical(&p);
        assert_eq!(canonical, params);
        let again = resolve(&parse(&canonical).unwrap()).unwrap();
        assert_eq!(again, p);

        let lossy = Parameters::from([
            ("rho".to_string(), 2700.0.into()),
            ("lambda".to_string(), lambda.into()),
            ("mu".to_string(), Complex64::new(2.6e10, -5.0e8).into()),
        ]);
        assert!(matches!(
            resolve(&parse(&lossy).unwrap()),
            Err(ConfigurationError::OutOfRange { key: "mu", .. })
        ));
    }

    #[test]
    fn test_poisson_ratio_range() {
        let mut inputs = aluminium();
        inputs.poisson = Some(0.5);
        assert!(matches!(
            resolve(&inputs),
            Err(ConfigurationError::OutOfRange { key: "nu", .. })
        ));
    }

    #[test]
    fn test_young_and_lame_are_exclusive() {
        let params = Parameters::from([
            ("rho".to_string(), 2700.0.into()),
            ("E".to_string(), 70e9.into()),
            ("lambda".to_string(), 5e10.into()),
        ]);
        assert!(matches!(
            parse(&params),
            Err(ConfigurationError::MutuallyExclusive { .. })
        ));
    }
}
