//! Deserialised problem description and its conversion into a [`Problem`].
//!
//! Reading the description from a file is left to the caller; anything that
//! implements serde's data model works.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::Air;
use crate::error::ConfigurationError;
use crate::frequency_response::FrequencyGrid;
use crate::media::{Medium, ModelTag, Parameters};
use crate::solver::SolverConfig;
use crate::stack::{Excitation, Layer, LayerStack, PoreCondition, Termination};
use crate::Problem;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediumConfig {
    pub model: ModelTag,
    #[serde(default)]
    pub params: Parameters,
}

/// A medium given by name from [`ProblemConfig::media`], or inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediumRef {
    Named(String),
    Inline(MediumConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub medium: MediumRef,
    /// Thickness in metres.
    pub thickness: f64,
    #[serde(default)]
    pub front: PoreCondition,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcitationConfig {
    /// Degrees from the normal.
    pub angle: f64,
    /// Defaults to the problem's air.
    pub medium: Option<MediumRef>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerminationConfig {
    #[default]
    Rigid,
    SemiInfinite {
        /// Defaults to the problem's air.
        #[serde(default)]
        medium: Option<MediumRef>,
    },
    Stack {
        layers: Vec<LayerConfig>,
        #[serde(default)]
        termination: Box<TerminationConfig>,
    },
}

/// Complete description of a layered problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemConfig {
    /// Saturating fluid of porous media and default boundary fluid.
    #[serde(default)]
    pub air: Air,
    /// Media shared by name between layers.
    #[serde(default)]
    pub media: BTreeMap<String, MediumConfig>,
    pub layers: Vec<LayerConfig>,
    #[serde(default)]
    pub frequencies: FrequencyGrid,
    #[serde(default)]
    pub excitation: ExcitationConfig,
    #[serde(default)]
    pub termination: TerminationConfig,
    #[serde(default)]
    pub solver: SolverConfig,
}

struct Builder<'c> {
    air: Air,
    named: BTreeMap<&'c str, Arc<Medium>>,
}

impl<'c> Builder<'c> {
    fn medium(&self, config: &MediumConfig) -> Result<Arc<Medium>, ConfigurationError> {
        let mut medium = Medium::with_air(config.model, &config.params, self.air)?;
        medium.compute_missing()?;
        Ok(Arc::new(medium))
    }

    fn lookup(&self, reference: &MediumRef) -> Result<Option<Arc<Medium>>, ConfigurationError> {
        match reference {
            MediumRef::Named(name) => Ok(self.named.get(name.as_str()).cloned()),
            MediumRef::Inline(config) => self.medium(config).map(Some),
        }
    }

    fn boundary(&self, side: &str, reference: Option<&MediumRef>) -> Result<Arc<Medium>, ConfigurationError> {
        match reference {
            None => Ok(Arc::new(Medium::from_air(self.air))),
            Some(reference) => self.lookup(reference)?.ok_or_else(|| ConfigurationError::InvalidBoundary {
                details: format!("{side} medium {reference:?} is not defined"),
            }),
        }
    }

    fn stack(&self, layers: &[LayerConfig], termination: &TerminationConfig) -> Result<LayerStack, ConfigurationError> {
        let layers = layers
            .iter()
            .enumerate()
            .map(|(index, layer)| -> Result<Layer, ConfigurationError> {
                let medium = self.lookup(&layer.medium)?.ok_or_else(|| ConfigurationError::UnknownMedium {
                    index,
                    name: match &layer.medium {
                        MediumRef::Named(name) => name.clone(),
                        MediumRef::Inline(config) => config.model.as_str().to_string(),
                    },
                })?;
                Ok(Layer {
                    medium,
                    thickness: layer.thickness,
                    front: layer.front,
                })
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;

        let termination = match termination {
            TerminationConfig::Rigid => Termination::Rigid,
            TerminationConfig::SemiInfinite { medium } => Termination::SemiInfinite(self.boundary("termination", medium.as_ref())?),
            TerminationConfig::Stack { layers, termination } => Termination::Stack(Box::new(self.stack(layers, termination)?)),
        };
        LayerStack::new(layers, termination)
    }
}

impl ProblemConfig {
    /// Builds and resolves every medium, the stack and the frequency grid.
    /// Any error here aborts the run before a frequency is solved.
    pub fn build(&self) -> Result<Problem, ConfigurationError> {
        let mut builder = Builder {
            air: self.air,
            named: BTreeMap::new(),
        };
        for (name, config) in &self.media {
            let medium = builder.medium(config)?;
            builder.named.insert(name.as_str(), medium);
        }

        let stack = builder.stack(&self.layers, &self.termination)?;
        let excitation = Excitation {
            angle: self.excitation.angle,
            medium: builder.boundary("incident", self.excitation.medium.as_ref())?,
        };
        excitation.validate()?;
        let frequencies = self.frequencies.frequencies()?;
        debug!(
            layers = stack.flattened().0.len(),
            media = self.media.len(),
            frequencies = frequencies.len(),
            "problem built"
        );
        Ok(Problem {
            stack,
            excitation,
            frequencies,
            solver: self.solver.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupling::CouplingRule;
    use crate::solver::Method;
    use serde_json::json;

    fn foam_problem() -> serde_json::Value {
        json!({
            "media": {
                "wool": { "model": "eqf", "params": { "phi": 0.98, "sigma": 21000.0 } }
            },
            "layers": [
                { "medium": "wool", "thickness": 0.02 },
                { "medium": { "model": "fluid", "params": { "rho": 1.213, "c": 342.2 } }, "thickness": 0.01 },
                { "medium": "wool", "thickness": 0.02 }
            ],
            "frequencies": { "kind": "explicit", "values": [1000.0, 250.0] }
        })
    }

    #[test]
    fn test_build_shares_named_media() {
        let config: ProblemConfig = serde_json::from_value(foam_problem()).unwrap();
        let problem = config.build().unwrap();
        let layers = problem.stack.layers();
        assert_eq!(layers.len(), 3);
        assert!(Arc::ptr_eq(&layers[0].medium, &layers[2].medium));
        assert!(!Arc::ptr_eq(&layers[0].medium, &layers[1].medium));
        assert_eq!(problem.frequencies, vec![250.0, 1000.0]);
        assert!(matches!(problem.stack.termination(), Termination::Rigid));
        assert_eq!(problem.excitation.angle, 0.0);
        assert_eq!(problem.solver.method, Method::TransferMatrix);
    }

    #[test]
    fn test_unknown_medium_name() {
        let mut value = foam_problem();
        value["layers"][1]["medium"] = json!("felt");
        let config: ProblemConfig = serde_json::from_value(value).unwrap();
        assert_eq!(
            config.build().unwrap_err(),
            ConfigurationError::UnknownMedium {
                index: 1,
                name: "felt".to_string()
            }
        );
    }

    #[test]
    fn test_parameter_errors_abort_build() {
        let mut value = foam_problem();
        value["media"]["wool"]["params"]["colour"] = json!("yellow");
        let config: ProblemConfig = serde_json::from_value(value).unwrap();
        assert!(matches!(
            config.build().unwrap_err(),
            ConfigurationError::UnknownParameter { .. }
        ));
    }

    #[test]
    fn test_nested_termination_and_solver_settings() {
        let mut value = foam_problem();
        value["termination"] = json!({
            "kind": "stack",
            "layers": [ { "medium": "wool", "thickness": 0.03, "front": "sealed" } ],
            "termination": { "kind": "semi_infinite" }
        });
        value["excitation"] = json!({ "angle": 45.0 });
        value["solver"] = json!({
            "method": "finite_element",
            "mesh": { "elements_per_wavelength": 12.0 },
            "couplings": ["fluid_fluid"]
        });
        let config: ProblemConfig = serde_json::from_value(value).unwrap();
        let problem = config.build().unwrap();

        let (layers, last) = problem.stack.flattened();
        assert_eq!(layers.len(), 4);
        assert_eq!(layers[3].front, PoreCondition::Sealed);
        assert!(matches!(last, Termination::SemiInfinite(_)));
        assert_eq!(problem.solver.method, Method::FiniteElement);
        assert_eq!(problem.solver.mesh.elements_per_wavelength, 12.0);
        assert_eq!(problem.solver.mesh.min_elements, 6);
        assert!(problem.solver.couplings.contains(CouplingRule::FluidFluid));
        assert!(!problem.solver.couplings.contains(CouplingRule::FluidPoroelastic));
    }

    #[test]
    fn test_boundary_must_be_fluid() {
        let mut value = foam_problem();
        value["media"]["steel"] = json!({ "model": "elastic", "params": { "rho": 7800.0, "E": 2.1e11, "nu": 0.3 } });
        value["excitation"] = json!({ "medium": "steel" });
        let config: ProblemConfig = serde_json::from_value(value).unwrap();
        assert!(matches!(
            config.build().unwrap_err(),
            ConfigurationError::InvalidBoundary { .. }
        ));
    }

    #[test]
    fn test_grazing_incidence_rejected() {
        let mut value = foam_problem();
        value["excitation"] = json!({ "angle": 90.0 });
        let config: ProblemConfig = serde_json::from_value(value).unwrap();
        assert!(matches!(
            config.build().unwrap_err(),
            ConfigurationError::InvalidBoundary { .. }
        ));
    }
}
