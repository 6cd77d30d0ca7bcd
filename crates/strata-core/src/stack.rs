//! Layered material stack and the boundary conditions around it.

use std::sync::Arc;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::coupling::CouplingTable;
use crate::error::{ConfigurationError, ModelError};
use crate::media::state::Acoustic;
use crate::media::{Medium, MediumKind, MediumState};

/// State of the pores on a face touching a poroelastic medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoreCondition {
    #[default]
    Open,
    /// Impervious film: no relative flow through the face.
    Sealed,
}

#[derive(Debug, Clone)]
pub struct Layer {
    /// Shared between layers made of the same material.
    pub medium: Arc<Medium>,
    /// Thickness in metres.
    pub thickness: f64,
    /// Condition on the face towards the excitation.
    pub front: PoreCondition,
}

impl Layer {
    pub fn new(medium: Arc<Medium>, thickness: f64) -> Self {
        Self {
            medium,
            thickness,
            front: PoreCondition::Open,
        }
    }

    pub fn sealed(mut self) -> Self {
        self.front = PoreCondition::Sealed;
        self
    }
}

/// What lies behind the last layer.
#[derive(Debug, Clone)]
pub enum Termination {
    /// Motionless, impervious wall.
    Rigid,
    /// Semi-infinite fluid receiving the transmitted wave.
    SemiInfinite(Arc<Medium>),
    /// Another stack, solved as a continuation of this one.
    Stack(Box<LayerStack>),
}

/// Incident plane wave.
#[derive(Debug, Clone)]
pub struct Excitation {
    /// Angle of incidence from the normal, in degrees.
    pub angle: f64,
    /// Semi-infinite fluid the wave comes from.
    pub medium: Arc<Medium>,
}

impl Default for Excitation {
    fn default() -> Self {
        Self {
            angle: 0.0,
            medium: Arc::new(Medium::air()),
        }
    }
}

impl Excitation {
    pub fn at_angle(angle: f64) -> Self {
        Self {
            angle,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.angle.is_finite() && self.angle.abs() < 90.0) {
            return Err(ConfigurationError::InvalidBoundary {
                details: format!("incidence angle {} must be within (-90, 90) degrees", self.angle),
            });
        }
        check_boundary_fluid("incident", &self.medium)
    }
}

fn check_boundary_fluid(side: &str, medium: &Medium) -> Result<(), ConfigurationError> {
    if medium.kind() != MediumKind::Fluid {
        return Err(ConfigurationError::InvalidBoundary {
            details: format!("{side} medium must be a fluid, got {}", medium.model_tag().as_str()),
        });
    }
    if !medium.is_resolved() {
        return Err(ConfigurationError::InvalidBoundary {
            details: format!("{side} medium parameters are not resolved"),
        });
    }
    Ok(())
}

/// Non-empty ordered list of layers, front (excitation side) first.
#[derive(Debug, Clone)]
pub struct LayerStack {
    layers: Vec<Layer>,
    termination: Termination,
}

impl LayerStack {
    pub fn new(layers: Vec<Layer>, termination: Termination) -> Result<Self, ConfigurationError> {
        if layers.is_empty() {
            return Err(ConfigurationError::EmptyStack);
        }
        for (index, layer) in layers.iter().enumerate() {
            if !(layer.thickness.is_finite() && layer.thickness > 0.0) {
                return Err(ConfigurationError::InvalidThickness {
                    index,
                    thickness: layer.thickness,
                });
            }
            if !layer.medium.is_resolved() {
                return Err(ConfigurationError::UnresolvedMedium { index });
            }
        }
        if let Termination::SemiInfinite(medium) = &termination {
            check_boundary_fluid("termination", medium)?;
        }
        Ok(Self { layers, termination })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn termination(&self) -> &Termination {
        &self.termination
    }

    /// All layers with nested termination stacks spliced in, and the final
    /// termination, which is never [`Termination::Stack`].
    pub fn flattened(&self) -> (Vec<&Layer>, &Termination) {
        let mut layers: Vec<&Layer> = self.layers.iter().collect();
        let mut termination = &self.termination;
        while let Termination::Stack(next) = termination {
            layers.extend(next.layers.iter());
            termination = &next.termination;
        }
        (layers, termination)
    }

    pub fn total_thickness(&self) -> f64 {
        self.flattened().0.iter().map(|l| l.thickness).sum()
    }

    /// Evaluates every distinct medium of the stack once at `omega`.
    pub fn state_at(&self, excitation: &Excitation, omega: f64) -> Result<StackState, ModelError> {
        let incident = fluid_state(&excitation.medium, omega)?;
        let kx = incident.wavenumber(omega) * excitation.angle.to_radians().sin();

        let (layers, termination) = self.flattened();
        let mut evaluated: Vec<(&Arc<Medium>, MediumState)> = Vec::new();
        let mut states = Vec::with_capacity(layers.len());
        for layer in layers {
            let state = match evaluated.iter().find(|(m, _)| Arc::ptr_eq(m, &layer.medium)) {
                Some((_, state)) => state.clone(),
                None => {
                    let state = layer.medium.state_at(omega)?;
                    evaluated.push((&layer.medium, state.clone()));
                    state
                }
            };
            states.push(LayerState {
                kind: layer.medium.kind(),
                state,
                thickness: layer.thickness,
                front: layer.front,
            });
        }
        trace!(layers = states.len(), media = evaluated.len(), "stack evaluated");

        let transmitted = match termination {
            Termination::SemiInfinite(medium) => Some(fluid_state(medium, omega)?),
            _ => None,
        };
        Ok(StackState {
            omega,
            kx,
            incident,
            layers: states,
            transmitted,
        })
    }
}

fn fluid_state(medium: &Medium, omega: f64) -> Result<Acoustic, ModelError> {
    medium
        .state_at(omega)?
        .acoustic()
        .ok_or(ModelError::NonPhysical {
            quantity: "boundary fluid",
            frequency: omega / (2.0 * std::f64::consts::PI),
        })
}

/// One layer at one frequency.
#[derive(Debug, Clone)]
pub struct LayerState {
    pub kind: MediumKind,
    pub state: MediumState,
    pub thickness: f64,
    pub front: PoreCondition,
}

/// A flattened stack with its boundary fluids, evaluated at one frequency.
#[derive(Debug, Clone)]
pub struct StackState {
    pub omega: f64,
    /// Trace wavenumber imposed by the incident wave, k·sin θ.
    pub kx: Complex64,
    pub incident: Acoustic,
    pub layers: Vec<LayerState>,
    /// Fluid behind the stack; `None` for a rigid wall.
    pub transmitted: Option<Acoustic>,
}

impl StackState {
    /// Fails on the first adjacent pair without a declared rule, the
    /// incident and transmitted fluids included.
    pub fn check_couplings(&self, table: &CouplingTable) -> Result<(), ModelError> {
        let mut previous = MediumKind::Fluid;
        for layer in &self.layers {
            table.rule(previous, layer.kind)?;
            previous = layer.kind;
        }
        if self.transmitted.is_some() {
            table.rule(previous, MediumKind::Fluid)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{ModelTag, Parameters};

    fn glass_wool() -> Arc<Medium> {
        let params = Parameters::from([
            ("phi".to_string(), 0.98.into()),
            ("sigma".to_string(), 21000.0.into()),
        ]);
        let mut medium = Medium::from_dict(ModelTag::Eqf, &params).unwrap();
        medium.compute_missing().unwrap();
        Arc::new(medium)
    }

    #[test]
    fn test_empty_stack_rejected() {
        assert_eq!(
            LayerStack::new(vec![], Termination::Rigid).unwrap_err(),
            ConfigurationError::EmptyStack
        );
    }

    #[test]
    fn test_thickness_must_be_positive() {
        let layers = vec![Layer::new(glass_wool(), 0.02), Layer::new(glass_wool(), 0.0)];
        assert!(matches!(
            LayerStack::new(layers, Termination::Rigid),
            Err(ConfigurationError::InvalidThickness { index: 1, .. })
        ));
    }

    #[test]
    fn test_unresolved_medium_rejected() {
        let params = Parameters::from([("phi".to_string(), 0.98.into())]);
        let raw = Arc::new(Medium::from_dict(ModelTag::Eqf, &params).unwrap());
        assert_eq!(
            LayerStack::new(vec![Layer::new(raw, 0.01)], Termination::Rigid).unwrap_err(),
            ConfigurationError::UnresolvedMedium { index: 0 }
        );
    }

    #[test]
    fn test_nested_stack_flattens() {
        let wool = glass_wool();
        let back = LayerStack::new(
            vec![Layer::new(wool.clone(), 0.03)],
            Termination::SemiInfinite(Arc::new(Medium::air())),
        )
        .unwrap();
        let stack = LayerStack::new(
            vec![Layer::new(wool.clone(), 0.02).sealed()],
            Termination::Stack(Box::new(back)),
        )
        .unwrap();
        let (layers, termination) = stack.flattened();
        assert_eq!(layers.len(), 2);
        assert!(Arc::ptr_eq(&layers[0].medium, &layers[1].medium));
        assert!(matches!(termination, Termination::SemiInfinite(_)));
        assert!((stack.total_thickness() - 0.05).abs() < 1e-15);
    }

    #[test]
    fn test_shared_medium_evaluated_once() {
        let wool = glass_wool();
        let stack = LayerStack::new(
            vec![Layer::new(wool.clone(), 0.01), Layer::new(wool, 0.02)],
            Termination::Rigid,
        )
        .unwrap();
        let state = stack.state_at(&Excitation::at_angle(30.0), 2000.0).unwrap();
        assert_eq!(state.layers.len(), 2);
        assert_eq!(state.layers[0].state, state.layers[1].state);
        let k = state.incident.wavenumber(2000.0);
        assert!((state.kx - k * 0.5).norm() < 1e-12 * k.norm());
        assert!(state.transmitted.is_none());
    }

    #[test]
    fn test_coupling_check_covers_boundaries() {
        use crate::coupling::CouplingRule;
        let stack = LayerStack::new(
            vec![Layer::new(glass_wool(), 0.01)],
            Termination::SemiInfinite(Arc::new(Medium::air())),
        )
        .unwrap();
        let state = stack.state_at(&Excitation::default(), 1000.0).unwrap();
        let table = CouplingTable::empty();
        assert!(state.check_couplings(&table).is_err());
        let table = table.with(CouplingRule::FluidFluid);
        assert!(state.check_couplings(&table).is_ok());
    }

    #[test]
    fn test_grazing_incidence_rejected() {
        assert!(Excitation::at_angle(89.0).validate().is_ok());
        assert!(matches!(
            Excitation::at_angle(90.0).validate(),
            Err(ConfigurationError::InvalidBoundary { .. })
        ));
    }
}
