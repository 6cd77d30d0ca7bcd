//! Physical models of the media a layer can be made of.
//!
//! [`Medium`] is a closed set of models dispatched by [`ModelTag`]. Every
//! model goes through the same lifecycle: [`Medium::from_dict`] parses a
//! parameter map, [`Medium::compute_missing`] derives and validates the
//! rest, and [`Medium::state_at`] turns the resolved parameters into a
//! [`MediumState`] at one angular frequency.

pub mod elastic;
pub mod eqf;
pub mod fluid;
pub mod limp;
pub mod params;
pub mod pem;
pub mod state;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::constants::Air;
use crate::error::{ConfigurationError, ModelError};
use crate::fem::multipliers::{multipliers, PhysicalMultipliers};

pub use params::{ParamValue, Parameters};
pub use state::{Effective, MediumState};

/// Physical family of a medium. Interface conditions are selected from the
/// pair of families on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediumKind {
    Fluid,
    Elastic,
    Poroelastic,
}

impl MediumKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fluid => "fluid",
            Self::Elastic => "elastic",
            Self::Poroelastic => "poroelastic",
        }
    }
}

/// Governing-equation family of a medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTag {
    Fluid,
    Elastic,
    /// Rigid-frame equivalent fluid (JCA/JCAL).
    Eqf,
    /// Biot poroelastic medium.
    Pem,
    /// Limp-frame porous medium.
    Limp,
}

impl ModelTag {
    pub fn kind(self) -> MediumKind {
        match self {
            Self::Fluid | Self::Eqf => MediumKind::Fluid,
            Self::Elastic => MediumKind::Elastic,
            Self::Pem | Self::Limp => MediumKind::Poroelastic,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fluid => fluid::MODEL,
            Self::Elastic => elastic::MODEL,
            Self::Eqf => eqf::MODEL,
            Self::Pem => pem::MODEL,
            Self::Limp => limp::MODEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Inputs {
    Fluid(fluid::FluidInputs),
    Elastic(elastic::ElasticInputs),
    Eqf(eqf::JcaInputs),
    Pem(pem::PemInputs),
    Limp(pem::PemInputs),
}

/// Parameter record of a medium after [`Medium::compute_missing`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved {
    Fluid(fluid::FluidParams),
    Elastic(elastic::ElasticParams),
    Eqf(eqf::JcaParams),
    Pem(pem::PemParams),
    Limp(limp::LimpParams),
}

/// One physical material.
#[derive(Debug, Clone, PartialEq)]
pub struct Medium {
    tag: ModelTag,
    given: Parameters,
    inputs: Inputs,
    /// Saturating fluid of porous models.
    air: Air,
    resolved: Option<Resolved>,
    cache: Option<MediumState>,
}

fn parse(tag: ModelTag, params: &Parameters) -> Result<Inputs, ConfigurationError> {
    Ok(match tag {
        ModelTag::Fluid => Inputs::Fluid(fluid::parse(params)?),
        ModelTag::Elastic => Inputs::Elastic(elastic::parse(params)?),
        ModelTag::Eqf => Inputs::Eqf(eqf::parse(params)?),
        ModelTag::Pem => Inputs::Pem(pem::parse(pem::MODEL, params)?),
        ModelTag::Limp => Inputs::Limp(pem::parse(limp::MODEL, params)?),
    })
}

impl Medium {
    /// Builds a medium from a (possibly partial) parameter map, saturated
    /// with standard air when porous.
    pub fn from_dict(tag: ModelTag, params: &Parameters) -> Result<Self, ConfigurationError> {
        Self::with_air(tag, params, Air::default())
    }

    /// Same as [`Medium::from_dict`] with an explicit saturating fluid.
    pub fn with_air(tag: ModelTag, params: &Parameters, air: Air) -> Result<Self, ConfigurationError> {
        Ok(Self {
            tag,
            given: params.clone(),
            inputs: parse(tag, params)?,
            air,
            resolved: None,
            cache: None,
        })
    }

    /// Resolved fluid medium with the properties of `air`.
    pub fn from_air(air: Air) -> Self {
        let params = fluid::FluidParams {
            rho: air.density,
            c: air.sound_speed().into(),
            bulk_modulus: air.bulk_modulus().into(),
        };
        Self {
            tag: ModelTag::Fluid,
            given: fluid::canonical(&params),
            inputs: Inputs::Fluid(fluid::FluidInputs {
                rho: Some(params.rho),
                c: Some(params.c),
                bulk_modulus: None,
            }),
            air,
            resolved: Some(Resolved::Fluid(params)),
            cache: None,
        }
    }

    /// Standard air at 20 °C as a resolved fluid.
    pub fn air() -> Self {
        Self::from_air(Air::default())
    }

    pub fn model_tag(&self) -> ModelTag {
        self.tag
    }

    pub fn kind(&self) -> MediumKind {
        self.tag.kind()
    }

    pub fn resolved(&self) -> Option<&Resolved> {
        self.resolved.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Derives every parameter the model needs from the given ones and
    /// validates the result. Running it again is a no-op.
    pub fn compute_missing(&mut self) -> Result<(), ConfigurationError> {
        if self.resolved.is_some() {
            return Ok(());
        }
        let resolved = match &self.inputs {
            Inputs::Fluid(i) => Resolved::Fluid(fluid::resolve(i)?),
            Inputs::Elastic(i) => Resolved::Elastic(elastic::resolve(i)?),
            Inputs::Eqf(i) => Resolved::Eqf(eqf::resolve(eqf::MODEL, i, self.air)?),
            Inputs::Pem(i) => Resolved::Pem(pem::resolve(i, self.air)?),
            Inputs::Limp(i) => Resolved::Limp(limp::resolve(i, self.air)?),
        };
        trace!(model = self.tag.as_str(), "medium resolved");
        self.resolved = Some(resolved);
        Ok(())
    }

    /// Canonical parameter map: the resolved set once available, the given
    /// one before.
    pub fn to_dict(&self) -> Parameters {
        match &self.resolved {
            None => self.given.clone(),
            Some(Resolved::Fluid(p)) => fluid::canonical(p),
            Some(Resolved::Elastic(p)) => elastic::canonical(p),
            Some(Resolved::Eqf(p)) => eqf::canonical(p),
            Some(Resolved::Pem(p)) => pem::canonical(p),
            Some(Resolved::Limp(p)) => limp::canonical(p),
        }
    }

    /// Changes one static parameter. The resolved record and any cached
    /// frequency state are dropped.
    pub fn set_param(&mut self, key: &str, value: impl Into<ParamValue>) -> Result<(), ConfigurationError> {
        let mut given = self.given.clone();
        given.insert(key.to_string(), value.into());
        self.inputs = parse(self.tag, &given)?;
        self.given = given;
        self.resolved = None;
        self.cache = None;
        Ok(())
    }

    /// Frequency-dependent properties at angular frequency `omega`.
    pub fn state_at(&self, omega: f64) -> Result<MediumState, ModelError> {
        if !(omega.is_finite() && omega > 0.0) {
            return Err(ModelError::NonPhysical {
                quantity: "angular frequency",
                frequency: omega / (2.0 * std::f64::consts::PI),
            });
        }
        let resolved = self.resolved.as_ref().ok_or(ModelError::Unresolved)?;
        let effective = match resolved {
            Resolved::Fluid(p) => Effective::Fluid(fluid::evaluate(p)),
            Resolved::Elastic(p) => Effective::Elastic(elastic::evaluate(p)),
            Resolved::Eqf(p) => Effective::EqFluid(eqf::evaluate(p, omega)?),
            Resolved::Pem(p) => Effective::Biot(pem::evaluate(p, omega)?),
            Resolved::Limp(p) => Effective::Limp(limp::evaluate(p, omega)?),
        };
        Ok(MediumState { omega, effective })
    }

    /// Caches the state at `omega`, replacing the previous one.
    pub fn update_frequency(&mut self, omega: f64) -> Result<&MediumState, ModelError> {
        self.cache = None;
        let state = self.state_at(omega)?;
        Ok(self.cache.insert(state))
    }

    pub fn cached_state(&self) -> Option<&MediumState> {
        self.cache.as_ref()
    }

    /// FEM multipliers at the cached frequency.
    pub fn get_physical_multipliers(&self) -> Result<PhysicalMultipliers, ModelError> {
        self.cache.as_ref().map(multipliers).ok_or(ModelError::StaleState)
    }
}
