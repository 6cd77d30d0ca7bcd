use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::media::MediumKind;

/// Interface condition between two media families, regardless of which one
/// is in front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouplingRule {
    /// Pressure and normal velocity continuous.
    FluidFluid,
    /// σ33 = −p, σ13 = 0, normal velocity continuous.
    FluidElastic,
    /// Biot conditions, open or sealed pores.
    FluidPoroelastic,
    /// Bonded: velocities and tractions continuous.
    ElasticElastic,
    /// Frame bonded to the solid, no flow through the face.
    ElasticPoroelastic,
    /// Biot conditions between two porous media, open or sealed pores.
    PoroelasticPoroelastic,
}

impl CouplingRule {
    pub const ALL: [CouplingRule; 6] = [
        Self::FluidFluid,
        Self::FluidElastic,
        Self::FluidPoroelastic,
        Self::ElasticElastic,
        Self::ElasticPoroelastic,
        Self::PoroelasticPoroelastic,
    ];

    pub fn between(a: MediumKind, b: MediumKind) -> Self {
        use MediumKind::*;
        match (a.min(b), a.max(b)) {
            (Fluid, Fluid) => Self::FluidFluid,
            (Fluid, Elastic) => Self::FluidElastic,
            (Fluid, Poroelastic) => Self::FluidPoroelastic,
            (Elastic, Elastic) => Self::ElasticElastic,
            (Elastic, Poroelastic) => Self::ElasticPoroelastic,
            // ordered pair: only (Poroelastic, Poroelastic) is left
            _ => Self::PoroelasticPoroelastic,
        }
    }
}

/// Set of declared coupling rules. Every rule is declared by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouplingTable {
    declared: BTreeSet<CouplingRule>,
}

impl Default for CouplingTable {
    fn default() -> Self {
        Self {
            declared: CouplingRule::ALL.into_iter().collect(),
        }
    }
}

impl FromIterator<CouplingRule> for CouplingTable {
    fn from_iter<I: IntoIterator<Item = CouplingRule>>(iter: I) -> Self {
        Self {
            declared: iter.into_iter().collect(),
        }
    }
}

impl CouplingTable {
    pub fn empty() -> Self {
        Self {
            declared: BTreeSet::new(),
        }
    }

    pub fn with(mut self, rule: CouplingRule) -> Self {
        self.declared.insert(rule);
        self
    }

    pub fn without(mut self, rule: CouplingRule) -> Self {
        self.declared.remove(&rule);
        self
    }

    pub fn contains(&self, rule: CouplingRule) -> bool {
        self.declared.contains(&rule)
    }

    /// Rule for the pair of families, if declared.
    pub fn rule(&self, a: MediumKind, b: MediumKind) -> Result<CouplingRule, ModelError> {
        let rule = CouplingRule::between(a, b);
        if self.declared.contains(&rule) {
            Ok(rule)
        } else {
            Err(ModelError::MissingCoupling {
                left: a.as_str(),
                right: b.as_str(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_is_symmetric() {
        use MediumKind::*;
        for a in [Fluid, Elastic, Poroelastic] {
            for b in [Fluid, Elastic, Poroelastic] {
                assert_eq!(CouplingRule::between(a, b), CouplingRule::between(b, a));
            }
        }
        assert_eq!(CouplingRule::between(Poroelastic, Fluid), CouplingRule::FluidPoroelastic);
    }

    #[test]
    fn test_undeclared_rule() {
        let table = CouplingTable::default().without(CouplingRule::FluidPoroelastic);
        assert_eq!(
            table.rule(MediumKind::Poroelastic, MediumKind::Fluid),
            Err(ModelError::MissingCoupling {
                left: "poroelastic",
                right: "fluid"
            })
        );
        assert!(table.rule(MediumKind::Fluid, MediumKind::Elastic).is_ok());
    }
}
