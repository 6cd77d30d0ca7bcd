use serde::{Deserialize, Serialize};

/// Specific gas constant of dry air in J/(kg·K).
const R_SPECIFIC: f64 = 287.05;
/// Standard atmospheric pressure in Pa.
const P_ATM: f64 = 1.01325e5;

/// Saturating/ambient air. Every porous model and the default incident
/// medium read their fluid constants from here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Air {
    /// Temperature in K.
    pub temperature: f64,
    /// Static pressure in Pa.
    pub pressure: f64,
    /// Ratio of specific heats.
    pub gamma: f64,
    /// Dynamic viscosity in Pa·s.
    pub viscosity: f64,
    /// Prandtl number.
    pub prandtl: f64,
    /// Density in kg/m³.
    pub density: f64,
}

impl Default for Air {
    /// Standard air at 20 °C.
    fn default() -> Self {
        Self {
            temperature: 293.15,
            pressure: P_ATM,
            gamma: 1.400,
            viscosity: 0.1839e-4,
            prandtl: 0.710,
            density: 1.213,
        }
    }
}

impl Air {
    /// Air at `temperature_c` °C and atmospheric pressure.
    ///
    /// Ideal-gas density, Sutherland's law for the viscosity.
    pub fn at_temperature(temperature_c: f64) -> Self {
        let t_kelvin = temperature_c + 273.15;
        // ρ = p / (R_specific · T)
        let density = P_ATM / (R_SPECIFIC * t_kelvin);
        // μ = μ_ref (T/T_ref)^1.5 (T_ref + S)/(T + S)
        let viscosity = 1.716e-5 * (t_kelvin / 273.15).powf(1.5) * (273.15 + 110.4) / (t_kelvin + 110.4);
        Self {
            temperature: t_kelvin,
            density,
            viscosity,
            ..Self::default()
        }
    }

    /// Adiabatic bulk modulus γP0.
    pub fn bulk_modulus(&self) -> f64 {
        self.gamma * self.pressure
    }

    /// Adiabatic sound speed.
    pub fn sound_speed(&self) -> f64 {
        (self.bulk_modulus() / self.density).sqrt()
    }

    /// Characteristic impedance ρ0·c0.
    pub fn impedance(&self) -> f64 {
        self.density * self.sound_speed()
    }

    /// Kinematic viscosity.
    pub fn kinematic_viscosity(&self) -> f64 {
        self.viscosity / self.density
    }

    /// Thermal diffusivity ν' = ν/Pr.
    pub fn thermal_diffusivity(&self) -> f64 {
        self.kinematic_viscosity() / self.prandtl
    }
}
