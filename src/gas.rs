#[cfg(feature = "serde")]
use serde::Serialize;

use crate::pressure::pressure_to_depth;
use crate::{DecoError, DiveParameters, WATER_VAPOR_PRESSURE};

/// Tolerance on the sum of the fractions of a mix.
pub const FRACTION_TOLERANCE: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gas {
    O2,
    N2,
    He,
}

/// Breathing gas composition. Nitrogen is whatever oxygen and helium leave over.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GasMix {
    o2: f32,
    he: f32,
}

impl GasMix {
    pub fn new(o2: f32, he: f32) -> Result<Self, DecoError> {
        let fraction = |f: f32| f.is_finite() && (0.0..=1.0).contains(&f);
        if !fraction(o2) || !fraction(he) || o2 + he > 1.0 + FRACTION_TOLERANCE {
            return Err(DecoError::InvalidGasMix);
        }
        Ok(GasMix { o2, he })
    }

    /// Mix from all three fractions, which have to add up to one.
    pub fn from_fractions(o2: f32, n2: f32, he: f32) -> Result<Self, DecoError> {
        if !n2.is_finite() || !(0.0..=1.0).contains(&n2) {
            return Err(DecoError::InvalidGasMix);
        }
        let sum = o2 + n2 + he;
        if sum < 1.0 - FRACTION_TOLERANCE || sum > 1.0 + FRACTION_TOLERANCE {
            return Err(DecoError::InvalidGasMix);
        }
        GasMix::new(o2, he)
    }

    pub const fn air() -> Self {
        GasMix { o2: 0.21, he: 0.0 }
    }

    pub const fn oxygen() -> Self {
        GasMix { o2: 1.0, he: 0.0 }
    }

    pub fn nitrox(o2: f32) -> Result<Self, DecoError> {
        GasMix::new(o2, 0.0)
    }

    pub fn trimix(o2: f32, he: f32) -> Result<Self, DecoError> {
        GasMix::new(o2, he)
    }

    pub fn o2(&self) -> f32 {
        self.o2
    }

    pub fn he(&self) -> f32 {
        self.he
    }

    pub fn n2(&self) -> f32 {
        (1.0 - self.o2 - self.he).max(0.0)
    }

    pub fn fraction(&self, gas: Gas) -> f32 {
        match gas {
            Gas::O2 => self.o2,
            Gas::N2 => self.n2(),
            Gas::He => self.he,
        }
    }

    pub fn partial_pressure(&self, ambient_pressure: f32, gas: Gas) -> f32 {
        ambient_pressure * self.fraction(gas)
    }

    /// Maximum operating depth for a ppO2 limit.
    pub fn mod_depth(&self, params: &DiveParameters, max_po2: f32) -> f32 {
        if self.o2 <= 0.0 {
            return f32::INFINITY;
        }
        pressure_to_depth(params, max_po2 / self.o2).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiveMode {
    #[default]
    OpenCircuit,
    /// Rebreather holding a constant ppO2 setpoint over the diluent.
    ClosedCircuit,
}

/// Inert gas pressures in the alveoli, in bar.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InspiredPressures {
    pub n2: f32,
    pub he: f32,
}

/// What the diver is breathing: a mix and how it is delivered.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Breathing {
    pub mix: GasMix,
    pub mode: DiveMode,
    /// ppO2 in bar, closed circuit only.
    pub setpoint: f32,
}

impl Breathing {
    pub const fn open_circuit(mix: GasMix) -> Self {
        Breathing {
            mix,
            mode: DiveMode::OpenCircuit,
            setpoint: 0.0,
        }
    }

    pub const fn closed_circuit(diluent: GasMix, setpoint: f32) -> Self {
        Breathing {
            mix: diluent,
            mode: DiveMode::ClosedCircuit,
            setpoint,
        }
    }

    pub fn inspired(&self, ambient_pressure: f32) -> InspiredPressures {
        let alveolar = (ambient_pressure - WATER_VAPOR_PRESSURE).max(0.0);
        match self.mode {
            DiveMode::OpenCircuit => InspiredPressures {
                n2: alveolar * self.mix.n2(),
                he: alveolar * self.mix.he(),
            },
            DiveMode::ClosedCircuit => {
                // the loop holds the setpoint, the diluent ratio decides the inert split
                let inert = alveolar - self.setpoint.min(alveolar);
                let inert_fraction = self.mix.n2() + self.mix.he();
                if inert_fraction <= 0.0 {
                    return InspiredPressures::default();
                }
                InspiredPressures {
                    n2: inert * self.mix.n2() / inert_fraction,
                    he: inert * self.mix.he() / inert_fraction,
                }
            }
        }
    }

    pub fn po2(&self, ambient_pressure: f32) -> f32 {
        match self.mode {
            DiveMode::OpenCircuit => self.mix.partial_pressure(ambient_pressure, Gas::O2),
            DiveMode::ClosedCircuit => self.setpoint.min(ambient_pressure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libm::fabsf;

    #[test]
    fn rejects_impossible_mixes() {
        assert_eq!(GasMix::new(0.8, 0.3), Err(DecoError::InvalidGasMix));
        assert_eq!(GasMix::new(-0.1, 0.0), Err(DecoError::InvalidGasMix));
        assert_eq!(GasMix::new(f32::NAN, 0.0), Err(DecoError::InvalidGasMix));
        assert_eq!(GasMix::from_fractions(0.21, 0.70, 0.0), Err(DecoError::InvalidGasMix));
        assert!(GasMix::from_fractions(0.18, 0.37, 0.45).is_ok());
    }

    #[test]
    fn nitrogen_is_the_remainder() {
        let mix = GasMix::trimix(0.21, 0.35).unwrap();
        assert!(fabsf(mix.n2() - 0.44) < 1e-6);
        assert!(fabsf(mix.partial_pressure(4.0, Gas::He) - 1.4) < 1e-6);
    }

    #[test]
    fn closed_circuit_keeps_setpoint() {
        let diluent = GasMix::trimix(0.21, 0.35).unwrap();
        let loop_gas = Breathing::closed_circuit(diluent, 1.3);
        let inspired = loop_gas.inspired(5.0);
        let alveolar = 5.0 - WATER_VAPOR_PRESSURE;
        assert!(fabsf(inspired.n2 + inspired.he - (alveolar - 1.3)) < 1e-5);
        assert!(fabsf(loop_gas.po2(5.0) - 1.3) < 1e-6);
        // shallower than the setpoint can be held the loop is pure oxygen
        assert_eq!(loop_gas.po2(1.0), 1.0);
        assert_eq!(loop_gas.inspired(1.0).n2, 0.0);
    }

    #[test]
    fn mod_for_ean50() {
        let params = DiveParameters::default();
        let ean50 = GasMix::nitrox(0.5).unwrap();
        let depth = ean50.mod_depth(&params, 1.6);
        assert!(depth > 21.0 && depth < 22.0);
    }
}
