#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ceiling::max_ceiling;
use crate::gas::{Breathing, DiveMode, GasMix, InspiredPressures};
use crate::ox_tox::OxTox;
use crate::pressure::depth_to_pressure;
use crate::tissue::{Tissue, calculate_tissue, calculate_tissue_travel};
use crate::zh16c::COMPARTMENTS;
use crate::{DecoError, DiveParameters};

/// How the depth changes over an [`DecoState::advance`] step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DepthPath {
    /// Already at this depth (moved there instantly), stay for the whole step.
    Level(f32),
    /// Constant speed from the current depth to this one over the whole step.
    Travel(f32),
}

/// Everything the planner knows about the diver at one instant.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecoState {
    pub tissues: [Tissue; COMPARTMENTS],
    pub ox_tox: OxTox,
    /// Deepest point of the simulation, in bar.
    pub max_ambient_pressure: f32,
    /// Current depth in metres.
    pub depth: f32,
    /// Elapsed simulation time in seconds.
    pub time: u32,
    /// Depth where the gradient factor is `gf_low`, the first stop once an ascent is planned.
    pub gf_low_depth: Option<f32>,
}

fn check_depth(depth: f32) -> Result<(), DecoError> {
    if depth.is_finite() && depth >= 0.0 {
        Ok(())
    } else {
        Err(DecoError::DegenerateSegment)
    }
}

impl DecoState {
    /// Saturated on air at the surface.
    pub fn surface(params: &DiveParameters) -> Self {
        let inspired = Breathing::open_circuit(GasMix::air()).inspired(params.surface_pressure);
        DecoState {
            tissues: [Tissue::equilibrated(inspired); COMPARTMENTS],
            ox_tox: OxTox::default(),
            max_ambient_pressure: params.surface_pressure,
            depth: 0.0,
            time: 0,
            gf_low_depth: None,
        }
    }

    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    pub fn ambient_pressure(&self, params: &DiveParameters) -> f32 {
        depth_to_pressure(params, self.depth)
    }

    /// Current ceiling in metres, see [`max_ceiling`].
    pub fn ceiling(&self, params: &DiveParameters) -> f32 {
        max_ceiling(params, self).0
    }

    /// Integrate `duration` seconds of breathing along `path`.
    ///
    /// Inputs are checked before anything is touched: on error the state is unchanged.
    pub fn advance(
        &mut self,
        params: &DiveParameters,
        breathing: &Breathing,
        path: DepthPath,
        duration: u32,
    ) -> Result<(), DecoError> {
        let (start, end) = match path {
            DepthPath::Level(depth) => (depth, depth),
            DepthPath::Travel(depth) => (self.depth, depth),
        };
        check_depth(start)?;
        check_depth(end)?;
        if breathing.mode == DiveMode::ClosedCircuit
            && !(breathing.setpoint.is_finite() && breathing.setpoint >= 0.0)
        {
            return Err(DecoError::DegenerateSegment);
        }

        self.integrate(params, breathing, start, end, duration);
        Ok(())
    }

    fn integrate(
        &mut self,
        params: &DiveParameters,
        breathing: &Breathing,
        start: f32,
        end: f32,
        duration: u32,
    ) {
        let p_start = depth_to_pressure(params, start);
        let p_end = depth_to_pressure(params, end);
        self.max_ambient_pressure = self.max_ambient_pressure.max(p_start).max(p_end);
        self.depth = end;
        if duration == 0 {
            return;
        }

        let minutes = duration as f32 / 60.0;
        let inspired = breathing.inspired(p_start);
        if start == end {
            for (i, tissue) in self.tissues.iter_mut().enumerate() {
                *tissue = calculate_tissue(*tissue, i, inspired, minutes);
            }
        } else {
            let inspired_end = breathing.inspired(p_end);
            let rate = InspiredPressures {
                n2: (inspired_end.n2 - inspired.n2) / minutes,
                he: (inspired_end.he - inspired.he) / minutes,
            };
            for (i, tissue) in self.tissues.iter_mut().enumerate() {
                *tissue = calculate_tissue_travel(*tissue, i, inspired, rate, minutes);
            }
        }

        let po2 = (breathing.po2(p_start) + breathing.po2(p_end)) / 2.0;
        self.ox_tox.accumulate(po2, minutes);
        self.time = self.time.saturating_add(duration);
        trace!(
            "t={}s depth={} leading loads {} {}",
            self.time,
            end,
            self.tissues[0].load_n2,
            self.tissues[COMPARTMENTS - 1].load_n2
        );
    }

    /// Off-gas at the surface on air between two dives. Clears the gradient factor anchor.
    pub fn surface_interval(&mut self, params: &DiveParameters, duration: u32) {
        let air = Breathing::open_circuit(GasMix::air());
        self.integrate(params, &air, 0.0, 0.0, duration);
        self.ox_tox.surface_decay(duration as f32 / 60.0);
        self.gf_low_depth = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_state_is_saturated_on_air() {
        let params = DiveParameters::default();
        let state = DecoState::surface(&params);
        let expected = (params.surface_pressure - crate::WATER_VAPOR_PRESSURE) * 0.79;
        assert!(state.tissues.iter().all(|t| libm::fabsf(t.load_n2 - expected) < 1e-6));
        assert_eq!(state.ceiling(&params), 0.0);
    }

    #[test]
    fn rejected_step_leaves_state_alone() {
        let params = DiveParameters::default();
        let air = Breathing::open_circuit(GasMix::air());
        let mut state = DecoState::surface(&params);
        state.advance(&params, &air, DepthPath::Level(20.0), 600).unwrap();
        let before = state.clone();

        assert_eq!(
            state.advance(&params, &air, DepthPath::Travel(-3.0), 60),
            Err(DecoError::DegenerateSegment)
        );
        assert_eq!(
            state.advance(&params, &air, DepthPath::Level(f32::NAN), 60),
            Err(DecoError::DegenerateSegment)
        );
        let broken_loop = Breathing::closed_circuit(GasMix::air(), f32::INFINITY);
        assert_eq!(
            state.advance(&params, &broken_loop, DepthPath::Level(20.0), 60),
            Err(DecoError::DegenerateSegment)
        );
        assert_eq!(state, before);
    }

    #[test]
    fn surface_interval_off_gasses() {
        let params = DiveParameters::default();
        let air = Breathing::open_circuit(GasMix::air());
        let mut state = DecoState::surface(&params);
        state.advance(&params, &air, DepthPath::Level(30.0), 1200).unwrap();
        let loaded = state.tissues[0].load_n2;
        state.surface_interval(&params, 3600);
        assert!(state.tissues[0].load_n2 < loaded);
        assert_eq!(state.depth, 0.0);
        assert_eq!(state.time, 4800);
    }
}
