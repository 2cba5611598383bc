//! Bühlmann ZH-L16C decompression engine with gradient factors.
//!
//! Replays a [`plan::DivePlan`] against a [`state::DecoState`] and generates the
//! decompression stops required to reach the surface ([`deco::plan`]). States can be
//! parked in a [`cache::DecoCache`] and resumed for repetitive or incremental planning.
//!
//! The crate is `no_std`; the `std` feature (on by default) only affects logging.
#![no_std]

#[cfg(feature = "std")]
extern crate std;

#[macro_use]
mod fmt;

pub mod cache;
pub mod ceiling;
pub mod deco;
pub mod gas;
pub mod m_value;
pub mod ndl;
pub mod ox_tox;
pub mod plan;
pub mod pressure;
pub mod simulate;
pub mod state;
pub mod tissue;
pub mod zh16c;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use cache::{CacheHandle, DecoCache};
pub use deco::{Decostop, PlanOutcome, Start, StopTable, plan, plan_bounded};
pub use gas::{Breathing, DiveMode, Gas, GasMix};
pub use plan::{DivePlan, PlanMode, PlanSegment, Sample};
pub use state::{DecoState, DepthPath};

/// Alveolar water vapour pressure at 37 °C, in bar (47 mmHg).
pub const WATER_VAPOR_PRESSURE: f32 = 0.0627;

/// Sea level standard atmosphere, in bar.
pub const SEA_LEVEL_PRESSURE: f32 = 1.01325;

/// Salt water, EN 13319 uses 1020 but most tables assume 1030.
pub const SALT_WATER_DENSITY: f32 = 1030.0;

pub const FRESH_WATER_DENSITY: f32 = 1000.0;

#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiveParameters {
    pub descent_speed: f32,     // m/min
    pub ascent_speed: f32,      // m/min, bottom to first stop
    pub deco_ascent_speed: f32, // m/min, between stops
    pub gf_low: f32,            // 0 < x <= 1
    pub gf_high: f32,           // 0 < x <= 1
    pub surface_pressure: f32,  // bar
    pub water_density: f32,     // kg/m3
    pub stop_step: f32,         // m
    pub last_stop_depth: f32,   // m
    pub timestep: u32,          // s
    pub deco_po2_max: f32,      // bar
    pub gas_switching: bool,
    pub max_stop_time: u32, // s
    pub mode: PlanMode,
}

impl DiveParameters {
    pub fn new(gf_high: f32, gf_low: f32) -> Self {
        DiveParameters {
            gf_low,
            gf_high,
            ..Default::default()
        }
    }

    pub fn with_gradient_factors(mut self, gf_low: f32, gf_high: f32) -> Self {
        self.gf_low = gf_low;
        self.gf_high = gf_high;
        self
    }

    pub fn with_surface_pressure(mut self, surface_pressure: f32) -> Self {
        self.surface_pressure = surface_pressure;
        self
    }

    /// Surface pressure from altitude above sea level in metres.
    pub fn with_altitude(mut self, altitude: f32) -> Self {
        self.surface_pressure = pressure::altitude_to_pressure(altitude);
        self
    }

    pub fn with_water_density(mut self, water_density: f32) -> Self {
        self.water_density = water_density;
        self
    }

    pub fn with_timestep(mut self, timestep: u32) -> Self {
        self.timestep = timestep;
        self
    }

    pub fn with_last_stop_depth(mut self, last_stop_depth: f32) -> Self {
        self.last_stop_depth = last_stop_depth;
        self
    }

    pub fn with_gas_switching(mut self, gas_switching: bool) -> Self {
        self.gas_switching = gas_switching;
        self
    }

    pub fn with_mode(mut self, mode: PlanMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn validate(&self) -> Result<(), DecoError> {
        use ParameterField::*;

        let positive = |value: f32| value.is_finite() && value > 0.0;

        if !(positive(self.gf_low) && positive(self.gf_high))
            || self.gf_high > 1.0
            || self.gf_low > self.gf_high
        {
            return Err(DecoError::InvalidParameters(GradientFactors));
        }
        if !(0.5..=1.5).contains(&self.surface_pressure) {
            return Err(DecoError::InvalidParameters(SurfacePressure));
        }
        if !(FRESH_WATER_DENSITY..=1050.0).contains(&self.water_density) {
            return Err(DecoError::InvalidParameters(WaterDensity));
        }
        if !positive(self.ascent_speed) || !positive(self.deco_ascent_speed) {
            return Err(DecoError::InvalidParameters(AscentSpeed));
        }
        if !positive(self.descent_speed) {
            return Err(DecoError::InvalidParameters(DescentSpeed));
        }
        if !positive(self.stop_step) {
            return Err(DecoError::InvalidParameters(StopStep));
        }
        if !positive(self.last_stop_depth) {
            return Err(DecoError::InvalidParameters(LastStopDepth));
        }
        if self.timestep == 0 || self.max_stop_time < self.timestep {
            return Err(DecoError::InvalidParameters(Timestep));
        }
        if !positive(self.deco_po2_max) {
            return Err(DecoError::InvalidParameters(DecoPo2));
        }
        Ok(())
    }
}

impl Default for DiveParameters {
    fn default() -> Self {
        DiveParameters {
            descent_speed: 18.0,
            ascent_speed: 9.0,
            deco_ascent_speed: 6.0,
            gf_low: 0.3,
            gf_high: 0.75,
            surface_pressure: SEA_LEVEL_PRESSURE,
            water_density: SALT_WATER_DENSITY,
            stop_step: 3.0,
            last_stop_depth: 3.0,
            timestep: 60,
            deco_po2_max: 1.6,
            gas_switching: true,
            max_stop_time: 24 * 60 * 60,
            mode: PlanMode::Planner,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParameterField {
    GradientFactors,
    SurfacePressure,
    WaterDensity,
    AscentSpeed,
    DescentSpeed,
    StopStep,
    LastStopDepth,
    Timestep,
    DecoPo2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoError {
    /// Fractions out of range or not summing to one.
    InvalidGasMix,
    /// More stops than the table can hold.
    StopTableOverflow,
    /// Unknown or expired cache handle.
    InvalidCacheHandle,
    /// Negative or non-finite depth, setpoint or time.
    DegenerateSegment,
    UnknownCylinder,
    PlanFull,
    TooManyCylinders,
    /// A single stop would last longer than `max_stop_time`.
    InvalidSolution,
    InvalidParameters(ParameterField),
}

impl core::fmt::Display for DecoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DecoError::InvalidGasMix => f.write_str("gas fractions must be within 0..1 and sum to 1"),
            DecoError::StopTableOverflow => f.write_str("decompression needs more stops than the table holds"),
            DecoError::InvalidCacheHandle => f.write_str("cache handle is unknown or expired"),
            DecoError::DegenerateSegment => f.write_str("segment has a negative or non-finite depth, setpoint or time"),
            DecoError::UnknownCylinder => f.write_str("segment references a cylinder that does not exist"),
            DecoError::PlanFull => f.write_str("dive plan has no room for more segments"),
            DecoError::TooManyCylinders => f.write_str("dive plan has no room for more cylinders"),
            DecoError::InvalidSolution => f.write_str("decompression stop exceeds the maximum stop time"),
            DecoError::InvalidParameters(field) => write!(f, "invalid dive parameter: {:?}", field),
        }
    }
}

impl core::error::Error for DecoError {}
