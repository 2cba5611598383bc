use libm::powf;

use crate::{DiveParameters, SEA_LEVEL_PRESSURE};

pub const GRAVITY: f32 = 9.80665;

/// Hydrostatic pressure gradient for the configured water density.
pub fn bar_per_meter(params: &DiveParameters) -> f32 {
    params.water_density * GRAVITY / 100_000.0
}

pub fn depth_to_pressure(params: &DiveParameters, depth: f32) -> f32 {
    params.surface_pressure + depth * bar_per_meter(params)
}

/// Depth at which the ambient pressure is `pressure`. Negative above the surface.
pub fn pressure_to_depth(params: &DiveParameters, pressure: f32) -> f32 {
    (pressure - params.surface_pressure) / bar_per_meter(params)
}

// International barometric formula, troposphere only.
pub fn altitude_to_pressure(altitude: f32) -> f32 {
    SEA_LEVEL_PRESSURE * powf(1.0 - 2.25577e-5 * altitude, 5.25588)
}
