use libm::ceilf;

use crate::DiveParameters;
use crate::m_value::tolerated_ambient_pressure;
use crate::pressure::pressure_to_depth;
use crate::state::DecoState;
use crate::tissue::Tissue;

/// Gradient factor at `depth`: `gf_low` at or below the anchor (the first stop), `gf_high`
/// at the surface, linear in between. Without an anchor `gf_low` applies.
pub fn gradient_factor_at(params: &DiveParameters, anchor: Option<f32>, depth: f32) -> f32 {
    match anchor {
        Some(anchor) if anchor > 0.0 && depth < anchor => {
            let depth = depth.max(0.0);
            params.gf_high + (params.gf_low - params.gf_high) * depth / anchor
        }
        _ => params.gf_low,
    }
}

/// Lowest ambient pressure one compartment tolerates, in bar.
pub fn tissue_ceiling(tissue: &Tissue, tissue_index: usize, gf: f32) -> f32 {
    tolerated_ambient_pressure(tissue, tissue_index, gf)
}

/// Shallowest depth one compartment tolerates, in metres. 0 when it tolerates the surface.
#[inline(never)]
pub fn ceiling(params: &DiveParameters, tissue: Tissue, tissue_index: usize, gf: f32) -> f32 {
    let result_bar = tissue_ceiling(&tissue, tissue_index, gf);
    pressure_to_depth(params, result_bar).max(0.0)
}

/// Deepest ceiling over all compartments and the index of the compartment setting it.
/// Ties go to the faster compartment.
pub fn max_ceiling_with_gf(params: &DiveParameters, state: &DecoState, gf: f32) -> (f32, usize) {
    let mut max_ceiling = 0.0;
    let mut tissue_index = 0;
    for (i, tissue) in state.tissues.iter().enumerate() {
        let tentative_max_ceiling = ceiling(params, *tissue, i, gf);
        if tentative_max_ceiling > max_ceiling {
            max_ceiling = tentative_max_ceiling;
            tissue_index = i;
        }
    }
    (max_ceiling, tissue_index)
}

/// Ceiling with the gradient factor of the state's current depth.
pub fn max_ceiling(params: &DiveParameters, state: &DecoState) -> (f32, usize) {
    let gf = gradient_factor_at(params, state.gf_low_depth, state.depth);
    max_ceiling_with_gf(params, state, gf)
}

/// Rounds a ceiling to the stop grid, always deeper.
pub fn round_up_to_stop(depth: f32, step: f32) -> f32 {
    if depth <= 0.0 {
        return 0.0;
    }
    ceilf(depth / step) * step
}

#[test]
fn rounding_test() {
    assert_eq!(round_up_to_stop(14.2412, 3.0), 15.0);
    assert_eq!(round_up_to_stop(11.12, 3.0), 12.0);
    assert_eq!(round_up_to_stop(6.0, 3.0), 6.0);
    assert_eq!(round_up_to_stop(0.0, 3.0), 0.0);
}

#[test]
fn gradient_factor_slope() {
    let params = DiveParameters::new(0.8, 0.3);
    assert_eq!(gradient_factor_at(&params, None, 0.0), 0.3);
    assert_eq!(gradient_factor_at(&params, Some(12.0), 15.0), 0.3);
    assert_eq!(gradient_factor_at(&params, Some(12.0), 0.0), 0.8);
    assert!(libm::fabsf(gradient_factor_at(&params, Some(12.0), 6.0) - 0.55) < 1e-6);
}
