use crate::ceiling::max_ceiling_with_gf;
use crate::gas::Breathing;
use crate::state::{DecoState, DepthPath};
use crate::{DecoError, DiveParameters};

/// Upper bound reported for the no-decompression limit, in minutes.
pub const NDL_CAP: u32 = 999;

// a direct ascent is planned with gf_high, no stops means no anchor
fn in_deco(params: &DiveParameters, state: &DecoState) -> bool {
    max_ceiling_with_gf(params, state, params.gf_high).0 > 0.0
}

fn stay(
    params: &DiveParameters,
    state: &mut DecoState,
    breathing: &Breathing,
    depth: f32,
    minutes: u32,
) -> Result<(), DecoError> {
    for _ in 0..minutes {
        state.advance(params, breathing, DepthPath::Level(depth), 60)?;
    }
    Ok(())
}

/// Whole minutes that can still be spent at `depth` before a direct ascent needs a stop.
pub fn ndl(
    params: &DiveParameters,
    state: &DecoState,
    breathing: &Breathing,
    depth: f32,
) -> Result<u32, DecoError> {
    let mut tissues = state.clone();
    tissues.advance(params, breathing, DepthPath::Level(depth), 0)?;
    let mut bottom_time = 0;
    while bottom_time < NDL_CAP {
        if in_deco(params, &tissues) {
            return Ok(bottom_time);
        }
        stay(params, &mut tissues, breathing, depth, 1)?;
        bottom_time += 1;
    }
    Ok(NDL_CAP)
}

/// Same result as [`ndl`], found by bisection over the bottom time.
pub fn binary_ndl(
    params: &DiveParameters,
    state: &DecoState,
    breathing: &Breathing,
    depth: f32,
) -> Result<u32, DecoError> {
    let mut low_state = state.clone();
    low_state.advance(params, breathing, DepthPath::Level(depth), 0)?;
    if in_deco(params, &low_state) {
        return Ok(0);
    }

    // invariant: no deco after `low` minutes, deco after `high` minutes
    let mut low = 0;
    let mut high = NDL_CAP;
    let mut probe = low_state.clone();
    stay(params, &mut probe, breathing, depth, high)?;
    if !in_deco(params, &probe) {
        return Ok(NDL_CAP);
    }

    while high - low > 1 {
        let mid = low + (high - low) / 2;
        // replaying minute by minute from the last clear state keeps the arithmetic identical
        // to the linear search
        let mut probe = low_state.clone();
        stay(params, &mut probe, breathing, depth, mid - low)?;
        if in_deco(params, &probe) {
            high = mid;
        } else {
            low = mid;
            low_state = probe;
        }
    }
    Ok(high)
}
