use crate::ceiling::max_ceiling;
use crate::gas::{Breathing, GasMix};
use crate::plan::{DivePlan, PlanMode};
use crate::state::{DecoState, DepthPath};
use crate::{DecoError, DiveParameters};

/// Where a replay left the diver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplaySummary {
    /// Gas of the last segment, cylinder 0 (or air) for an empty plan.
    pub breathing: Breathing,
    pub cylinder: Option<usize>,
    /// Segments that ended above the ceiling, counted in [`PlanMode::Replay`] only.
    pub breaches: u32,
    /// Worst ceiling violation in metres.
    pub worst_breach: f32,
}

/// Runs every segment of `plan` in order against `state`.
///
/// The whole plan is validated first, so an invalid segment never leaves `state` half
/// replayed.
pub fn replay(
    params: &DiveParameters,
    state: &mut DecoState,
    plan: &DivePlan,
) -> Result<ReplaySummary, DecoError> {
    plan.validate()?;

    let (breathing, cylinder) = match plan.cylinders().first() {
        Some(mix) => (Breathing::open_circuit(*mix), Some(0)),
        None => (Breathing::open_circuit(GasMix::air()), None),
    };
    let mut summary = ReplaySummary {
        breathing,
        cylinder,
        breaches: 0,
        worst_breach: 0.0,
    };
    // a new descent invalidates the first stop of an earlier ascent
    state.gf_low_depth = None;

    for segment in plan.segments() {
        let breathing = plan.breathing(segment)?;
        let path = if segment.entered {
            DepthPath::Travel(segment.depth)
        } else {
            DepthPath::Level(segment.depth)
        };
        state.advance(params, &breathing, path, segment.duration)?;
        summary.breathing = breathing;
        summary.cylinder = Some(segment.cylinder);

        if params.mode == PlanMode::Replay {
            let (ceiling, tissue_index) = max_ceiling(params, state);
            if ceiling > state.depth {
                summary.breaches += 1;
                summary.worst_breach = summary.worst_breach.max(ceiling - state.depth);
                warn!(
                    "ceiling {} m above diver at {} m after {} s, compartment {}",
                    ceiling,
                    state.depth,
                    state.time,
                    tissue_index + 1
                );
            }
        }
    }
    Ok(summary)
}
