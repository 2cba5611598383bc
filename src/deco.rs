//! Decompression stop generation.
//!
//! The generator replays the plan, anchors the gradient factor slope at the first stop and
//! then climbs the stop grid one step at a time. Before every step it asks whether the ceiling,
//! evaluated with the gradient factor of the next depth, lets the diver go there. If it does
//! not, the diver waits at the current depth in `timestep` increments and the wait becomes a
//! [`Decostop`]. Ascents and waits are both integrated, so off-gassing on the way up counts.
use libm::{ceilf, floorf};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cache::{CacheHandle, DecoCache};
use crate::ceiling::{gradient_factor_at, max_ceiling_with_gf, round_up_to_stop};
use crate::gas::{Breathing, DiveMode, Gas};
use crate::plan::DivePlan;
use crate::pressure::depth_to_pressure;
use crate::simulate::replay;
use crate::state::{DecoState, DepthPath};
use crate::{DecoError, DiveParameters};

pub const MAX_DECO_STOPS: usize = 60;

// float slack when comparing depths that sit on the stop grid
const GRID_EPSILON: f32 = 1e-3;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Decostop {
    /// Metres.
    pub depth: f32,
    /// Seconds.
    pub duration: u32,
}

impl Decostop {
    pub const SURFACE: Decostop = Decostop {
        depth: 0.0,
        duration: 0,
    };

    pub fn is_surface(&self) -> bool {
        self.depth <= 0.0
    }
}

/// Stops deepest first, ending with the surface. Holds at most `N` entries and refuses
/// more instead of dropping any.
#[derive(Debug, Clone)]
pub struct StopTable<const N: usize = MAX_DECO_STOPS> {
    stops: [Decostop; N],
    len: usize,
}

impl<const N: usize> StopTable<N> {
    pub const fn new() -> Self {
        StopTable {
            stops: [Decostop::SURFACE; N],
            len: 0,
        }
    }

    pub fn push(&mut self, stop: Decostop) -> Result<(), DecoError> {
        if self.len == N {
            warn!("stop table full at {} entries, cannot add {} m", N, stop.depth);
            return Err(DecoError::StopTableOverflow);
        }
        self.stops[self.len] = stop;
        self.len += 1;
        Ok(())
    }

    pub fn as_slice(&self) -> &[Decostop] {
        &self.stops[..self.len]
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Decostop> {
        self.as_slice().iter()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Nothing but (at most) the surface entry.
    pub fn is_no_stop(&self) -> bool {
        self.iter().all(Decostop::is_surface)
    }

    pub fn deepest(&self) -> Option<&Decostop> {
        self.iter().find(|stop| !stop.is_surface())
    }

    /// Seconds spent at stops, ascents excluded.
    pub fn total_stop_time(&self) -> u32 {
        self.iter().map(|stop| stop.duration).sum()
    }
}

impl<const N: usize> Default for StopTable<N> {
    fn default() -> Self {
        StopTable::new()
    }
}

impl<const N: usize> PartialEq for StopTable<N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<'a, const N: usize> IntoIterator for &'a StopTable<N> {
    type Item = &'a Decostop;
    type IntoIter = core::slice::Iter<'a, Decostop>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(feature = "serde")]
impl<const N: usize> Serialize for StopTable<N> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Initial tissue state of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Start {
    /// Saturated on air at the surface.
    Fresh,
    /// A state stored earlier, e.g. the end of a previous dive.
    Resume(CacheHandle),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome<const N: usize = MAX_DECO_STOPS> {
    pub stops: StopTable<N>,
    /// After the last plan segment, before any ascent. Resuming from it skips the replay.
    pub bottom_state: DecoState,
    /// At the surface after the last stop.
    pub final_state: DecoState,
    /// Total simulated time in seconds, previous dives included when resumed.
    pub runtime: u32,
    /// See [`crate::simulate::ReplaySummary::breaches`].
    pub breaches: u32,
    /// Worst ceiling violation along the plan in metres, replay mode only.
    pub worst_breach: f32,
}

impl<const N: usize> PlanOutcome<N> {
    /// Seconds from the bottom state to the surface.
    pub fn ascent_time(&self) -> u32 {
        self.final_state.time - self.bottom_state.time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    DescendOrLevel,
    AscendStep,
    AtCeilingWait,
    Surfaced,
}

/// Next depth up: the next multiple of `stop_step`, never shallower than the last stop
/// except for the surface itself.
fn next_stop_depth(params: &DiveParameters, depth: f32) -> f32 {
    if depth <= params.last_stop_depth + GRID_EPSILON {
        return 0.0;
    }
    let below = floorf(depth / params.stop_step) * params.stop_step;
    let next = if below >= depth - GRID_EPSILON {
        below - params.stop_step
    } else {
        below
    };
    next.max(params.last_stop_depth)
}

// whole seconds, rounded up
fn travel_time(distance: f32, speed: f32) -> u32 {
    (ceilf(distance / speed * 60.0) as u32).max(1)
}

struct StopGenerator<'a, const N: usize> {
    params: &'a DiveParameters,
    plan: &'a DivePlan,
    state: DecoState,
    bottom_state: Option<DecoState>,
    breathing: Breathing,
    cylinder: Option<usize>,
    stops: StopTable<N>,
    breaches: u32,
    worst_breach: f32,
}

impl<'a, const N: usize> StopGenerator<'a, N> {
    fn new(params: &'a DiveParameters, plan: &'a DivePlan, state: DecoState) -> Self {
        StopGenerator {
            params,
            plan,
            state,
            bottom_state: None,
            breathing: Breathing::open_circuit(crate::gas::GasMix::air()),
            cylinder: None,
            stops: StopTable::new(),
            breaches: 0,
            worst_breach: 0.0,
        }
    }

    fn run(mut self) -> Result<PlanOutcome<N>, DecoError> {
        let mut phase = Phase::DescendOrLevel;
        loop {
            phase = match phase {
                Phase::DescendOrLevel => self.descend_or_level()?,
                Phase::AscendStep => self.ascend_step()?,
                Phase::AtCeilingWait => self.wait_at_ceiling()?,
                Phase::Surfaced => break,
            };
        }
        self.stops.push(Decostop::SURFACE)?;
        info!(
            "surfaced after {} s with {} stops, {} s of deco",
            self.state.time,
            self.stops.len() - 1,
            self.stops.total_stop_time()
        );

        let bottom_state = self.bottom_state.unwrap_or_else(|| self.state.clone());
        Ok(PlanOutcome {
            stops: self.stops,
            bottom_state,
            runtime: self.state.time,
            final_state: self.state,
            breaches: self.breaches,
            worst_breach: self.worst_breach,
        })
    }

    fn descend_or_level(&mut self) -> Result<Phase, DecoError> {
        let summary = replay(self.params, &mut self.state, self.plan)?;
        self.breathing = summary.breathing;
        self.cylinder = summary.cylinder;
        self.breaches = summary.breaches;
        self.worst_breach = summary.worst_breach;
        self.bottom_state = Some(self.state.clone());

        let (ceiling, tissue_index) = max_ceiling_with_gf(self.params, &self.state, self.params.gf_low);
        if ceiling > 0.0 {
            let anchor = round_up_to_stop(ceiling, self.params.stop_step).max(self.params.last_stop_depth);
            self.state.gf_low_depth = Some(anchor);
            debug!(
                "ceiling {} m at {} m, first stop {} m, leading compartment {}",
                ceiling,
                self.state.depth,
                anchor,
                tissue_index + 1
            );
            if ceiling > self.state.depth {
                // the plan left the diver above the ceiling, the first stop is below
                warn!(
                    "plan ends at {} m above the {} m ceiling, descending to {} m",
                    self.state.depth,
                    ceiling,
                    anchor
                );
                let duration = travel_time(anchor - self.state.depth, self.params.descent_speed);
                self.state
                    .advance(self.params, &self.breathing, DepthPath::Travel(anchor), duration)?;
            }
        } else {
            debug!("no stop required from {} m", self.state.depth);
        }
        self.switch_gas();
        Ok(Phase::AscendStep)
    }

    fn ascent_allowed(&self, next: f32) -> bool {
        let gf = gradient_factor_at(self.params, self.state.gf_low_depth, next);
        max_ceiling_with_gf(self.params, &self.state, gf).0 <= next
    }

    fn ascend_step(&mut self) -> Result<Phase, DecoError> {
        if self.state.depth <= 0.0 {
            return Ok(Phase::Surfaced);
        }
        let next = next_stop_depth(self.params, self.state.depth);
        if !self.ascent_allowed(next) {
            return Ok(Phase::AtCeilingWait);
        }

        let speed = match self.state.gf_low_depth {
            Some(anchor) if self.state.depth <= anchor + GRID_EPSILON => self.params.deco_ascent_speed,
            _ => self.params.ascent_speed,
        };
        let duration = travel_time(self.state.depth - next, speed);
        self.state
            .advance(self.params, &self.breathing, DepthPath::Travel(next), duration)?;
        if next > 0.0 {
            self.switch_gas();
        }
        Ok(Phase::AscendStep)
    }

    fn wait_at_ceiling(&mut self) -> Result<Phase, DecoError> {
        let depth = self.state.depth;
        let next = next_stop_depth(self.params, depth);
        let mut wait = 0;
        loop {
            if wait >= self.params.max_stop_time {
                warn!("stop at {} m still running after {} s", depth, wait);
                return Err(DecoError::InvalidSolution);
            }
            self.state
                .advance(self.params, &self.breathing, DepthPath::Level(depth), self.params.timestep)?;
            wait += self.params.timestep;
            if self.ascent_allowed(next) {
                break;
            }
        }
        info!("deco stop at {} m for {} s", depth, wait);
        self.stops.push(Decostop {
            depth,
            duration: wait,
        })?;
        Ok(Phase::AscendStep)
    }

    /// Richest open circuit cylinder breathable at the current depth. Ties keep the lower index.
    fn switch_gas(&mut self) {
        if !self.params.gas_switching || self.breathing.mode != DiveMode::OpenCircuit {
            return;
        }
        let ambient = depth_to_pressure(self.params, self.state.depth);
        let mut best = None;
        let mut richest = self.breathing.mix.o2();
        for (i, mix) in self.plan.cylinders().iter().enumerate() {
            if mix.partial_pressure(ambient, Gas::O2) <= self.params.deco_po2_max && mix.o2() > richest {
                richest = mix.o2();
                best = Some((i, *mix));
            }
        }
        if let Some((cylinder, mix)) = best {
            info!(
                "switching to cylinder {} at {} m, O2 {}",
                cylinder,
                self.state.depth,
                mix.o2()
            );
            self.breathing = Breathing::open_circuit(mix);
            self.cylinder = Some(cylinder);
        }
    }
}

/// Replays `dive_plan` from `start` and computes the stops to the surface.
pub fn plan<const SLOTS: usize>(
    params: &DiveParameters,
    dive_plan: &DivePlan,
    start: Start,
    cache: &DecoCache<SLOTS>,
) -> Result<PlanOutcome, DecoError> {
    plan_bounded(params, dive_plan, start, cache)
}

/// [`plan`] with a stop table of capacity `N`.
pub fn plan_bounded<const N: usize, const SLOTS: usize>(
    params: &DiveParameters,
    dive_plan: &DivePlan,
    start: Start,
    cache: &DecoCache<SLOTS>,
) -> Result<PlanOutcome<N>, DecoError> {
    params.validate()?;
    dive_plan.validate()?;
    let state = match start {
        Start::Fresh => DecoState::surface(params),
        Start::Resume(handle) => cache.resume(handle)?,
    };
    debug!(
        "planning {} segments from t={} s, GF {}/{}",
        dive_plan.len(),
        state.time,
        params.gf_low,
        params.gf_high
    );
    StopGenerator::<N>::new(params, dive_plan, state).run()
}
