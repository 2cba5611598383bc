#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::gas::{Breathing, DiveMode, GasMix};
use crate::{DecoError, DiveParameters};

pub const MAX_SEGMENTS: usize = 256;
pub const MAX_CYLINDERS: usize = 8;

// depth changes below this between two samples count as level
const LEVEL_TOLERANCE: f32 = 0.05;

/// Whether the segments are a plan to be executed or a logged dive being replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlanMode {
    #[default]
    Planner,
    /// Ceiling breaches along the profile are counted instead of being impossible by
    /// construction.
    Replay,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlanSegment {
    /// Seconds.
    pub duration: u32,
    /// Depth at the end of the segment, metres.
    pub depth: f32,
    pub cylinder: usize,
    /// ppO2 setpoint in bar, closed circuit only.
    pub setpoint: f32,
    /// `true`: the depth is reached by travelling from the previous depth during the segment.
    /// `false`: the diver is already there for the whole segment.
    pub entered: bool,
    pub dive_mode: DiveMode,
}

impl PlanSegment {
    pub const fn new(
        duration: u32,
        depth: f32,
        cylinder: usize,
        setpoint: f32,
        entered: bool,
        dive_mode: DiveMode,
    ) -> Self {
        PlanSegment {
            duration,
            depth,
            cylinder,
            setpoint,
            entered,
            dive_mode,
        }
    }

    pub const fn open_circuit(duration: u32, depth: f32, cylinder: usize, entered: bool) -> Self {
        PlanSegment::new(duration, depth, cylinder, 0.0, entered, DiveMode::OpenCircuit)
    }

    pub const fn closed_circuit(
        duration: u32,
        depth: f32,
        cylinder: usize,
        setpoint: f32,
        entered: bool,
    ) -> Self {
        PlanSegment::new(duration, depth, cylinder, setpoint, entered, DiveMode::ClosedCircuit)
    }

    fn validate(&self, cylinders: usize) -> Result<(), DecoError> {
        if !self.depth.is_finite() || self.depth < 0.0 {
            return Err(DecoError::DegenerateSegment);
        }
        if self.dive_mode == DiveMode::ClosedCircuit
            && !(self.setpoint.is_finite() && self.setpoint >= 0.0)
        {
            return Err(DecoError::DegenerateSegment);
        }
        if self.cylinder >= cylinders {
            return Err(DecoError::UnknownCylinder);
        }
        Ok(())
    }
}

const EMPTY_SEGMENT: PlanSegment = PlanSegment::open_circuit(0, 0.0, 0, false);

/// One logged dive computer sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sample {
    /// Seconds since the start of the dive.
    pub time: u32,
    pub depth: f32,
    pub cylinder: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Direction {
    Descending,
    Level,
    Ascending,
}

impl Direction {
    fn between(from: f32, to: f32) -> Self {
        let delta = to - from;
        if delta > LEVEL_TOLERANCE {
            Direction::Descending
        } else if delta < -LEVEL_TOLERANCE {
            Direction::Ascending
        } else {
            Direction::Level
        }
    }
}

/// Ordered segments and the cylinders they breathe from.
#[derive(Debug, Clone, PartialEq)]
pub struct DivePlan {
    segments: [PlanSegment; MAX_SEGMENTS],
    len: usize,
    cylinders: [GasMix; MAX_CYLINDERS],
    cylinder_count: usize,
}

impl Default for DivePlan {
    fn default() -> Self {
        DivePlan::new()
    }
}

impl DivePlan {
    pub const fn new() -> Self {
        DivePlan {
            segments: [EMPTY_SEGMENT; MAX_SEGMENTS],
            len: 0,
            cylinders: [GasMix::air(); MAX_CYLINDERS],
            cylinder_count: 0,
        }
    }

    /// Adds a cylinder and returns its index.
    pub fn add_cylinder(&mut self, mix: GasMix) -> Result<usize, DecoError> {
        if self.cylinder_count == MAX_CYLINDERS {
            return Err(DecoError::TooManyCylinders);
        }
        self.cylinders[self.cylinder_count] = mix;
        self.cylinder_count += 1;
        Ok(self.cylinder_count - 1)
    }

    pub fn add_segment(&mut self, segment: PlanSegment) -> Result<(), DecoError> {
        segment.validate(self.cylinder_count)?;
        if self.len == MAX_SEGMENTS {
            return Err(DecoError::PlanFull);
        }
        self.segments[self.len] = segment;
        self.len += 1;
        Ok(())
    }

    /// Open circuit descent or ascent to `depth` at the configured speeds, then `bottom_time`
    /// seconds there.
    pub fn add_level(
        &mut self,
        params: &DiveParameters,
        depth: f32,
        bottom_time: u32,
        cylinder: usize,
    ) -> Result<(), DecoError> {
        let from = self.end_depth();
        let speed = if depth > from {
            params.descent_speed
        } else {
            params.ascent_speed
        };
        let travel = libm::ceilf(libm::fabsf(depth - from) / speed * 60.0) as u32;
        self.add_segment(PlanSegment::open_circuit(travel, depth, cylinder, true))?;
        self.add_segment(PlanSegment::open_circuit(bottom_time, depth, cylinder, false))
    }

    pub fn segments(&self) -> &[PlanSegment] {
        &self.segments[..self.len]
    }

    pub fn cylinders(&self) -> &[GasMix] {
        &self.cylinders[..self.cylinder_count]
    }

    pub fn cylinder(&self, index: usize) -> Result<GasMix, DecoError> {
        self.cylinders()
            .get(index)
            .copied()
            .ok_or(DecoError::UnknownCylinder)
    }

    pub fn breathing(&self, segment: &PlanSegment) -> Result<Breathing, DecoError> {
        let mix = self.cylinder(segment.cylinder)?;
        Ok(Breathing {
            mix,
            mode: segment.dive_mode,
            setpoint: segment.setpoint,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn end_depth(&self) -> f32 {
        self.segments().last().map_or(0.0, |segment| segment.depth)
    }

    pub fn max_depth(&self) -> f32 {
        self.segments()
            .iter()
            .fold(0.0, |deepest, segment| segment.depth.max(deepest))
    }

    pub fn validate(&self) -> Result<(), DecoError> {
        for segment in self.segments() {
            segment.validate(self.cylinder_count)?;
        }
        Ok(())
    }

    /// Collapses logged samples into segments: consecutive intervals with the same cylinder
    /// and the same direction (descending, level, ascending) become one travel segment.
    pub fn from_samples(samples: &[Sample], cylinders: &[GasMix]) -> Result<Self, DecoError> {
        let mut plan = DivePlan::new();
        for mix in cylinders {
            plan.add_cylinder(*mix)?;
        }
        if samples
            .iter()
            .any(|sample| !sample.depth.is_finite() || sample.depth < 0.0)
        {
            return Err(DecoError::DegenerateSegment);
        }
        let Some(first) = samples.first() else {
            return Ok(plan);
        };
        if first.depth > 0.0 {
            // the log starts underwater, place the diver there without loading
            plan.add_segment(PlanSegment::open_circuit(0, first.depth, first.cylinder, false))?;
        }

        // (direction, cylinder, accumulated duration, end depth)
        let mut leg: Option<(Direction, usize, u32, f32)> = None;
        for pair in samples.windows(2) {
            let (previous, current) = (pair[0], pair[1]);
            if current.time < previous.time {
                return Err(DecoError::DegenerateSegment);
            }
            let duration = current.time - previous.time;
            let direction = Direction::between(previous.depth, current.depth);
            // the gas of an interval is the one breathed at its start
            let cylinder = previous.cylinder;

            leg = match leg {
                Some((leg_direction, leg_cylinder, leg_duration, _))
                    if leg_direction == direction && leg_cylinder == cylinder =>
                {
                    Some((direction, cylinder, leg_duration + duration, current.depth))
                }
                Some((_, leg_cylinder, leg_duration, leg_depth)) => {
                    plan.add_segment(PlanSegment::open_circuit(
                        leg_duration,
                        leg_depth,
                        leg_cylinder,
                        true,
                    ))?;
                    Some((direction, cylinder, duration, current.depth))
                }
                None => Some((direction, cylinder, duration, current.depth)),
            };
        }
        if let Some((_, cylinder, duration, depth)) = leg {
            plan.add_segment(PlanSegment::open_circuit(duration, depth, cylinder, true))?;
        }
        debug!(
            "resampled {} samples into {} segments",
            samples.len(),
            plan.len()
        );
        Ok(plan)
    }
}
