use core::f32::consts::LN_2;

use libm::{exp2f, expf};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::gas::InspiredPressures;
use crate::zh16c::ZhL16cGf;

/// Inert gas tension of one compartment, in bar.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tissue {
    pub load_n2: f32,
    pub load_he: f32,
}

impl Tissue {
    pub fn equilibrated(inspired: InspiredPressures) -> Self {
        Tissue {
            load_n2: inspired.n2,
            load_he: inspired.he,
        }
    }

    pub fn total(&self) -> f32 {
        self.load_n2 + self.load_he
    }
}

// p(t) = p0 + (pi - p0) * (1 - 2^(-t/T))
fn haldane(load: f32, inspired: f32, minutes: f32, half_life: f32) -> f32 {
    load + (inspired - load) * (1.0 - 1.0 / exp2f(minutes / half_life))
}

// pt(t) = palv0 + R(t - 1/k) - [palv0 - pt0 - R/k] * e^(-kt)
// pt0 -> tissue tension at t=0
// palv0 -> inspired partial pressure at t=0
// k -> ln2 / half life
// R -> rate of change of the inspired partial pressure (bar/min)
fn schreiner(load: f32, inspired: f32, rate: f32, minutes: f32, half_life: f32) -> f32 {
    let k = LN_2 / half_life;
    inspired + rate * (minutes - 1.0 / k) - (inspired - load - rate / k) * expf(-k * minutes)
}

/// Constant inspired pressure for `minutes`. Zero minutes returns the tissue untouched.
pub fn calculate_tissue(
    mut tissue: Tissue,
    tissue_index: usize,
    inspired: InspiredPressures,
    minutes: f32,
) -> Tissue {
    if minutes == 0.0 {
        return tissue;
    }
    tissue.load_n2 = haldane(
        tissue.load_n2,
        inspired.n2,
        minutes,
        ZhL16cGf::N2_HALF_LIFE[tissue_index],
    );
    tissue.load_he = haldane(
        tissue.load_he,
        inspired.he,
        minutes,
        ZhL16cGf::HE_HALF_LIFE[tissue_index],
    );
    tissue
}

/// Inspired pressure changing linearly from `start` at `rate` bar/min, as during an
/// ascent or descent at constant speed.
pub fn calculate_tissue_travel(
    mut tissue: Tissue,
    tissue_index: usize,
    start: InspiredPressures,
    rate: InspiredPressures,
    minutes: f32,
) -> Tissue {
    if minutes == 0.0 {
        return tissue;
    }
    tissue.load_n2 = schreiner(
        tissue.load_n2,
        start.n2,
        rate.n2,
        minutes,
        ZhL16cGf::N2_HALF_LIFE[tissue_index],
    );
    tissue.load_he = schreiner(
        tissue.load_he,
        start.he,
        rate.he,
        minutes,
        ZhL16cGf::HE_HALF_LIFE[tissue_index],
    );
    tissue
}

#[test]
fn test_calculate_tissues() {
    let inspired = InspiredPressures { n2: 3.9, he: 0.0 };
    let tissue = Tissue {
        load_n2: 0.75,
        load_he: 0.0,
    };
    // one half life closes half the gap
    let result = calculate_tissue(tissue, 0, inspired, 5.0);
    assert!(libm::fabsf(result.load_n2 - 2.325) < 1e-5);
}

#[test]
fn test_schreiner_without_rate_matches_haldane() {
    let inspired = InspiredPressures { n2: 2.4, he: 0.6 };
    let tissue = Tissue {
        load_n2: 0.75,
        load_he: 0.0,
    };
    let constant = calculate_tissue(tissue, 4, inspired, 7.0);
    let travel = calculate_tissue_travel(tissue, 4, inspired, InspiredPressures::default(), 7.0);
    assert!(libm::fabsf(constant.load_n2 - travel.load_n2) < 1e-5);
    assert!(libm::fabsf(constant.load_he - travel.load_he) < 1e-5);
}
