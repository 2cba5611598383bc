//! Oxygen toxicity: CNS clock (NOAA exposure limits) and pulmonary OTUs.
use libm::{exp2f, powf};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const CNS_HALF_LIFE: f32 = 90.0; // minutes, at the surface

struct CnsCoefficient {
    po2_low: f32,
    po2_high: f32,
    slope: f32,
    intercept: f32,
}

// linearised NOAA single exposure limits, limit [min] = slope * ppO2 + intercept
const CNS_COEFFICIENTS: [CnsCoefficient; 7] = [
    CnsCoefficient { po2_low: 0.5, po2_high: 0.6, slope: -1800.0, intercept: 1800.0 },
    CnsCoefficient { po2_low: 0.6, po2_high: 0.7, slope: -1500.0, intercept: 1620.0 },
    CnsCoefficient { po2_low: 0.7, po2_high: 0.8, slope: -1200.0, intercept: 1410.0 },
    CnsCoefficient { po2_low: 0.8, po2_high: 0.9, slope: -900.0, intercept: 1170.0 },
    CnsCoefficient { po2_low: 0.9, po2_high: 1.1, slope: -600.0, intercept: 900.0 },
    CnsCoefficient { po2_low: 1.1, po2_high: 1.5, slope: -300.0, intercept: 570.0 },
    CnsCoefficient { po2_low: 1.5, po2_high: 1.65, slope: -750.0, intercept: 1245.0 },
];

fn cns_limit(po2: f32) -> Option<f32> {
    if po2 <= CNS_COEFFICIENTS[0].po2_low {
        return None;
    }
    let row = CNS_COEFFICIENTS
        .iter()
        .find(|row| po2 > row.po2_low && po2 <= row.po2_high)
        .unwrap_or(&CNS_COEFFICIENTS[CNS_COEFFICIENTS.len() - 1]);
    // past the table the last line drops to zero; one minute is already 100 %
    Some((row.slope * po2 + row.intercept).max(1.0))
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OxTox {
    /// Percent of the CNS limit.
    pub cns: f32,
    pub otu: f32,
}

impl OxTox {
    pub fn accumulate(&mut self, po2: f32, minutes: f32) {
        if minutes <= 0.0 {
            return;
        }
        if let Some(limit) = cns_limit(po2) {
            self.cns += minutes / limit * 100.0;
        }
        if po2 > 0.5 {
            self.otu += minutes * powf((po2 - 0.5) / 0.5, 5.0 / 6.0);
        }
    }

    pub fn surface_decay(&mut self, minutes: f32) {
        self.cns /= exp2f(minutes / CNS_HALF_LIFE);
    }
}
