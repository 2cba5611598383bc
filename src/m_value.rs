use crate::tissue::Tissue;
use crate::zh16c::ZhL16cGf;

/// `a` and `b` for a compartment, weighted by the share of each inert gas in its tension.
pub fn coefficients(tissue: &Tissue, tissue_index: usize) -> (f32, f32) {
    let p_total = tissue.total();
    if p_total <= f32::EPSILON {
        return (ZhL16cGf::N2_A[tissue_index], ZhL16cGf::N2_B[tissue_index]);
    }
    let a = (ZhL16cGf::N2_A[tissue_index] * tissue.load_n2
        + ZhL16cGf::HE_A[tissue_index] * tissue.load_he)
        / p_total;
    let b = (ZhL16cGf::N2_B[tissue_index] * tissue.load_n2
        + ZhL16cGf::HE_B[tissue_index] * tissue.load_he)
        / p_total;
    (a, b)
}

/// Maximum tolerated tension at `amb_pressure`.
pub fn calculate_m_values(amb_pressure: f32, tissue: &Tissue, tissue_index: usize) -> f32 {
    let (a, b) = coefficients(tissue, tissue_index);
    amb_pressure / b + a
}

/// Lowest ambient pressure the compartment tolerates with gradient factor `gf`.
pub fn tolerated_ambient_pressure(tissue: &Tissue, tissue_index: usize, gf: f32) -> f32 {
    let (a, b) = coefficients(tissue, tissue_index);
    (b * tissue.total() - gf * a * b) / ((1.0 - b) * gf + b)
}
