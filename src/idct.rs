//! Inverse DCT and dequantization, decode side. SPEC_FULL.md §4.9. The
//! teacher's `idct.rs` offers both a float AA&N butterfly and an integer
//! stb_image-style fast path; this core keeps the float formulation (direct
//! separable sum rather than the butterfly, for clarity) and adds the
//! range-limit table the teacher folds into its color-convert fast path.

/// Output range-limit table size and center, per SPEC_FULL.md §4.9: output
/// samples are produced in an expanded range and clamped back to `0..=255`
/// through a lookup table wide enough to absorb IDCT ringing overshoot.
const RANGE_LIMIT_LEN: usize = 5 * 256;
const RANGE_LIMIT_CENTER: i32 = 2 * 256;

/// Dequantize 64 coefficients (natural order) against their quantizer step,
/// undoing [`crate::dct::quantize_block`]'s division alone -- `idct_1d`
/// expects standard (normalized) JPEG DCT-III input, with no AA&N rescaling.
#[must_use]
pub fn dequantize_block(coeffs: &[i16; 64], quant_table: &[u16; 64]) -> [f32; 64] {
    let mut out = [0.0f32; 64];
    for i in 0..64 {
        out[i] = f32::from(coeffs[i]) * f32::from(quant_table[i]);
    }
    out
}

/// Separable 8x8 float IDCT-III (inverse of [`crate::dct::forward_dct_block`]),
/// in place over natural (row-major) order.
pub fn idct_float(block: &mut [f32; 64]) {
    for col in 0..8 {
        let mut v = [0.0f32; 8];
        for r in 0..8 {
            v[r] = block[r * 8 + col];
        }
        idct_1d(&mut v);
        for r in 0..8 {
            block[r * 8 + col] = v[r];
        }
    }
    for row in 0..8 {
        let start = row * 8;
        let mut v = [0.0f32; 8];
        v.copy_from_slice(&block[start..start + 8]);
        idct_1d(&mut v);
        block[start..start + 8].copy_from_slice(&v);
    }
}

fn idct_1d(v: &mut [f32]) {
    let s = [v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7]];
    let mut out = [0.0f32; 8];
    for (n, o) in out.iter_mut().enumerate() {
        let mut sum = s[0] * core::f32::consts::FRAC_1_SQRT_2;
        for (k, &coeff) in s.iter().enumerate().skip(1) {
            let angle = core::f32::consts::PI / 8.0 * (n as f32 + 0.5) * k as f32;
            sum += coeff * angle.cos();
        }
        *o = sum * 0.5;
    }
    v.copy_from_slice(&out);
}

/// Level-shift and clamp a de-transformed sample back into `0..=255`,
/// matching the teacher's `level_shift` plus a range-limit table lookup
/// wide enough to absorb ringing overshoot without branching per sample.
#[must_use]
pub fn level_shift_out(value: f32) -> u8 {
    let centered = value.round() as i32 + 128;
    range_limit_table()[(centered + RANGE_LIMIT_CENTER).clamp(0, RANGE_LIMIT_LEN as i32 - 1) as usize]
}

fn range_limit_table() -> &'static [u8; RANGE_LIMIT_LEN] {
    static TABLE: std::sync::OnceLock<[u8; RANGE_LIMIT_LEN]> = std::sync::OnceLock::new();
    TABLE.get_or_init(|| {
        let mut t = [0u8; RANGE_LIMIT_LEN];
        for (i, slot) in t.iter_mut().enumerate() {
            let signed = i as i32 - RANGE_LIMIT_CENTER;
            *slot = signed.clamp(0, 255) as u8;
        }
        t
    })
}
