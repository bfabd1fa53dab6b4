//! Forward DCT and quantization, encode side. SPEC_FULL.md §4.4. Grounded in
//! the teacher's `idct.rs` separable transform (same basis functions, run
//! forward) and `jcdctmgr.c`'s `forward_DCT` quantization rounding rule.

/// Forward 8x8 floating point DCT-II, applied separably (rows then columns),
/// in place over natural (row-major) order. Already normalized: a flat input
/// block produces only a DC coefficient, with no further scale factor to
/// fold in at quantization time.
pub fn forward_dct_block(block: &mut [f32; 64]) {
    for row in 0..8 {
        forward_dct_1d(&mut block[row * 8..row * 8 + 8]);
    }
    let mut col = [0.0f32; 8];
    for c in 0..8 {
        for r in 0..8 {
            col[r] = block[r * 8 + c];
        }
        forward_dct_1d(&mut col);
        for r in 0..8 {
            block[r * 8 + c] = col[r];
        }
    }
}

fn forward_dct_1d(v: &mut [f32]) {
    let s = [v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7]];
    let mut out = [0.0f32; 8];
    for (k, o) in out.iter_mut().enumerate() {
        let mut sum = 0.0f32;
        for (n, &sample) in s.iter().enumerate() {
            let angle = core::f32::consts::PI / 8.0 * (n as f32 + 0.5) * k as f32;
            sum += sample * angle.cos();
        }
        let scale = if k == 0 { core::f32::consts::FRAC_1_SQRT_2 } else { 1.0 };
        *o = sum * scale * 0.5;
    }
    v.copy_from_slice(&out);
}

/// Divide each of 64 DCT coefficients by its quantizer step, rounding to
/// nearest with ties away from zero, matching `jcdctmgr.c`'s
/// `(int)(temp + 16384.5) - 16384` trick generalized to arbitrary sign.
/// `forward_dct_1d` already produces standard (normalized) JPEG DCT-II
/// coefficients, so no further AA&N scaling is applied here -- that scale
/// factor only belongs to the *unnormalized* AA&N fast DCT this crate
/// doesn't use.
#[must_use]
pub fn quantize_block(coeffs: &[f32; 64], quant_table: &[u16; 64]) -> [i16; 64] {
    let mut out = [0i16; 64];
    for i in 0..64 {
        let step = f32::from(quant_table[i]);
        let divided = coeffs[i] / step;
        let rounded = if divided >= 0.0 {
            (divided + 0.5).floor()
        } else {
            (divided - 0.5).ceil()
        };
        out[i] = rounded.clamp(-32768.0, 32767.0) as i16;
    }
    out
}

/// Level-shift 8-bit samples into the signed range the DCT expects
/// (`[-128, 127]`), per SPEC_FULL.md §4.4.
#[must_use]
pub fn level_shift_in(samples: &[u8; 64]) -> [f32; 64] {
    let mut out = [0.0f32; 64];
    for (o, &s) in out.iter_mut().zip(samples.iter()) {
        *o = f32::from(s) - 128.0;
    }
    out
}
