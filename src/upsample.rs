//! Inverse of [`crate::downsample`]: expand a decoded component plane back
//! up to full frame resolution. Grounded in the teacher's `upsampler.rs`
//! (`h2v1_fancy`/`h2v2_fancy` interpolation, `int_upsample` general case).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Upsampler {
    FullSize,
    /// Two-tap horizontal interpolation, 3:1 bias toward the nearer sample.
    H2V1Fancy,
    /// Three-tap interpolation in both directions.
    H2V2Fancy,
    IntegralBox { h_ratio: usize, v_ratio: usize },
}

impl Upsampler {
    #[must_use]
    pub fn select(h_ratio: usize, v_ratio: usize) -> Upsampler {
        match (h_ratio, v_ratio) {
            (1, 1) => Upsampler::FullSize,
            (2, 1) => Upsampler::H2V1Fancy,
            (2, 2) => Upsampler::H2V2Fancy,
            (h, v) => Upsampler::IntegralBox { h_ratio: h, v_ratio: v },
        }
    }

    /// Expand one row of `in_width` downsampled samples into `out`
    /// (`in_width * h_ratio` samples), doing triangle-filter interpolation
    /// for the fancy fast paths and nearest-neighbor replication for the
    /// general integral case.
    pub fn apply_horizontal(self, input: &[u8], in_width: usize, out: &mut [u8]) {
        match self {
            Upsampler::FullSize => out[..in_width].copy_from_slice(&input[..in_width]),
            Upsampler::H2V1Fancy => fancy_h2(input, in_width, out),
            Upsampler::H2V2Fancy => fancy_h2(input, in_width, out),
            Upsampler::IntegralBox { h_ratio, .. } => {
                for x in 0..in_width {
                    let v = input[x];
                    for k in 0..h_ratio {
                        out[x * h_ratio + k] = v;
                    }
                }
            }
        }
    }

    /// Number of output rows produced per input row.
    #[must_use]
    pub fn v_ratio(self) -> usize {
        match self {
            Upsampler::FullSize | Upsampler::H2V1Fancy => 1,
            Upsampler::H2V2Fancy => 2,
            Upsampler::IntegralBox { v_ratio, .. } => v_ratio,
        }
    }
}

/// 3/4-1/4 triangle-filter horizontal expansion, matching libjpeg's
/// `h2v1_fancy_upsample`: each output pair is biased toward its nearer
/// input sample using neighbor averaging.
fn fancy_h2(input: &[u8], in_width: usize, out: &mut [u8]) {
    if in_width == 0 {
        return;
    }
    for x in 0..in_width {
        let prev = if x == 0 { input[0] } else { input[x - 1] };
        let next = if x + 1 == in_width { input[x] } else { input[x + 1] };
        let cur = input[x];
        let left = ((3 * i32::from(cur) + i32::from(prev) + 2) / 4) as u8;
        let right = ((3 * i32::from(cur) + i32::from(next) + 1) / 4) as u8;
        out[2 * x] = left;
        out[2 * x + 1] = right;
    }
}

/// Blend two vertically adjacent full-resolution rows (produced by
/// horizontal upsampling of the row above/below) with a 3:1 bias toward the
/// nearer source row, for `H2V2Fancy`'s vertical pass.
pub fn blend_rows_3_1(near: &[u8], far: &[u8], out: &mut [u8]) {
    for ((n, f), o) in near.iter().zip(far.iter()).zip(out.iter_mut()) {
        *o = ((3 * u16::from(*n) + u16::from(*f) + 2) / 4) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fullsize_is_identity() {
        let input = [1u8, 2, 3];
        let mut out = [0u8; 3];
        Upsampler::FullSize.apply_horizontal(&input, 3, &mut out);
        assert_eq!(out, input);
    }

    #[test]
    fn integral_box_replicates_samples() {
        let input = [9u8, 20];
        let mut out = [0u8; 6];
        Upsampler::IntegralBox { h_ratio: 3, v_ratio: 1 }.apply_horizontal(&input, 2, &mut out);
        assert_eq!(out, [9, 9, 9, 20, 20, 20]);
    }

    #[test]
    fn fancy_h2_stays_within_neighbor_bounds() {
        let input = [0u8, 100, 200];
        let mut out = [0u8; 6];
        Upsampler::H2V1Fancy.apply_horizontal(&input, 3, &mut out);
        for (i, &v) in out.iter().enumerate() {
            let src = i / 2;
            let lo = input[src.saturating_sub(1)].min(input[src]);
            let hi = input[(src + 1).min(2)].max(input[src]);
            assert!(v >= lo && v <= hi, "out[{i}]={v} not within [{lo},{hi}]");
        }
    }
}
