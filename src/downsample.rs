//! Per-component chroma (or full-resolution) downsampling, SPEC_FULL.md
//! §4.3. Grounded in the teacher's function-pointer dispatch over
//! up/downsampling methods (design note in SPEC_FULL.md §9: replaced with
//! one enum matched per MCU row instead of an indirect call).
use crate::error::JpegError;

/// Which box filter a component uses to go from full input resolution to
/// its own downsampled grid.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Downsampler {
    /// 1:1, no sampling: straight copy.
    FullSize,
    /// 2:1 horizontal.
    H2V1Box,
    /// 2:1 horizontal, 2:1 vertical.
    H2V2Box,
    /// Arbitrary integral ratio `h_max/h_samp` by `v_max/v_samp`.
    IntegralBox { h_ratio: usize, v_ratio: usize },
}

impl Downsampler {
    #[must_use]
    pub fn select(h_samp: u8, v_samp: u8, h_max: u8, v_max: u8) -> Result<Downsampler, JpegError> {
        if h_max % h_samp != 0 || v_max % v_samp != 0 {
            return Err(JpegError::Unsupported(
                crate::error::UnsupportedFeature::FractionalSampling,
            ));
        }
        let h_ratio = usize::from(h_max / h_samp);
        let v_ratio = usize::from(v_max / v_samp);
        Ok(match (h_ratio, v_ratio) {
            (1, 1) => Downsampler::FullSize,
            (2, 1) => Downsampler::H2V1Box,
            (2, 2) => Downsampler::H2V2Box,
            (h, v) => Downsampler::IntegralBox { h_ratio: h, v_ratio: v },
        })
    }

    /// Downsample `in_rows` (exactly `v_ratio` full-resolution rows, each
    /// `in_width` samples, right-edge-padded by the caller to a multiple of
    /// `h_ratio`) into a single `out_width`-sample output row.
    pub fn apply(self, in_rows: &[&[u8]], in_width: usize, out: &mut [u8], out_width: usize) {
        match self {
            Downsampler::FullSize => {
                out[..out_width].copy_from_slice(&in_rows[0][..out_width]);
            }
            Downsampler::H2V1Box => {
                let row = in_rows[0];
                for x in 0..out_width {
                    let a = u16::from(sample_at(row, 2 * x, in_width));
                    let b = u16::from(sample_at(row, 2 * x + 1, in_width));
                    out[x] = ((a + b + 1) / 2) as u8;
                }
            }
            Downsampler::H2V2Box => {
                let (row0, row1) = (in_rows[0], in_rows.get(1).copied().unwrap_or(in_rows[0]));
                for x in 0..out_width {
                    let sum = u16::from(sample_at(row0, 2 * x, in_width))
                        + u16::from(sample_at(row0, 2 * x + 1, in_width))
                        + u16::from(sample_at(row1, 2 * x, in_width))
                        + u16::from(sample_at(row1, 2 * x + 1, in_width));
                    out[x] = ((sum + 2) / 4) as u8;
                }
            }
            Downsampler::IntegralBox { h_ratio, v_ratio } => {
                let area = (h_ratio * v_ratio) as u32;
                for x in 0..out_width {
                    let mut sum: u32 = 0;
                    for (ri, &row) in in_rows.iter().enumerate().take(v_ratio) {
                        for dx in 0..h_ratio {
                            sum += u32::from(sample_at(row, x * h_ratio + dx, in_width));
                        }
                        let _ = ri;
                    }
                    // Ordered-dither bias alternates 0/1 at exact 0.5 boundaries
                    // (SPEC_FULL.md §4.3), which only matters when `area` is even.
                    let bias = if area % 2 == 0 { (x % 2) as u32 } else { area / 2 };
                    out[x] = ((sum + bias) / area) as u8;
                }
            }
        }
    }
}

/// Read a sample, duplicating the rightmost column when `x` runs past
/// `valid_width` (right-edge padding, SPEC_FULL.md §4.3).
fn sample_at(row: &[u8], x: usize, valid_width: usize) -> u8 {
    let clamped = x.min(valid_width.saturating_sub(1));
    row[clamped]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn h2v2_averages_four_samples() {
        let row0 = [10u8, 20, 30, 40];
        let row1 = [10u8, 20, 30, 40];
        let mut out = [0u8; 2];
        Downsampler::H2V2Box.apply(&[&row0, &row1], 4, &mut out, 2);
        assert_eq!(out, [15, 35]);
    }

    #[test]
    fn right_edge_padding_duplicates_last_sample() {
        let row0 = [10u8, 200];
        let mut out = [0u8; 2];
        // valid_width = 1: only the first sample is real, rest is padding.
        Downsampler::H2V1Box.apply(&[&row0], 1, &mut out, 1);
        assert_eq!(out[0], 10);
    }

    #[test]
    fn select_rejects_fractional_ratios() {
        assert!(Downsampler::select(3, 1, 4, 1).is_err());
    }
}
