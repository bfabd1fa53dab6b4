//! Public result/description types for the decode path. SPEC_FULL.md §4.10.
//! Grounded in the teacher's `ZuneJpeg`/`decoder.rs` output contract: a
//! struct describing the image plus a flat interleaved sample buffer the
//! caller owns.
use crate::color::ColorSpace;

/// Dimensions and color space of a JPEG bitstream, available after parsing
/// headers alone (no entropy decode needed).
#[derive(Clone, Copy, Debug)]
pub struct ImageInfo {
    pub width: u16,
    pub height: u16,
    pub color_space: ColorSpace,
    pub num_components: usize,
    pub restart_interval: u16,
}

/// A fully decoded image: interleaved samples in `output_color`, one row
/// after another, no padding between rows.
pub struct DecodedImage<'a> {
    pub info: ImageInfo,
    pub samples: &'a [u8],
}

impl<'a> DecodedImage<'a> {
    #[must_use]
    pub fn row(&self, y: usize) -> &[u8] {
        let stride = usize::from(self.info.width) * self.info.color_space_components();
        &self.samples[y * stride..(y + 1) * stride]
    }
}

impl ImageInfo {
    #[must_use]
    pub fn color_space_components(&self) -> usize {
        self.color_space.num_components()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_slices_at_the_right_stride() {
        let info = ImageInfo { width: 2, height: 2, color_space: ColorSpace::Rgb, num_components: 3, restart_interval: 0 };
        let samples = [0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];
        let image = DecodedImage { info, samples: &samples };
        assert_eq!(image.row(1), &[6, 7, 8, 9, 10, 11]);
    }
}
