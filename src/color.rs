//! Color space conversion, both directions.
//!
//! Grounded in the teacher's `misc::ColorSpace` enum and
//! `color_convert::scalar` integer approximations, generalized per
//! SPEC_FULL.md §4.2 to cover the encode-side conversions the teacher (a
//! decoder) never needed: RGB/CMYK input to YCbCr/BG-YCC/YCCK JPEG-internal
//! color spaces. Per the design note in SPEC_FULL.md §9, each conversion is
//! a sum-type variant matched once per call rather than a function pointer.
use crate::error::JpegError;

/// The color space of the caller's input samples (encode) or requested
/// output samples (decode).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ColorSpace {
    Grayscale,
    Rgb,
    YCbCr,
    Cmyk,
    Ycck,
    /// "Big Gamut" YCC, used with the Adobe APP14 transform code and chroma
    /// quantized further by a factor of 2 after DCT (SPEC_FULL.md §4.2).
    BgYcc,
}

impl ColorSpace {
    #[must_use]
    pub fn num_components(self) -> usize {
        match self {
            ColorSpace::Grayscale => 1,
            ColorSpace::Rgb | ColorSpace::YCbCr | ColorSpace::BgYcc => 3,
            ColorSpace::Cmyk | ColorSpace::Ycck => 4,
        }
    }
}

/// Which conversion the encoder applies to go from the caller's interleaved
/// input samples to planar JPEG-internal component samples.
#[derive(Clone, Copy)]
pub enum Encoder {
    /// Input already matches the JPEG color space: de-interleave only.
    Copy { components: usize },
    GrayFromRgb,
    YCbCrFromRgb,
    /// Same arithmetic as `YCbCrFromRgb`; downstream quantization doubles
    /// chroma quantizer step (SPEC_FULL.md §4.2).
    BgYccFromRgb,
    YcckFromCmyk,
}

impl Encoder {
    #[must_use]
    pub fn select(input: ColorSpace, jpeg: ColorSpace) -> Encoder {
        match (input, jpeg) {
            (ColorSpace::Rgb, ColorSpace::Grayscale) => Encoder::GrayFromRgb,
            (ColorSpace::Rgb, ColorSpace::YCbCr) => Encoder::YCbCrFromRgb,
            (ColorSpace::Rgb, ColorSpace::BgYcc) => Encoder::BgYccFromRgb,
            (ColorSpace::Cmyk, ColorSpace::Ycck) => Encoder::YcckFromCmyk,
            (a, b) if a == b => Encoder::Copy { components: a.num_components() },
            (a, _) => Encoder::Copy { components: a.num_components() },
        }
    }

    /// Convert one interleaved pixel's worth of samples (`input`, exactly
    /// `self`'s source component count) into `planes`, one output byte per
    /// destination component, written at `dst_index` in each plane.
    pub fn convert_pixel(self, input: &[u8], planes: &mut [&mut [u8]], dst_index: usize) {
        match self {
            Encoder::Copy { components } => {
                for c in 0..components {
                    planes[c][dst_index] = input[c];
                }
            }
            Encoder::GrayFromRgb => {
                let (r, g, b) = (i32::from(input[0]), i32::from(input[1]), i32::from(input[2]));
                planes[0][dst_index] = rgb_to_y(r, g, b);
            }
            Encoder::YCbCrFromRgb | Encoder::BgYccFromRgb => {
                let (r, g, b) = (i32::from(input[0]), i32::from(input[1]), i32::from(input[2]));
                planes[0][dst_index] = rgb_to_y(r, g, b);
                planes[1][dst_index] = rgb_to_cb(r, g, b);
                planes[2][dst_index] = rgb_to_cr(r, g, b);
            }
            Encoder::YcckFromCmyk => {
                let (c, m, y, k) = (input[0], input[1], input[2], input[3]);
                let (r, g, b) = (255 - i32::from(c), 255 - i32::from(m), 255 - i32::from(y));
                planes[0][dst_index] = rgb_to_y(r, g, b);
                planes[1][dst_index] = rgb_to_cb(r, g, b);
                planes[2][dst_index] = rgb_to_cr(r, g, b);
                planes[3][dst_index] = k;
            }
        }
    }
}

// ITU-R BT.601 constants scaled by 2^16, per SPEC_FULL.md §4.2.
const FIX_0_299: i32 = 19595;
const FIX_0_587: i32 = 38470;
const FIX_0_114: i32 = 7471;
const FIX_0_168736: i32 = 11059;
const FIX_0_331264: i32 = 21709;
const FIX_0_5: i32 = 32768;
const FIX_0_418688: i32 = 27439;
const FIX_0_081312: i32 = 5329;
const ONE_HALF: i32 = 1 << 15;
const CBCR_OFFSET: i32 = 128 << 16;

fn rgb_to_y(r: i32, g: i32, b: i32) -> u8 {
    let v = (FIX_0_299 * r + FIX_0_587 * g + FIX_0_114 * b + ONE_HALF) >> 16;
    v.clamp(0, 255) as u8
}

fn rgb_to_cb(r: i32, g: i32, b: i32) -> u8 {
    let v = (-FIX_0_168736 * r - FIX_0_331264 * g + FIX_0_5 * b + CBCR_OFFSET + ONE_HALF) >> 16;
    v.clamp(0, 255) as u8
}

fn rgb_to_cr(r: i32, g: i32, b: i32) -> u8 {
    let v = (FIX_0_5 * r - FIX_0_418688 * g - FIX_0_081312 * b + CBCR_OFFSET + ONE_HALF) >> 16;
    v.clamp(0, 255) as u8
}

/// Which conversion the decoder applies to go from planar JPEG-internal
/// component samples to the caller's requested output color space.
#[derive(Clone, Copy)]
pub enum Decoder {
    Copy { components: usize },
    RgbFromGray,
    RgbFromYCbCr,
    CmykFromYcck,
}

impl Decoder {
    #[must_use]
    pub fn select(jpeg: ColorSpace, requested: ColorSpace) -> Decoder {
        match (jpeg, requested) {
            (ColorSpace::Grayscale, ColorSpace::Rgb) => Decoder::RgbFromGray,
            (ColorSpace::YCbCr | ColorSpace::BgYcc, ColorSpace::Rgb) => Decoder::RgbFromYCbCr,
            (ColorSpace::Ycck, ColorSpace::Cmyk) => Decoder::CmykFromYcck,
            (a, _) => Decoder::Copy { components: a.num_components() },
        }
    }

    /// Deconvert one pixel's worth of planar samples, reading `src_index`
    /// from each input plane, writing interleaved output samples.
    pub fn convert_pixel(self, planes: &[&[u8]], src_index: usize, out: &mut [u8]) {
        match self {
            Decoder::Copy { components } => {
                for c in 0..components {
                    out[c] = planes[c][src_index];
                }
            }
            Decoder::RgbFromGray => {
                let y = planes[0][src_index];
                out[0] = y;
                out[1] = y;
                out[2] = y;
            }
            Decoder::RgbFromYCbCr => {
                let (r, g, b) = ycbcr_to_rgb(planes[0][src_index], planes[1][src_index], planes[2][src_index]);
                out[0] = r;
                out[1] = g;
                out[2] = b;
            }
            Decoder::CmykFromYcck => {
                let (r, g, b) = ycbcr_to_rgb(planes[0][src_index], planes[1][src_index], planes[2][src_index]);
                out[0] = 255 - r;
                out[1] = 255 - g;
                out[2] = 255 - b;
                out[3] = planes[3][src_index];
            }
        }
    }
}

/// Integer-approximate YCbCr->RGB, matching the teacher's scalar fast path.
fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> (u8, u8, u8) {
    let y = i16::from(y);
    let cb = i16::from(cb) - 128;
    let cr = i16::from(cr) - 128;

    let r = y + ((91881 * i32::from(cr)) >> 16);
    let g = i32::from(y) - ((22554 * i32::from(cb) + 46802 * i32::from(cr)) >> 16);
    let b = i32::from(y) + ((116130 * i32::from(cb)) >> 16);

    (clamp_i32(r), clamp_i32(g), clamp_i32(b))
}

fn clamp_i32(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Interpret an Adobe APP14 color-transform code, per SPEC_FULL.md §9: code 0
/// with 4 components means CMYK, code 2 means YCCK, anything else is a
/// tolerated quirk that assumes YCCK with a logged warning.
#[must_use]
pub fn adobe_transform_colorspace(transform_code: u8, num_components: usize) -> ColorSpace {
    if num_components == 4 {
        match transform_code {
            0 => ColorSpace::Cmyk,
            2 => ColorSpace::Ycck,
            _ => {
                log::warn!(
                    "unrecognized Adobe APP14 color transform code {transform_code}, assuming YCCK"
                );
                ColorSpace::Ycck
            }
        }
    } else if num_components == 3 {
        ColorSpace::YCbCr
    } else {
        ColorSpace::Grayscale
    }
}

pub fn validate_component_count(space: ColorSpace, n: usize) -> Result<(), JpegError> {
    if space.num_components() != n {
        return Err(JpegError::StructuralCorruption(
            "component count does not match the declared color space",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_round_trips_exactly() {
        assert_eq!(rgb_to_y(128, 128, 128), 128);
    }

    #[test]
    fn ycbcr_neutral_gray_round_trips() {
        let (r, g, b) = ycbcr_to_rgb(128, 128, 128);
        assert_eq!((r, g, b), (128, 128, 128));
    }

    #[test]
    fn rgb_to_ycbcr_to_rgb_is_close() {
        let (r, g, b) = (200u8, 50u8, 90u8);
        let y = rgb_to_y(i32::from(r), i32::from(g), i32::from(b));
        let cb = rgb_to_cb(i32::from(r), i32::from(g), i32::from(b));
        let cr = rgb_to_cr(i32::from(r), i32::from(g), i32::from(b));
        let (r2, g2, b2) = ycbcr_to_rgb(y, cb, cr);
        assert!((i32::from(r) - i32::from(r2)).abs() <= 2);
        assert!((i32::from(g) - i32::from(g2)).abs() <= 2);
        assert!((i32::from(b) - i32::from(b2)).abs() <= 2);
    }
}
