#![allow(clippy::needless_return, clippy::similar_names, clippy::inline_always)]
#![warn(clippy::correctness, clippy::perf, clippy::pedantic)]
//! A baseline sequential JPEG (ISO/IEC 10918-1) encoder/decoder that does all
//! of its scratch allocation inside a caller-supplied byte buffer. See
//! `DESIGN.md` for how each module is grounded and why.
#[macro_use]
extern crate log;

pub use crate::color::ColorSpace;
pub use crate::decoder::{decompress, read_headers, DecoderOptions};
pub use crate::encoder::{compress, compress_with_restarts, estimate_output_capacity, EncoderOptions, Subsampling};
pub use crate::error::{JpegError, JpegResult, UnsupportedFeature};
pub use crate::image::{DecodedImage, ImageInfo};

pub mod arena;
mod bitreader;
mod bitwriter;
pub mod color;
mod component;
mod dct;
mod decoder;
mod downsample;
mod encoder;
mod entropy;
pub mod error;
mod huffman;
mod idct;
pub mod image;
mod marker;
mod marker_read;
mod marker_write;
mod mcu;
pub mod tables;
mod upsample;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn grayscale_round_trip_via_public_api() {
        let width = 32;
        let height = 24;
        let input: Vec<u8> = (0..width * height).map(|i| (i % 256) as u8).collect();

        let mut arena = vec![0u8; arena::Arena::size_hint(1, width) + 8192];
        let mut compressed = vec![0u8; estimate_output_capacity(width, height, 1)];
        let options = EncoderOptions { quality: 85, restart_interval: 0, subsampling: Subsampling::Yuv444 };
        let n = compress(&input, width, height, ColorSpace::Grayscale, ColorSpace::Grayscale, &options, &mut arena, &mut compressed).unwrap();

        let mut decode_arena = vec![0u8; arena::Arena::size_hint(1, width) + 8192];
        let mut decoded = vec![0u8; width * height];
        let decode_options = DecoderOptions { output_color: ColorSpace::Grayscale, ..DecoderOptions::default() };
        let image = decompress(&compressed[..n], &mut decode_arena, &decode_options, &mut decoded).unwrap();
        assert_eq!(usize::from(image.info.width), width);
        assert_eq!(usize::from(image.info.height), height);
    }

    #[test]
    fn read_headers_matches_compress_dimensions() {
        let width = 12;
        let height = 9;
        let input = vec![200u8; width * height * 3];
        let mut arena = vec![0u8; arena::Arena::size_hint(3, width) + 8192];
        let mut compressed = vec![0u8; estimate_output_capacity(width, height, 3)];
        let options = EncoderOptions::default();
        let n = compress(&input, width, height, ColorSpace::Rgb, ColorSpace::YCbCr, &options, &mut arena, &mut compressed).unwrap();

        let info = read_headers(&compressed[..n]).unwrap();
        assert_eq!(usize::from(info.width), width);
        assert_eq!(usize::from(info.height), height);
        assert_eq!(info.num_components, 3);
    }
}
