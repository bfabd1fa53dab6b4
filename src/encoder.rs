//! Top-level compressor. SPEC_FULL.md §4.5/§4.6/§6. Grounded in the overall
//! shape of the teacher's `Decoder` (one struct owning geometry, tables, and
//! per-component state) mirrored for the write direction, plus `jcparam.c`'s
//! default-quality table setup. Per the design note in SPEC_FULL.md §9, this
//! replaces the teacher's `scoped_threadpool` row-worker pool with a single
//! cooperative loop over iMCU rows -- there is never more than one iMCU
//! row's worth of sample data live at a time.
use crate::arena::Arena;
use crate::bitwriter::BitWriter;
use crate::color::{self, ColorSpace};
use crate::component::{ceil_div, ComponentInfo, FrameGeometry};
use crate::dct::{forward_dct_block, level_shift_in, quantize_block};
use crate::downsample::Downsampler;
use crate::entropy::encode_block;
use crate::error::JpegError;
use crate::huffman::EncoderTable;
use crate::marker_write::MarkerWriter;
use crate::mcu::{extract_block, imcu_row_range, is_restart_boundary, restart_marker_index, RowBuffers};
use crate::tables::{QuantTable, STD_CHROMINANCE_QUANT_TABLE, STD_LUMINANCE_QUANT_TABLE, ZIGZAG_TO_NATURAL};

/// Chroma subsampling scheme for three/four-component JPEG color spaces.
/// Grayscale ignores this (always 1x1). SPEC_FULL.md §4.3.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Subsampling {
    Yuv444,
    Yuv422,
    Yuv420,
}

#[derive(Clone, Copy)]
pub struct EncoderOptions {
    /// 1..=100, following the IJG quality scale (SPEC_FULL.md §4.4).
    pub quality: u8,
    /// 0 disables restart markers.
    pub restart_interval: u16,
    pub subsampling: Subsampling,
}

impl Default for EncoderOptions {
    fn default() -> EncoderOptions {
        EncoderOptions { quality: 75, restart_interval: 0, subsampling: Subsampling::Yuv420 }
    }
}

/// Compress one full image already resident in `input` (interleaved samples
/// in `input_color`) into `out`, using `arena_storage` for the working set
/// of per-iMCU-row plane buffers. Returns the number of bytes written to
/// `out`. Neither `input` nor `out` ever needs to be larger than the image
/// they represent; `arena_storage` only needs to satisfy
/// [`Arena::size_hint`], independent of image height.
pub fn compress(
    input: &[u8],
    width: usize,
    height: usize,
    input_color: ColorSpace,
    jpeg_color: ColorSpace,
    options: &EncoderOptions,
    arena_storage: &mut [u8],
    out: &mut [u8],
) -> Result<usize, JpegError> {
    if width == 0 || height == 0 {
        return Err(JpegError::InvariantViolated("image dimensions must be nonzero"));
    }
    let n_comp = jpeg_color.num_components();
    if input.len() < width * height * input_color.num_components() {
        return Err(JpegError::InvariantViolated("input buffer shorter than width*height*components"));
    }

    let arena = Arena::new(arena_storage);
    arena.check_envelope(n_comp, width)?;

    let (h_samps, v_samps) = sampling_factors(jpeg_color, options.subsampling);
    let mut components: Vec<ComponentInfo> = (0..n_comp)
        .map(|i| {
            let slot = u8::from(i != 0);
            let mut c = ComponentInfo::new((i + 1) as u8, i, h_samps[i], v_samps[i], slot);
            c.dc_table_slot = slot;
            c.ac_table_slot = slot;
            c
        })
        .collect();
    let geometry = FrameGeometry::compute(width, height, &components);
    for c in &mut components {
        c.compute_geometry(width, height, geometry.h_max, geometry.v_max, true);
    }

    let luminance_quant = QuantTable::from_basic(&STD_LUMINANCE_QUANT_TABLE, options.quality, true);
    let mut chrominance_quant = QuantTable::from_basic(&STD_CHROMINANCE_QUANT_TABLE, options.quality, true);
    if jpeg_color == ColorSpace::BgYcc {
        chrominance_quant = chrominance_quant.doubled(true);
    }
    let quant_tables = [luminance_quant, chrominance_quant];

    let dc_luma = crate::tables::std_dc_luminance();
    let ac_luma = crate::tables::std_ac_luminance();
    let dc_chroma = crate::tables::std_dc_chrominance();
    let ac_chroma = crate::tables::std_ac_chrominance();
    let dc_tables = [EncoderTable::build(&dc_luma)?, EncoderTable::build(&dc_chroma)?];
    let ac_tables = [EncoderTable::build(&ac_luma)?, EncoderTable::build(&ac_chroma)?];

    let mut writer = MarkerWriter::new(out);
    writer.write_soi()?;
    match jpeg_color {
        ColorSpace::YCbCr | ColorSpace::Grayscale => writer.write_jfif_app0()?,
        ColorSpace::Cmyk | ColorSpace::Ycck | ColorSpace::BgYcc => writer.write_adobe_app14(jpeg_color)?,
    }
    writer.write_dqt(0, &quant_tables[0])?;
    if n_comp > 1 {
        writer.write_dqt(1, &quant_tables[1])?;
    }
    writer.write_sof0(width as u16, height as u16, &components)?;
    writer.write_dht(0, 0, &dc_luma)?;
    writer.write_dht(1, 0, &ac_luma)?;
    if n_comp > 1 {
        writer.write_dht(0, 1, &dc_chroma)?;
        writer.write_dht(1, 1, &ac_chroma)?;
    }
    if options.restart_interval > 0 {
        writer.write_dri(options.restart_interval)?;
    }
    writer.write_sos(&components)?;

    let full_res_width = geometry.mcus_across * 8 * usize::from(geometry.h_max);
    let full_res_height = 8 * usize::from(geometry.v_max);
    let full_widths = vec![full_res_width; n_comp];
    let full_heights = vec![full_res_height; n_comp];
    let mut full_res = RowBuffers::allocate(&arena, &full_widths, &full_heights)?;

    let down_widths: Vec<usize> = components.iter().map(|c| c.blocks_per_row * 8).collect();
    let down_heights: Vec<usize> = components.iter().map(|c| usize::from(c.v_samp) * 8).collect();
    let mut downsampled = RowBuffers::allocate(&arena, &down_widths, &down_heights)?;

    let converter = color::Encoder::select(input_color, jpeg_color);
    let in_comps = input_color.num_components();

    let downsamplers: Vec<Downsampler> = components
        .iter()
        .map(|c| Downsampler::select(c.h_samp, c.v_samp, geometry.h_max, geometry.v_max))
        .collect::<Result<_, _>>()?;

    let mut dc_preds = vec![0i32; n_comp];
    let mut mcus_emitted = 0usize;
    let mut restarts_emitted = 0usize;

    {
        let mut bits = BitWriter::new(writer.remaining_mut());

        for imcu_row in 0..geometry.imcu_rows() {
            let (row_start, _row_end) = imcu_row_range(geometry, imcu_row);

            for y in 0..full_res_height {
                let src_row = (row_start + y).min(height - 1);
                let mut row_slices: Vec<&mut [u8]> = full_res
                    .planes
                    .iter_mut()
                    .map(|plane| &mut plane[y * full_res_width..(y + 1) * full_res_width])
                    .collect();
                for x in 0..full_res_width {
                    let src_col = x.min(width - 1);
                    let pixel_off = (src_row * width + src_col) * in_comps;
                    converter.convert_pixel(&input[pixel_off..pixel_off + in_comps], &mut row_slices, x);
                }
            }

            for (ci, c) in components.iter().enumerate() {
                let v_ratio = usize::from(geometry.v_max) / usize::from(c.v_samp);
                let out_w = down_widths[ci];
                for oy in 0..down_heights[ci] {
                    let rows: Vec<&[u8]> = (0..v_ratio)
                        .map(|k| {
                            let r = oy * v_ratio + k;
                            &full_res.planes[ci][r * full_res_width..(r + 1) * full_res_width]
                        })
                        .collect();
                    let dst_start = oy * out_w;
                    downsamplers[ci].apply(&rows, full_res_width, &mut downsampled.planes[ci][dst_start..dst_start + out_w], out_w);
                }
            }

            for mcu_x in 0..geometry.mcus_across {
                for (ci, c) in components.iter().enumerate() {
                    let table_slot = usize::from(c.dc_table_slot);
                    for sub_y in 0..usize::from(c.v_samp) {
                        for sub_x in 0..usize::from(c.h_samp) {
                            let block_col = mcu_x * usize::from(c.h_samp) + sub_x;
                            let out_w = down_widths[ci];
                            let row_offset = sub_y * 8 * out_w;
                            let block = extract_block(
                                &downsampled.planes[ci][row_offset..],
                                out_w,
                                out_w,
                                8,
                                block_col,
                            );
                            let shifted = level_shift_in(&block);
                            let mut freq = shifted;
                            forward_dct_block(&mut freq);
                            let quantized = quantize_block(&freq, &quant_tables[table_slot].values);

                            let mut zigzag = [0i16; 64];
                            for (z, &natural_idx) in ZIGZAG_TO_NATURAL.iter().enumerate() {
                                zigzag[z] = quantized[natural_idx];
                            }
                            encode_block(
                                &mut bits,
                                &zigzag,
                                &dc_tables[table_slot],
                                &ac_tables[table_slot],
                                &mut dc_preds[ci],
                            )?;
                        }
                    }
                }

                mcus_emitted += 1;
                if is_restart_boundary(mcus_emitted, options.restart_interval) {
                    bits.flush_to_byte_boundary()?;
                    bits.write_marker(0xD0 + restart_marker_index(restarts_emitted))?;
                    restarts_emitted += 1;
                    for pred in &mut dc_preds {
                        *pred = 0;
                    }
                }
            }
        }

        bits.flush_to_byte_boundary()?;
        let entropy_len = bits.bytes_written();
        writer.advance(entropy_len);
    }

    writer.write_eoi()?;
    Ok(writer.bytes_written())
}

fn sampling_factors(jpeg_color: ColorSpace, subsampling: Subsampling) -> (Vec<u8>, Vec<u8>) {
    match jpeg_color {
        ColorSpace::Grayscale => (vec![1], vec![1]),
        ColorSpace::Cmyk | ColorSpace::Ycck => (vec![1, 1, 1, 1], vec![1, 1, 1, 1]),
        ColorSpace::YCbCr | ColorSpace::BgYcc => match subsampling {
            Subsampling::Yuv444 => (vec![1, 1, 1], vec![1, 1, 1]),
            Subsampling::Yuv422 => (vec![2, 1, 1], vec![1, 1, 1]),
            Subsampling::Yuv420 => (vec![2, 1, 1], vec![2, 1, 1]),
        },
    }
}

#[must_use]
pub fn estimate_output_capacity(width: usize, height: usize, n_comp: usize) -> usize {
    // Generous worst case: uncompressed size plus marker overhead, matching
    // the IJG encoder's own conservative buffer sizing advice.
    ceil_div(width * height * n_comp * 2, 1) + 4096
}

/// Compress with the image's MCUs split into roughly `n_restart_sections`
/// equally-sized restart intervals, rather than an exact MCU-count interval.
/// `n_restart_sections == 0` disables restart markers entirely.
pub fn compress_with_restarts(
    input: &[u8],
    width: usize,
    height: usize,
    input_color: ColorSpace,
    jpeg_color: ColorSpace,
    quality: u8,
    n_restart_sections: u16,
    arena_storage: &mut [u8],
    out: &mut [u8],
) -> Result<usize, JpegError> {
    let subsampling = Subsampling::Yuv420;
    let (h_samps, v_samps) = sampling_factors(jpeg_color, subsampling);
    let h_max = usize::from(*h_samps.iter().max().unwrap_or(&1));
    let v_max = usize::from(*v_samps.iter().max().unwrap_or(&1));
    let total_mcus = ceil_div(width, 8 * h_max) * ceil_div(height, 8 * v_max);
    let restart_interval = if n_restart_sections == 0 {
        0
    } else {
        ceil_div(total_mcus, usize::from(n_restart_sections)).max(1) as u16
    };
    let options = EncoderOptions { quality, restart_interval, subsampling };
    compress(input, width, height, input_color, jpeg_color, &options, arena_storage, out)
}
