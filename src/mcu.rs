//! MCU / iMCU-row coordinate bookkeeping shared by the encoder and decoder.
//! SPEC_FULL.md §4.11. Grounded in the teacher's `decoder.rs` MCU geometry
//! fields (`mcu_width`, `mcu_height`, `mcu_x`, `mcu_y`) and the design note
//! in SPEC_FULL.md §9 replacing the teacher's per-stage worker objects
//! (`IDCTPtr`, `ColorConvert16Ptr`, `worker.rs`'s thread pool) with a single
//! cooperative loop over iMCU rows: one row of MCUs' worth of samples lives
//! in the arena at a time, not the whole image.
use crate::arena::Arena;
use crate::component::{ComponentInfo, FrameGeometry};
use crate::error::JpegError;

/// Per-component scratch row buffers for one iMCU row, carved out of the
/// arena in a single allocation and safely sub-divided with `split_at_mut`
/// (SPEC_FULL.md §4.1: the arena only ever hands out one live top-level
/// slice at a time; everything else is ordinary safe subdivision).
pub struct RowBuffers<'a> {
    /// One entry per component: `v_max` (encode) or sampling-ratio-adjusted
    /// rows of samples, `width`-ish columns wide, row-major.
    pub planes: Vec<&'a mut [u8]>,
    pub plane_width: Vec<usize>,
    pub plane_height: Vec<usize>,
}

impl<'a> RowBuffers<'a> {
    /// Allocate one row-buffer per component sized `width_px * rows` bytes,
    /// where `rows` is the component's own sample-row count for one iMCU
    /// row (`v_samp * 8` for full-resolution capture buffers, or `v_samp *
    /// 8` downsampled-domain rows for already-subsampled planes -- the
    /// caller picks which by the `rows_per_component`/`width_per_component`
    /// it supplies).
    pub fn allocate(
        arena: &'a Arena<'_>,
        width_per_component: &[usize],
        rows_per_component: &[usize],
    ) -> Result<RowBuffers<'a>, JpegError> {
        let sizes: Vec<usize> =
            width_per_component.iter().zip(rows_per_component).map(|(&w, &r)| w * r).collect();
        let total: usize = sizes.iter().sum();
        let workspace: &mut [u8] = arena.alloc_slice(total)?;

        let mut planes = Vec::with_capacity(sizes.len());
        let mut rest = workspace;
        for &size in &sizes {
            let (head, tail) = rest.split_at_mut(size);
            planes.push(head);
            rest = tail;
        }
        Ok(RowBuffers {
            planes,
            plane_width: width_per_component.to_vec(),
            plane_height: rows_per_component.to_vec(),
        })
    }
}

/// Iterates iMCU row index (0-based) and the half-open pixel-row range
/// `[start, end)` of the *full-resolution* image that row covers, including
/// rows past `height` for a partial bottom row (the caller replicates the
/// last real row to fill it, SPEC_FULL.md §4.3).
#[must_use]
pub fn imcu_row_range(geometry: FrameGeometry, row: usize) -> (usize, usize) {
    let step = 8 * usize::from(geometry.v_max);
    (row * step, (row + 1) * step)
}

/// Number of MCUs an interleaved scan emits per iMCU row, i.e. the scan's
/// horizontal MCU count (vertical is implicitly 1 per iMCU row).
#[must_use]
pub fn mcus_per_row(geometry: FrameGeometry) -> usize {
    geometry.mcus_across
}

/// Whether the MCU at `(mcu_index)` (0-based, within one iMCU row) starts a
/// new restart interval, given `restart_interval` MCUs per restart and the
/// running count of MCUs encoded/decoded since the image (or last restart)
/// started.
#[must_use]
pub fn is_restart_boundary(mcus_since_start: usize, restart_interval: u16) -> bool {
    restart_interval != 0 && mcus_since_start > 0 && mcus_since_start % usize::from(restart_interval) == 0
}

/// The `n` in `RSTn`, cycling 0..=7 per ISO/IEC 10918-1 §B.2.4.
#[must_use]
pub fn restart_marker_index(restarts_emitted: usize) -> u8 {
    (restarts_emitted % 8) as u8
}

/// Copy one component's 8x8 block out of its full-resolution row buffer at
/// block-column `block_col`, row-buffer-relative row `row_in_buffer`,
/// replicating the rightmost/bottommost sample to pad a partial edge block.
pub fn extract_block(
    plane: &[u8],
    plane_width: usize,
    valid_width: usize,
    valid_height_in_buffer: usize,
    block_col: usize,
) -> [u8; 64] {
    let mut block = [0u8; 64];
    for y in 0..8 {
        let src_row = y.min(valid_height_in_buffer.saturating_sub(1));
        let row_start = src_row * plane_width;
        for x in 0..8 {
            let col = (block_col * 8 + x).min(valid_width.saturating_sub(1));
            block[y * 8 + x] = plane[row_start + col];
        }
    }
    block
}

/// Scatter a decoded, de-quantized, and inverse-transformed 8x8 block of
/// samples back into its component's row buffer at `block_col`, clipping
/// against the buffer's own bounds (the last column of blocks along a
/// partial edge writes fewer than 8 real columns).
pub fn store_block(plane: &mut [u8], plane_width: usize, block_col: usize, block: &[u8; 64]) {
    for y in 0..8 {
        let row_start = y * plane_width;
        for x in 0..8 {
            let col = block_col * 8 + x;
            if col < plane_width {
                plane[row_start + col] = block[y * 8 + x];
            }
        }
    }
}

#[must_use]
pub fn component_mcu_block_count(components: &[ComponentInfo]) -> usize {
    components.iter().map(|c| c.mcu_blocks).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restart_boundary_fires_every_interval_mcus() {
        assert!(!is_restart_boundary(0, 4));
        assert!(!is_restart_boundary(3, 4));
        assert!(is_restart_boundary(4, 4));
        assert!(is_restart_boundary(8, 4));
        assert!(!is_restart_boundary(5, 0));
    }

    #[test]
    fn restart_marker_cycles_mod_8() {
        assert_eq!(restart_marker_index(0), 0);
        assert_eq!(restart_marker_index(7), 7);
        assert_eq!(restart_marker_index(8), 0);
    }

    #[test]
    fn extract_block_pads_partial_edges() {
        // 2x2 pixel plane, but we ask for an 8x8 block: every sample should
        // clamp back to the single valid pixel.
        let plane = [9u8, 9, 9, 9];
        let block = extract_block(&plane, 2, 1, 1, 0);
        assert!(block.iter().all(|&b| b == 9));
    }

    #[test]
    fn store_block_clips_to_plane_width() {
        let mut plane = [0u8; 8 * 4];
        let block = [7u8; 64];
        store_block(&mut plane, 4, 0, &block);
        for y in 0..8 {
            for x in 0..4 {
                assert_eq!(plane[y * 4 + x], 7);
            }
        }
    }
}
