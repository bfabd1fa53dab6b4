//! Per-component geometry, shared by the encoder and decoder. Grounded in
//! the teacher's `components.rs` (`Components::from`) and `decoder.rs`'s
//! MCU geometry fields, generalized from 1..=4 Y/Cb/Cr/K components to the
//! spec's 1..=10 scripted components.
use crate::error::JpegError;

/// Maximum number of components this core will process in a single scan,
/// per SPEC_FULL.md §3 ("N components (1..10, scan <= 4)").
pub const MAX_COMPONENTS: usize = 10;
/// Maximum components interleaved within one scan.
pub const MAX_COMPONENTS_PER_SCAN: usize = 4;
/// Maximum horizontal/vertical sampling factor for any component.
pub const MAX_SAMPLING_FACTOR: u8 = 4;

/// Per-component metadata derived from the SOF segment (decode) or supplied
/// by the caller (encode), plus everything downstream stages need: block
/// dimensions, MCU geometry, and slots into the shared table arrays.
#[derive(Clone)]
pub struct ComponentInfo {
    pub id: u8,
    pub index: usize,
    pub h_samp: u8,
    pub v_samp: u8,
    pub quant_table_slot: u8,
    pub dc_table_slot: u8,
    pub ac_table_slot: u8,

    /// Component width/height in full 8x8 blocks, rounded up to the MCU
    /// boundary (may include padding blocks beyond the image edge).
    pub blocks_per_row: usize,
    pub blocks_per_col: usize,
    /// Down-sampled pixel dimensions (before block-boundary padding).
    pub downsampled_width: usize,
    pub downsampled_height: usize,
    /// Blocks contributed by this component to a single MCU: `h_samp *
    /// v_samp` when the scan is interleaved, 1 otherwise.
    pub mcu_blocks: usize,
    /// Width, in pixels, of the final (possibly partial) column of blocks.
    pub last_col_width: usize,
    /// Height, in pixels, of the final (possibly partial) row of blocks.
    pub last_row_height: usize,

    pub dc_pred: i32,
}

impl ComponentInfo {
    #[must_use]
    pub fn new(id: u8, index: usize, h_samp: u8, v_samp: u8, quant_table_slot: u8) -> ComponentInfo {
        ComponentInfo {
            id,
            index,
            h_samp,
            v_samp,
            quant_table_slot,
            dc_table_slot: 0,
            ac_table_slot: 0,
            blocks_per_row: 0,
            blocks_per_col: 0,
            downsampled_width: 0,
            downsampled_height: 0,
            mcu_blocks: 0,
            last_col_width: 0,
            last_row_height: 0,
            dc_pred: 0,
        }
    }

    pub fn validate(&self) -> Result<(), JpegError> {
        if self.h_samp == 0 || self.h_samp > MAX_SAMPLING_FACTOR || self.v_samp == 0 || self.v_samp > MAX_SAMPLING_FACTOR {
            return Err(JpegError::StructuralCorruption(
                "component sampling factor outside 1..=4",
            ));
        }
        if usize::from(self.quant_table_slot) >= 4 {
            return Err(JpegError::StructuralCorruption("quantization table index outside 0..=3"));
        }
        Ok(())
    }

    /// Compute downsampled pixel size and block/MCU geometry for this
    /// component given the frame's overall pixel size and maximum sampling
    /// factors, interleaving it into the MCU grid (SPEC_FULL.md §3 "MCU").
    pub fn compute_geometry(&mut self, width: usize, height: usize, h_max: u8, v_max: u8, interleaved: bool) {
        self.downsampled_width = ceil_div(width * usize::from(self.h_samp), usize::from(h_max));
        self.downsampled_height = ceil_div(height * usize::from(self.v_samp), usize::from(v_max));

        if interleaved {
            let mcu_width_blocks = usize::from(self.h_samp);
            let mcu_height_blocks = usize::from(self.v_samp);
            let mcus_across = ceil_div(width, 8 * usize::from(h_max));
            let mcus_down = ceil_div(height, 8 * usize::from(v_max));
            self.blocks_per_row = mcus_across * mcu_width_blocks;
            self.blocks_per_col = mcus_down * mcu_height_blocks;
            self.mcu_blocks = mcu_width_blocks * mcu_height_blocks;
        } else {
            self.blocks_per_row = ceil_div(self.downsampled_width, 8);
            self.blocks_per_col = ceil_div(self.downsampled_height, 8);
            self.mcu_blocks = 1;
        }

        let full_cols = self.downsampled_width / 8;
        self.last_col_width = if self.downsampled_width % 8 == 0 { 8 } else { self.downsampled_width - full_cols * 8 };
        let full_rows = self.downsampled_height / 8;
        self.last_row_height = if self.downsampled_height % 8 == 0 { 8 } else { self.downsampled_height - full_rows * 8 };
    }
}

#[must_use]
pub const fn ceil_div(num: usize, den: usize) -> usize {
    (num + den - 1) / den
}

/// Geometry shared across the whole frame: maximum sampling factors and the
/// MCU/iMCU-row grid they imply.
#[derive(Clone, Copy, Default)]
pub struct FrameGeometry {
    pub h_max: u8,
    pub v_max: u8,
    pub mcus_across: usize,
    pub mcus_down: usize,
}

impl FrameGeometry {
    #[must_use]
    pub fn compute(width: usize, height: usize, components: &[ComponentInfo]) -> FrameGeometry {
        let h_max = components.iter().map(|c| c.h_samp).max().unwrap_or(1);
        let v_max = components.iter().map(|c| c.v_samp).max().unwrap_or(1);
        FrameGeometry {
            h_max,
            v_max,
            mcus_across: ceil_div(width, 8 * usize::from(h_max)),
            mcus_down: ceil_div(height, 8 * usize::from(v_max)),
        }
    }

    #[must_use]
    pub fn imcu_rows(self) -> usize {
        self.mcus_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn h2v2_geometry_matches_known_layout() {
        let mut y = ComponentInfo::new(1, 0, 2, 2, 0);
        let mut cb = ComponentInfo::new(2, 1, 1, 1, 1);
        y.compute_geometry(18, 18, 2, 2, true);
        cb.compute_geometry(18, 18, 2, 2, true);

        // 18px at 8px/block with 2x2 MCU blocks -> ceil(18/16) = 2 MCUs across/down.
        assert_eq!(y.blocks_per_row, 4);
        assert_eq!(y.blocks_per_col, 4);
        assert_eq!(cb.blocks_per_row, 2);
        assert_eq!(cb.blocks_per_col, 2);
        assert_eq!(y.mcu_blocks, 4);
        assert_eq!(cb.mcu_blocks, 1);
    }

    #[test]
    fn partial_edge_blocks_recorded() {
        let mut y = ComponentInfo::new(1, 0, 1, 1, 0);
        y.compute_geometry(20, 10, 1, 1, false);
        assert_eq!(y.last_col_width, 4);
        assert_eq!(y.last_row_height, 2);
    }
}
