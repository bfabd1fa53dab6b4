//! Static tables shared by both pipelines: zig-zag order, the Annex K
//! standard quantization/Huffman tables, and quality scaling. Grounded in
//! `jcparam.c` (quality scaling, standard quant tables) and the teacher's
//! `misc.rs` (`UN_ZIGZAG`).
use crate::error::JpegError;

/// Maps zig-zag scan order (the order coefficients appear in the entropy
/// stream) to natural (row-major) order within an 8x8 block.
#[rustfmt::skip]
pub const ZIGZAG_TO_NATURAL: [usize; 64] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// Annex K sample luminance quantization table, natural order.
#[rustfmt::skip]
pub const STD_LUMINANCE_QUANT_TABLE: [u16; 64] = [
    16,  11,  10,  16,  24,  40,  51,  61,
    12,  12,  14,  19,  26,  58,  60,  55,
    14,  13,  16,  24,  40,  57,  69,  56,
    14,  17,  22,  29,  51,  87,  80,  62,
    18,  22,  37,  56,  68, 109, 103,  77,
    24,  35,  55,  64,  81, 104, 113,  92,
    49,  64,  78,  87, 103, 121, 120, 101,
    72,  92,  95,  98, 112, 100, 103,  99,
];

/// Annex K sample chrominance quantization table, natural order.
#[rustfmt::skip]
pub const STD_CHROMINANCE_QUANT_TABLE: [u16; 64] = [
    17,  18,  24,  47,  99,  99,  99,  99,
    18,  21,  26,  66,  99,  99,  99,  99,
    24,  26,  56,  99,  99,  99,  99,  99,
    47,  66,  99,  99,  99,  99,  99,  99,
    99,  99,  99,  99,  99,  99,  99,  99,
    99,  99,  99,  99,  99,  99,  99,  99,
    99,  99,  99,  99,  99,  99,  99,  99,
    99,  99,  99,  99,  99,  99,  99,  99,
];

/// Convert a 0..=100 user quality rating to a scaling percentage, following
/// `jpeg_quality_scaling` exactly.
#[must_use]
pub fn quality_scaling(quality: u8) -> u32 {
    let quality = u32::from(quality.clamp(1, 100));
    if quality < 50 {
        5000 / quality
    } else {
        200 - quality * 2
    }
}

/// Scale a basic (Annex K) quant table by `scale_factor` (a percentage, as
/// returned by [`quality_scaling`]), per `jpeg_add_quant_table`.
#[must_use]
pub fn scale_quant_table(basic: &[u16; 64], scale_factor: u32, force_baseline: bool) -> [u16; 64] {
    let mut out = [0u16; 64];
    for (o, b) in out.iter_mut().zip(basic.iter()) {
        let mut temp = (u32::from(*b) * scale_factor + 50) / 100;
        if temp == 0 {
            temp = 1;
        }
        if temp > 32767 {
            temp = 32767;
        }
        if force_baseline && temp > 255 {
            temp = 255;
        }
        *o = temp as u16;
    }
    out
}

/// A quantization table: 64 natural-order entries plus a `sent` flag used to
/// suppress duplicate DQT emission (SPEC_FULL.md §3 "Tables").
#[derive(Clone, Copy)]
pub struct QuantTable {
    pub values: [u16; 64],
    pub sent: bool,
}

impl QuantTable {
    #[must_use]
    pub fn from_basic(basic: &[u16; 64], quality: u8, force_baseline: bool) -> QuantTable {
        QuantTable {
            values: scale_quant_table(basic, quality_scaling(quality), force_baseline),
            sent: false,
        }
    }

    /// Double every quantizer step, per the Adobe BG-YCC convention of
    /// quantizing chroma twice as coarsely as plain YCbCr at the same
    /// quality setting.
    #[must_use]
    pub fn doubled(&self, force_baseline: bool) -> QuantTable {
        let cap = if force_baseline { 255 } else { 32767 };
        let mut values = [0u16; 64];
        for (o, v) in values.iter_mut().zip(self.values.iter()) {
            *o = (u32::from(*v) * 2).min(cap) as u16;
        }
        QuantTable { values, sent: false }
    }
}

/// The DHT payload for one table: per-length code counts and symbols in
/// code-length order, plus a `sent` flag.
#[derive(Clone)]
pub struct HuffmanSpec {
    /// `bits[l-1]` = number of codes of length `l`, for `l` in 1..=16.
    pub bits: [u8; 16],
    /// Symbols, ordered by increasing code length.
    pub huffval: Vec<u8>,
    pub sent: bool,
}

impl HuffmanSpec {
    #[must_use]
    pub fn new(bits: [u8; 16], huffval: Vec<u8>) -> HuffmanSpec {
        HuffmanSpec { bits, huffval, sent: false }
    }

    /// Validate that `bits`/`huffval` form a table baseline decoders accept:
    /// total symbol count <= 256 and (for DC tables) symbols in 0..=15.
    pub fn validate(&self, is_dc: bool) -> Result<(), JpegError> {
        let total: usize = self.bits.iter().map(|b| *b as usize).sum();
        if total != self.huffval.len() || total > 256 {
            return Err(JpegError::StructuralCorruption(
                "Huffman table symbol count does not match its huffval payload",
            ));
        }
        if is_dc {
            for &sym in &self.huffval {
                if sym > 15 {
                    return Err(JpegError::StructuralCorruption(
                        "DC Huffman symbol outside 0..=15",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Annex K standard DC luminance table.
#[must_use]
pub fn std_dc_luminance() -> HuffmanSpec {
    HuffmanSpec::new(
        [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0],
        vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
    )
}

/// Annex K standard AC luminance table.
#[must_use]
pub fn std_ac_luminance() -> HuffmanSpec {
    HuffmanSpec::new(
        [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 0x7d],
        vec![
            0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51,
            0x61, 0x07, 0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xa1, 0x08, 0x23, 0x42, 0xb1, 0xc1,
            0x15, 0x52, 0xd1, 0xf0, 0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0a, 0x16, 0x17, 0x18,
            0x19, 0x1a, 0x25, 0x26, 0x27, 0x28, 0x29, 0x2a, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39,
            0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49, 0x4a, 0x53, 0x54, 0x55, 0x56, 0x57,
            0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0x6a, 0x73, 0x74, 0x75,
            0x76, 0x77, 0x78, 0x79, 0x7a, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8a, 0x92,
            0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7,
            0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3,
            0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8,
            0xd9, 0xda, 0xe1, 0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf1, 0xf2,
            0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8, 0xf9, 0xfa,
        ],
    )
}

/// Annex K standard DC chrominance table.
#[must_use]
pub fn std_dc_chrominance() -> HuffmanSpec {
    HuffmanSpec::new(
        [0, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0],
        vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
    )
}

/// Annex K standard AC chrominance table.
#[must_use]
pub fn std_ac_chrominance() -> HuffmanSpec {
    HuffmanSpec::new(
        [0, 2, 1, 2, 4, 4, 3, 4, 7, 5, 4, 4, 0, 1, 2, 0x77],
        vec![
            0x00, 0x01, 0x02, 0x03, 0x11, 0x04, 0x05, 0x21, 0x31, 0x06, 0x12, 0x41, 0x51, 0x07,
            0x61, 0x71, 0x13, 0x22, 0x32, 0x81, 0x08, 0x14, 0x42, 0x91, 0xa1, 0xb1, 0xc1, 0x09,
            0x23, 0x33, 0x52, 0xf0, 0x15, 0x62, 0x72, 0xd1, 0x0a, 0x16, 0x24, 0x34, 0xe1, 0x25,
            0xf1, 0x17, 0x18, 0x19, 0x1a, 0x26, 0x27, 0x28, 0x29, 0x2a, 0x35, 0x36, 0x37, 0x38,
            0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49, 0x4a, 0x53, 0x54, 0x55, 0x56,
            0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0x6a, 0x73, 0x74,
            0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89,
            0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5,
            0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba,
            0xc2, 0xc3, 0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6,
            0xd7, 0xd8, 0xd9, 0xda, 0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf2,
            0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8, 0xf9, 0xfa,
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_scale_matches_ijg_formula() {
        assert_eq!(quality_scaling(50), 100);
        assert_eq!(quality_scaling(100), 0);
        assert_eq!(quality_scaling(1), 5000);
        assert_eq!(quality_scaling(75), 50);
    }

    #[test]
    fn q100_collapses_table_to_ones() {
        let table = scale_quant_table(&STD_LUMINANCE_QUANT_TABLE, quality_scaling(100), true);
        assert!(table.iter().all(|v| *v == 1));
    }

    #[test]
    fn doubled_table_has_twice_the_step_clamped_to_baseline() {
        let base = QuantTable::from_basic(&STD_CHROMINANCE_QUANT_TABLE, 75, true);
        let doubled = base.doubled(true);
        for (b, d) in base.values.iter().zip(doubled.values.iter()) {
            assert_eq!(*d, (u32::from(*b) * 2).min(255) as u16);
        }
    }

    #[test]
    fn standard_tables_are_well_formed() {
        std_dc_luminance().validate(true).unwrap();
        std_ac_luminance().validate(false).unwrap();
        std_dc_chrominance().validate(true).unwrap();
        std_ac_chrominance().validate(false).unwrap();
    }

    #[test]
    fn zigzag_is_a_permutation() {
        let mut seen = [false; 64];
        for &idx in &ZIGZAG_TO_NATURAL {
            assert!(!seen[idx]);
            seen[idx] = true;
        }
    }
}
