//! DC-difference and zero-run-length AC entropy coding for a single 8x8
//! block, SPEC_FULL.md §4.5 (encode) and §4.8 (decode). Grounded in the
//! teacher's `bitstream.rs::decode_mcu_block`/`decode_dc` (fast lookahead
//! table, then slow `maxcode`/`valoffset` fallback) and `jchuff.c`'s
//! `encode_one_block` (magnitude-category run-length scheme).
use crate::bitreader::BitReader;
use crate::bitwriter::BitWriter;
use crate::error::JpegError;
use crate::huffman::{DecoderTable, EncoderTable, LOOKAHEAD_BITS};

/// End-of-block / zero-run-length sentinel symbols for AC coding, per
/// ISO/IEC 10918-1 Table 5/6.
const ZRL: u8 = 0xF0;
const EOB: u8 = 0x00;

/// Number of bits needed to represent `magnitude` (0 for zero), matching
/// `jchuff.c`'s category table.
#[must_use]
pub fn magnitude_category(value: i32) -> u8 {
    let magnitude = value.unsigned_abs();
    32 - magnitude.leading_zeros() as u8
}

/// Bit pattern for a value within its category: non-negative values are
/// sent as-is, negative values as `value - 1` reinterpreted in `size` bits
/// (the inverse of [`crate::bitreader::BitReader::receive_extend`]).
fn category_bits(value: i32, size: u8) -> u32 {
    if size == 0 {
        return 0;
    }
    if value < 0 {
        ((value - 1) & ((1i32 << size) - 1)) as u32
    } else {
        value as u32
    }
}

/// Encode one block's 64 zig-zag-ordered, already-quantized coefficients.
/// `dc_pred` is the running DC predictor for this component, updated in
/// place per ISO/IEC 10918-1 §F.1.2.1.
pub fn encode_block(
    writer: &mut BitWriter,
    coeffs_zigzag: &[i16; 64],
    dc_table: &EncoderTable,
    ac_table: &EncoderTable,
    dc_pred: &mut i32,
) -> Result<(), JpegError> {
    let dc_value = i32::from(coeffs_zigzag[0]);
    let diff = dc_value - *dc_pred;
    *dc_pred = dc_value;

    let dc_size = magnitude_category(diff);
    emit_symbol(writer, dc_table, dc_size)?;
    if dc_size > 0 {
        writer.write_bits(category_bits(diff, dc_size), dc_size)?;
    }

    let mut run = 0u32;
    for &coeff in &coeffs_zigzag[1..64] {
        if coeff == 0 {
            run += 1;
            continue;
        }
        while run > 15 {
            emit_symbol(writer, ac_table, ZRL)?;
            run -= 16;
        }
        let ac_size = magnitude_category(i32::from(coeff));
        let symbol = ((run as u8) << 4) | ac_size;
        emit_symbol(writer, ac_table, symbol)?;
        writer.write_bits(category_bits(i32::from(coeff), ac_size), ac_size)?;
        run = 0;
    }
    if run > 0 {
        emit_symbol(writer, ac_table, EOB)?;
    }
    Ok(())
}

fn emit_symbol(writer: &mut BitWriter, table: &EncoderTable, symbol: u8) -> Result<(), JpegError> {
    let entry = table.entries[symbol as usize];
    if entry.length == 0 {
        return Err(JpegError::StructuralCorruption("no Huffman code assigned for required symbol"));
    }
    writer.write_bits(u32::from(entry.code), entry.length)
}

/// Decode one Huffman symbol using the table's fast lookahead path, falling
/// back to the slow `maxcode`/`valoffset` walk for codes longer than
/// [`LOOKAHEAD_BITS`], matching the teacher's two-tier approach.
fn decode_symbol(reader: &mut BitReader, table: &DecoderTable) -> Result<u8, JpegError> {
    let peeked = reader.peek_bits(LOOKAHEAD_BITS);
    let packed = table.lookup[peeked as usize];
    if packed != 0xFFFF {
        let length = (packed >> 8) as u32;
        reader.drop_bits(length);
        return Ok((packed & 0xFF) as u8);
    }

    let mut code = i32::from(reader.peek_bits(LOOKAHEAD_BITS));
    reader.drop_bits(LOOKAHEAD_BITS);
    let mut len = LOOKAHEAD_BITS as usize;
    loop {
        len += 1;
        if len >= table.maxcode.len() {
            return Err(JpegError::DataCorruption("Huffman code exceeds 16 bits"));
        }
        code = (code << 1) | i32::from(reader.get_bits(1));
        if code <= table.maxcode[len] {
            break;
        }
    }
    table.symbol_for(len, code).ok_or(JpegError::DataCorruption("Huffman code not present in table"))
}

/// Decode one block's 64 coefficients in zig-zag order, updating `dc_pred`
/// in place. Returns `Ok` with whatever coefficients were read even if a
/// marker interrupts the block early; the caller decides whether to treat a
/// short block as corruption (SPEC_FULL.md §4.8 restart semantics).
pub fn decode_block(
    reader: &mut BitReader,
    dc_table: &DecoderTable,
    ac_table: &DecoderTable,
    dc_pred: &mut i32,
) -> Result<[i16; 64], JpegError> {
    let mut coeffs = [0i16; 64];

    let dc_size = decode_symbol(reader, dc_table)?;
    if dc_size > 16 {
        return Err(JpegError::DataCorruption("DC magnitude category out of range"));
    }
    let diff = reader.receive_extend(u32::from(dc_size));
    *dc_pred += diff;
    coeffs[0] = (*dc_pred).clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;

    let mut k = 1usize;
    while k < 64 {
        let symbol = decode_symbol(reader, ac_table)?;
        let run = symbol >> 4;
        let size = symbol & 0x0F;
        if symbol == EOB {
            break;
        }
        if symbol == ZRL {
            k += 16;
            continue;
        }
        k += run as usize;
        if k >= 64 {
            return Err(JpegError::DataCorruption("AC run-length overruns block"));
        }
        let value = reader.receive_extend(u32::from(size));
        coeffs[k] = value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        k += 1;
    }
    Ok(coeffs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{std_ac_luminance, std_dc_luminance};

    fn build_tables() -> (EncoderTable, EncoderTable, DecoderTable, DecoderTable) {
        let dc_spec = std_dc_luminance();
        let ac_spec = std_ac_luminance();
        (
            EncoderTable::build(&dc_spec).unwrap(),
            EncoderTable::build(&ac_spec).unwrap(),
            DecoderTable::build(&dc_spec, true).unwrap(),
            DecoderTable::build(&ac_spec, false).unwrap(),
        )
    }

    #[test]
    fn magnitude_category_matches_known_values() {
        assert_eq!(magnitude_category(0), 0);
        assert_eq!(magnitude_category(1), 1);
        assert_eq!(magnitude_category(-1), 1);
        assert_eq!(magnitude_category(4), 3);
        assert_eq!(magnitude_category(-4), 3);
    }

    #[test]
    fn round_trips_a_sparse_block() {
        let (enc_dc, enc_ac, dec_dc, dec_ac) = build_tables();
        let mut coeffs = [0i16; 64];
        coeffs[0] = 12;
        coeffs[1] = -3;
        coeffs[5] = 1;

        let mut buf = [0u8; 64];
        let mut enc_pred = 0i32;
        {
            let mut writer = BitWriter::new(&mut buf);
            encode_block(&mut writer, &coeffs, &enc_dc, &enc_ac, &mut enc_pred).unwrap();
            writer.flush_to_byte_boundary().unwrap();
        }

        let mut dec_pred = 0i32;
        let mut reader = BitReader::new(&buf);
        let decoded = decode_block(&mut reader, &dec_dc, &dec_ac, &mut dec_pred).unwrap();
        assert_eq!(decoded, coeffs);
        assert_eq!(dec_pred, enc_pred);
    }

    #[test]
    fn round_trips_a_zero_run_of_sixteen_or_more() {
        let (enc_dc, enc_ac, dec_dc, dec_ac) = build_tables();
        let mut coeffs = [0i16; 64];
        coeffs[0] = 4;
        // 17 zeros before the next nonzero AC coefficient: one ZRL (16
        // zeros) plus a run of 1 in the following symbol's run-length field.
        coeffs[18] = 7;

        let mut buf = [0u8; 64];
        let mut enc_pred = 0i32;
        {
            let mut writer = BitWriter::new(&mut buf);
            encode_block(&mut writer, &coeffs, &enc_dc, &enc_ac, &mut enc_pred).unwrap();
            writer.flush_to_byte_boundary().unwrap();
        }

        let mut dec_pred = 0i32;
        let mut reader = BitReader::new(&buf);
        let decoded = decode_block(&mut reader, &dec_dc, &dec_ac, &mut dec_pred).unwrap();
        assert_eq!(decoded, coeffs);
    }

    #[test]
    fn all_zero_block_is_just_eob() {
        let (enc_dc, enc_ac, dec_dc, dec_ac) = build_tables();
        let coeffs = [0i16; 64];
        let mut buf = [0u8; 16];
        let mut enc_pred = 5i32;
        {
            let mut writer = BitWriter::new(&mut buf);
            encode_block(&mut writer, &coeffs, &enc_dc, &enc_ac, &mut enc_pred).unwrap();
            writer.flush_to_byte_boundary().unwrap();
        }
        let mut dec_pred = 5i32;
        let mut reader = BitReader::new(&buf);
        let decoded = decode_block(&mut reader, &dec_dc, &dec_ac, &mut dec_pred).unwrap();
        assert_eq!(decoded, coeffs);
    }
}
