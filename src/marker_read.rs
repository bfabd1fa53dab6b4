//! Marker segment parsing, decode side. SPEC_FULL.md §4.7. Grounded in the
//! teacher's `decoder.rs::decode_headers_internal`/`parse_marker_inner`
//! (marker dispatch loop, tolerant unknown-APPn skipping, DRI handling) and
//! `markers.rs`'s per-segment field layouts.
use crate::color::{adobe_transform_colorspace, ColorSpace};
use crate::component::ComponentInfo;
use crate::error::{JpegError, UnsupportedFeature};
use crate::marker::Marker;
use crate::tables::{HuffmanSpec, QuantTable};

/// Hard cap on how many marker segments a header parse will walk through
/// before giving up, per SPEC_FULL.md §4.7: a corrupt stream with no SOS
/// must fail fast rather than loop indefinitely.
const MAX_MARKER_SEGMENTS: usize = 1000;

pub struct ParsedHeaders {
    pub width: u16,
    pub height: u16,
    pub components: Vec<ComponentInfo>,
    pub quant_tables: [Option<QuantTable>; 4],
    pub dc_tables: [Option<HuffmanSpec>; 4],
    pub ac_tables: [Option<HuffmanSpec>; 4],
    pub restart_interval: u16,
    pub color_space: ColorSpace,
    pub adobe_transform: Option<u8>,
    /// Byte offset of the first entropy-coded byte, immediately after SOS's
    /// segment payload.
    pub scan_data_offset: usize,
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn u8(&mut self) -> Result<u8, JpegError> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or(JpegError::StructuralCorruption("unexpected end of stream while reading header"))?;
        self.pos += 1;
        Ok(b)
    }

    fn u16(&mut self) -> Result<u16, JpegError> {
        Ok((u16::from(self.u8()?) << 8) | u16::from(self.u8()?))
    }

    fn skip(&mut self, n: usize) -> Result<(), JpegError> {
        if self.pos + n > self.data.len() {
            return Err(JpegError::StructuralCorruption("segment length runs past end of stream"));
        }
        self.pos += n;
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], JpegError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&e| e <= self.data.len())
            .ok_or(JpegError::StructuralCorruption("segment length runs past end of stream"))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }
}

/// Parse every marker segment from SOI through SOS's payload, returning the
/// byte offset at which entropy-coded scan data begins.
pub fn parse_headers(data: &[u8]) -> Result<ParsedHeaders, JpegError> {
    let mut cur = Cursor { data, pos: 0 };

    if cur.u16()? != 0xFFD8 {
        return Err(JpegError::StructuralCorruption("missing SOI marker"));
    }

    let mut width = 0u16;
    let mut height = 0u16;
    let mut components: Vec<ComponentInfo> = Vec::new();
    let mut quant_tables: [Option<QuantTable>; 4] = Default::default();
    let mut dc_tables: [Option<HuffmanSpec>; 4] = Default::default();
    let mut ac_tables: [Option<HuffmanSpec>; 4] = Default::default();
    let mut restart_interval = 0u16;
    let mut color_space = ColorSpace::YCbCr;
    let mut adobe_transform: Option<u8> = None;
    let mut sof_seen = false;

    for _ in 0..MAX_MARKER_SEGMENTS {
        if cur.u8()? != 0xFF {
            return Err(JpegError::StructuralCorruption("expected a marker (0xFF prefix)"));
        }
        let mut code = cur.u8()?;
        while code == 0xFF {
            code = cur.u8()?;
        }
        let marker = Marker::from_u8(code)
            .ok_or(JpegError::StructuralCorruption("0x00/0xFF fill byte where a marker was expected"))?;

        match marker {
            Marker::SOF(0) => {
                sof_seen = true;
                parse_sof0(&mut cur, &mut width, &mut height, &mut components)?;
            }
            Marker::SOF(n) => return Err(JpegError::Unsupported(unsupported_sof(n))),
            Marker::DQT => parse_dqt(&mut cur, &mut quant_tables)?,
            Marker::DHT => parse_dht(&mut cur, &mut dc_tables, &mut ac_tables)?,
            Marker::DRI => {
                let len = cur.u16()?;
                if len != 4 {
                    return Err(JpegError::StructuralCorruption("DRI segment must be 4 bytes"));
                }
                restart_interval = cur.u16()?;
            }
            Marker::APP(14) => {
                let (transform, detected_space) = parse_adobe_app14(&mut cur, components.len())?;
                adobe_transform = Some(transform);
                color_space = detected_space;
            }
            Marker::SOS => {
                if !sof_seen {
                    return Err(JpegError::StructuralCorruption("SOS before SOF"));
                }
                parse_sos(&mut cur, &mut components)?;
                if adobe_transform.is_none() {
                    color_space = match components.len() {
                        1 => ColorSpace::Grayscale,
                        3 => ColorSpace::YCbCr,
                        4 => ColorSpace::Cmyk,
                        _ => return Err(JpegError::StructuralCorruption("unsupported component count")),
                    };
                }
                return Ok(ParsedHeaders {
                    width,
                    height,
                    components,
                    quant_tables,
                    dc_tables,
                    ac_tables,
                    restart_interval,
                    color_space,
                    adobe_transform,
                    scan_data_offset: cur.pos,
                });
            }
            Marker::EOI => return Err(JpegError::StructuralCorruption("premature end of image before SOS")),
            Marker::DAC => return Err(JpegError::Unsupported(UnsupportedFeature::ExtendedSequentialDctArithmetic)),
            _ => {
                // Unknown/uninteresting segment (COM, other APPn, DNL): skip
                // its payload per length, tolerant of vendor extensions.
                let len = cur.u16()?;
                if len < 2 {
                    return Err(JpegError::StructuralCorruption("marker segment length below minimum of 2"));
                }
                cur.skip(usize::from(len) - 2)?;
            }
        }
    }
    Err(JpegError::StructuralCorruption("too many marker segments without reaching SOS"))
}

fn unsupported_sof(n: u8) -> UnsupportedFeature {
    match n {
        1 => UnsupportedFeature::ExtendedSequentialHuffman,
        2 => UnsupportedFeature::ProgressiveDctHuffman,
        3 | 11 | 15 => UnsupportedFeature::Lossless,
        9 => UnsupportedFeature::ExtendedSequentialDctArithmetic,
        10 => UnsupportedFeature::ProgressiveDctArithmetic,
        _ => UnsupportedFeature::ExtendedSequentialHuffman,
    }
}

fn parse_sof0(
    cur: &mut Cursor,
    width: &mut u16,
    height: &mut u16,
    components: &mut Vec<ComponentInfo>,
) -> Result<(), JpegError> {
    let _len = cur.u16()?;
    let precision = cur.u8()?;
    if precision != 8 {
        return Err(JpegError::Unsupported(UnsupportedFeature::NonBaselinePrecision(precision)));
    }
    *height = cur.u16()?;
    *width = cur.u16()?;
    if *width == 0 {
        return Err(JpegError::StructuralCorruption("zero image width"));
    }
    if *height == 0 {
        return Err(JpegError::StructuralCorruption("zero image height"));
    }
    let n = cur.u8()?;
    if n == 0 || usize::from(n) > crate::component::MAX_COMPONENTS {
        return Err(JpegError::StructuralCorruption("component count outside 1..=10"));
    }
    components.clear();
    for idx in 0..usize::from(n) {
        let id = cur.u8()?;
        let samp = cur.u8()?;
        let quant_slot = cur.u8()?;
        let mut c = ComponentInfo::new(id, idx, samp >> 4, samp & 0x0F, quant_slot);
        c.validate()?;
        components.push(c);
    }
    Ok(())
}

fn parse_dqt(cur: &mut Cursor, quant_tables: &mut [Option<QuantTable>; 4]) -> Result<(), JpegError> {
    let len = cur.u16()?;
    let end = cur.pos + usize::from(len) - 2;
    while cur.pos < end {
        let pq_tq = cur.u8()?;
        let precision = pq_tq >> 4;
        let slot = usize::from(pq_tq & 0x0F);
        if slot >= 4 {
            return Err(JpegError::StructuralCorruption("quantization table slot outside 0..=3"));
        }
        if precision != 0 {
            return Err(JpegError::Unsupported(UnsupportedFeature::NonBaselineQuantPrecision));
        }
        let mut values = [0u16; 64];
        for &natural_idx in crate::tables::ZIGZAG_TO_NATURAL.iter() {
            values[natural_idx] = u16::from(cur.u8()?);
        }
        quant_tables[slot] = Some(QuantTable { values, sent: true });
    }
    Ok(())
}

fn parse_dht(
    cur: &mut Cursor,
    dc_tables: &mut [Option<HuffmanSpec>; 4],
    ac_tables: &mut [Option<HuffmanSpec>; 4],
) -> Result<(), JpegError> {
    let len = cur.u16()?;
    let end = cur.pos + usize::from(len) - 2;
    while cur.pos < end {
        let tc_th = cur.u8()?;
        let class = tc_th >> 4;
        let slot = usize::from(tc_th & 0x0F);
        if slot >= 4 {
            return Err(JpegError::StructuralCorruption("Huffman table slot outside 0..=3"));
        }
        let mut bits = [0u8; 16];
        bits.copy_from_slice(cur.take(16)?);
        let total: usize = bits.iter().map(|&b| b as usize).sum();
        if total > 256 {
            return Err(JpegError::StructuralCorruption("Huffman table declares more than 256 symbols"));
        }
        let huffval = cur.take(total)?.to_vec();
        let spec = HuffmanSpec { bits, huffval, sent: true };
        spec.validate(class == 0)?;
        if class == 0 {
            dc_tables[slot] = Some(spec);
        } else {
            ac_tables[slot] = Some(spec);
        }
    }
    Ok(())
}

fn parse_sos(cur: &mut Cursor, components: &mut [ComponentInfo]) -> Result<(), JpegError> {
    let _len = cur.u16()?;
    let ns = cur.u8()?;
    if usize::from(ns) == 0 || usize::from(ns) > crate::component::MAX_COMPONENTS_PER_SCAN {
        return Err(JpegError::StructuralCorruption("scan component count outside 1..=4"));
    }
    for _ in 0..ns {
        let id = cur.u8()?;
        let tables = cur.u8()?;
        let comp = components
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(JpegError::StructuralCorruption("SOS references unknown component id"))?;
        comp.dc_table_slot = tables >> 4;
        comp.ac_table_slot = tables & 0x0F;
    }
    let spectral_start = cur.u8()?;
    let spectral_end = cur.u8()?;
    let _successive = cur.u8()?;
    if spectral_start != 0 || spectral_end != 63 {
        return Err(JpegError::Unsupported(UnsupportedFeature::ProgressiveDctHuffman));
    }
    Ok(())
}

fn parse_adobe_app14(cur: &mut Cursor, num_components: usize) -> Result<(u8, ColorSpace), JpegError> {
    let len = cur.u16()?;
    if len < 14 {
        return Err(JpegError::StructuralCorruption("Adobe APP14 segment too short"));
    }
    let tag = cur.take(5)?;
    if tag != b"Adobe" {
        cur.skip(usize::from(len) - 2 - 5)?;
        return Ok((1, ColorSpace::YCbCr));
    }
    cur.skip(6)?; // version (2 bytes), flags0 (2 bytes), flags1 (2 bytes)
    let transform = cur.u8()?;
    let remaining = usize::from(len) - 2 - 5 - 6 - 1;
    cur.skip(remaining)?;
    Ok((transform, adobe_transform_colorspace(transform, num_components)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_soi() {
        let data = [0x00u8, 0x00];
        assert!(parse_headers(&data).is_err());
    }

    #[test]
    fn rejects_progressive_sof2() {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xC2, 0x00, 0x0B, 0x08, 0x00, 0x01, 0x00, 0x01, 0x01, 0x01, 0x00, 0x00];
        let result = parse_headers(&mut data);
        assert!(matches!(result, Err(JpegError::Unsupported(UnsupportedFeature::ProgressiveDctHuffman))));
    }

    #[test]
    fn rejects_zero_height_sof0() {
        #[rustfmt::skip]
        let data = [
            0xFF, 0xD8, // SOI
            0xFF, 0xC0, // SOF0
            0x00, 0x0B, // length
            0x08, // precision
            0x00, 0x00, // height = 0
            0x00, 0x01, // width = 1
            0x01, // one component
            0x01, 0x11, 0x00,
        ];
        let result = parse_headers(&data);
        assert!(matches!(result, Err(JpegError::StructuralCorruption(_))));
    }
}
