//! Marker segment emission, encode side. SPEC_FULL.md §4.6. Grounded in the
//! pack's `JfifWriter::write_header`/`write_huffman_segment` (segment
//! framing, JFIF APP0 layout) and `jcparam.c`'s DQT/SOF0/SOS field order.
use crate::color::ColorSpace;
use crate::component::ComponentInfo;
use crate::error::JpegError;
use crate::marker::Marker;
use crate::tables::{HuffmanSpec, QuantTable};

pub struct MarkerWriter<'a> {
    out: &'a mut [u8],
    pos: usize,
}

impl<'a> MarkerWriter<'a> {
    #[must_use]
    pub fn new(out: &'a mut [u8]) -> MarkerWriter<'a> {
        MarkerWriter { out, pos: 0 }
    }

    #[must_use]
    pub fn bytes_written(&self) -> usize {
        self.pos
    }

    fn put_u8(&mut self, v: u8) -> Result<(), JpegError> {
        if self.pos >= self.out.len() {
            return Err(JpegError::ResourceExhaustion("output buffer exhausted writing marker segment"));
        }
        self.out[self.pos] = v;
        self.pos += 1;
        Ok(())
    }

    fn put_u16(&mut self, v: u16) -> Result<(), JpegError> {
        self.put_u8((v >> 8) as u8)?;
        self.put_u8(v as u8)
    }

    fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), JpegError> {
        for &b in bytes {
            self.put_u8(b)?;
        }
        Ok(())
    }

    pub fn write_marker(&mut self, marker: Marker) -> Result<(), JpegError> {
        self.put_u8(0xFF)?;
        self.put_u8(marker.as_u8())
    }

    pub fn write_soi(&mut self) -> Result<(), JpegError> {
        self.write_marker(Marker::SOI)
    }

    pub fn write_eoi(&mut self) -> Result<(), JpegError> {
        self.write_marker(Marker::EOI)
    }

    /// JFIF APP0, version 1.1, no thumbnail, density left as 1:1 aspect
    /// ratio (matches the pack reference's `write_header`).
    pub fn write_jfif_app0(&mut self) -> Result<(), JpegError> {
        self.write_marker(Marker::APP(0))?;
        self.put_u16(16)?;
        self.put_bytes(b"JFIF\0")?;
        self.put_bytes(&[0x01, 0x01])?;
        self.put_u8(0x00)?; // no density unit
        self.put_u16(1)?;
        self.put_u16(1)?;
        self.put_bytes(&[0x00, 0x00]) // no thumbnail
    }

    /// Adobe APP14, needed whenever the JPEG color space isn't plain YCbCr
    /// or grayscale (CMYK, YCCK, BG-YCC), SPEC_FULL.md §4.2.
    pub fn write_adobe_app14(&mut self, space: ColorSpace) -> Result<(), JpegError> {
        let transform: u8 = match space {
            ColorSpace::Cmyk => 0,
            ColorSpace::Ycck => 2,
            ColorSpace::BgYcc | ColorSpace::YCbCr => 1,
            ColorSpace::Grayscale => 0,
        };
        self.write_marker(Marker::APP(14))?;
        self.put_u16(14)?;
        self.put_bytes(b"Adobe")?;
        self.put_u16(100)?; // version
        self.put_u16(0)?; // flags0
        self.put_u16(0)?; // flags1
        self.put_u8(transform)
    }

    pub fn write_dqt(&mut self, slot: u8, table: &QuantTable) -> Result<(), JpegError> {
        self.write_marker(Marker::DQT)?;
        self.put_u16(2 + 1 + 64)?;
        self.put_u8(slot & 0x0F)?;
        for &natural_idx in &crate::tables::ZIGZAG_TO_NATURAL {
            self.put_u8(table.values[natural_idx] as u8)?;
        }
        Ok(())
    }

    pub fn write_dht(&mut self, class: u8, slot: u8, spec: &HuffmanSpec) -> Result<(), JpegError> {
        self.write_marker(Marker::DHT)?;
        let len = 2 + 1 + 16 + spec.huffval.len();
        self.put_u16(len as u16)?;
        self.put_u8(((class & 0x0F) << 4) | (slot & 0x0F))?;
        self.put_bytes(&spec.bits)?;
        self.put_bytes(&spec.huffval)
    }

    pub fn write_dri(&mut self, restart_interval: u16) -> Result<(), JpegError> {
        self.write_marker(Marker::DRI)?;
        self.put_u16(4)?;
        self.put_u16(restart_interval)
    }

    pub fn write_sof0(
        &mut self,
        width: u16,
        height: u16,
        components: &[ComponentInfo],
    ) -> Result<(), JpegError> {
        self.write_marker(Marker::SOF(0))?;
        self.put_u16((8 + 3 * components.len()) as u16)?;
        self.put_u8(8)?; // precision
        self.put_u16(height)?;
        self.put_u16(width)?;
        self.put_u8(components.len() as u8)?;
        for c in components {
            self.put_u8(c.id)?;
            self.put_u8((c.h_samp << 4) | c.v_samp)?;
            self.put_u8(c.quant_table_slot)?;
        }
        Ok(())
    }

    pub fn write_sos(&mut self, components: &[ComponentInfo]) -> Result<(), JpegError> {
        self.write_marker(Marker::SOS)?;
        self.put_u16((6 + 2 * components.len()) as u16)?;
        self.put_u8(components.len() as u8)?;
        for c in components {
            self.put_u8(c.id)?;
            self.put_u8((c.dc_table_slot << 4) | c.ac_table_slot)?;
        }
        self.put_u8(0)?; // spectral selection start
        self.put_u8(63)?; // spectral selection end
        self.put_u8(0) // successive approximation
    }

    pub fn write_rst(&mut self, n: u8) -> Result<(), JpegError> {
        self.write_marker(Marker::RST(n & 0x07))
    }

    /// Hand off the remaining free space to a [`BitWriter`] for entropy
    /// coding, returning how many bytes it consumed once dropped.
    pub fn remaining_mut(&mut self) -> &mut [u8] {
        &mut self.out[self.pos..]
    }

    pub fn advance(&mut self, n: usize) {
        self.pos += n;
    }
}
