//! JPEG marker codes as a tagged enum.
//!
//! The teacher represents markers as an enum matched exhaustively rather than
//! raw `u16` constants (see design note in SPEC_FULL.md §9); we keep that
//! shape here for both the reader and the writer.

/// A JPEG marker. `from_u8` takes the byte that follows the `0xFF` marker
/// prefix.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
#[allow(clippy::upper_case_acronyms)]
pub enum Marker {
    /// Start of image, FFD8.
    SOI,
    /// End of image, FFD9.
    EOI,
    /// Start of frame, baseline DCT / extended / progressive / lossless,
    /// carrying the raw SOFn discriminant (0..=15, excluding DHP/JPG).
    SOF(u8),
    /// Define Huffman Table, FFC4.
    DHT,
    /// Define Arithmetic Conditioning, FFCC (unsupported, rejected).
    DAC,
    /// Restart marker 0..=7, FFD0..FFD7.
    RST(u8),
    /// Application-specific segment 0..=15, FFE0..FFEF.
    APP(u8),
    /// Comment, FFFE.
    COM,
    /// Define Quantization Table, FFDB.
    DQT,
    /// Define Restart Interval, FFDD.
    DRI,
    /// Start of Scan, FFDA.
    SOS,
    /// Define Number of Lines, FFDC.
    DNL,
    /// Any other reserved/unused marker code we tolerate but skip.
    Other(u8),
}

impl Marker {
    /// Parse the byte following `0xFF`. Returns `None` for stuffed/fill bytes
    /// (`0x00`, `0xFF`) which are not markers at all.
    #[must_use]
    pub fn from_u8(byte: u8) -> Option<Marker> {
        match byte {
            0x00 | 0xFF => None,
            0xD8 => Some(Marker::SOI),
            0xD9 => Some(Marker::EOI),
            0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => {
                Some(Marker::SOF(byte - 0xC0))
            }
            0xC4 => Some(Marker::DHT),
            0xCC => Some(Marker::DAC),
            0xD0..=0xD7 => Some(Marker::RST(byte - 0xD0)),
            0xE0..=0xEF => Some(Marker::APP(byte - 0xE0)),
            0xFE => Some(Marker::COM),
            0xDB => Some(Marker::DQT),
            0xDD => Some(Marker::DRI),
            0xDA => Some(Marker::SOS),
            0xDC => Some(Marker::DNL),
            other => Some(Marker::Other(other)),
        }
    }

    /// The raw marker byte (following `0xFF`) this variant encodes to.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Marker::SOI => 0xD8,
            Marker::EOI => 0xD9,
            Marker::SOF(n) => 0xC0 + n,
            Marker::DHT => 0xC4,
            Marker::DAC => 0xCC,
            Marker::RST(n) => 0xD0 + n,
            Marker::APP(n) => 0xE0 + n,
            Marker::COM => 0xFE,
            Marker::DQT => 0xDB,
            Marker::DRI => 0xDD,
            Marker::SOS => 0xDA,
            Marker::DNL => 0xDC,
            Marker::Other(b) => b,
        }
    }

    /// Markers that carry no length field and no payload at all.
    #[must_use]
    pub fn is_standalone(self) -> bool {
        matches!(self, Marker::SOI | Marker::EOI | Marker::RST(_))
    }

    /// `true` for any code a JPEG stream can legally carry (`0xC0..=0xFE`).
    /// Bytes below that range are entropy-coded data or noise that happened
    /// to follow a stray `0xFF`, not a real marker, even though `from_u8`
    /// tags them `Other` rather than rejecting them outright.
    #[must_use]
    pub fn is_plausible(self) -> bool {
        !matches!(self, Marker::Other(b) if b < 0xC0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_u8() {
        let markers = [
            Marker::SOI,
            Marker::EOI,
            Marker::SOF(0),
            Marker::DHT,
            Marker::RST(3),
            Marker::APP(14),
            Marker::COM,
            Marker::DQT,
            Marker::DRI,
            Marker::SOS,
        ];
        for m in markers {
            assert_eq!(Marker::from_u8(m.as_u8()), Some(m));
        }
    }

    #[test]
    fn stuffed_and_fill_bytes_are_not_markers() {
        assert_eq!(Marker::from_u8(0x00), None);
        assert_eq!(Marker::from_u8(0xFF), None);
    }
}
