//! Typed failures for the codec.
//!
//! Every anomaly the encoder or decoder can encounter is represented here.
//! None of them unwind: the pipeline always has a `Result` to return instead,
//! following the teacher's manual `Debug`/`Display` style rather than pulling
//! in `thiserror`.
use core::fmt;
use core::fmt::{Debug, Display, Formatter};

/// Kinds of unsupported bitstream features this core deliberately does not
/// implement (progressive, arithmetic, lossless, ...).
#[derive(Eq, PartialEq, Copy, Clone)]
pub enum UnsupportedFeature {
    /// SOF2 progressive DCT, Huffman coding.
    ProgressiveDctHuffman,
    /// SOF9 extended sequential DCT, arithmetic coding.
    ExtendedSequentialDctArithmetic,
    /// SOF10 progressive DCT, arithmetic coding.
    ProgressiveDctArithmetic,
    /// SOF3 / SOF11 lossless modes.
    Lossless,
    /// SOF1 extended sequential Huffman (12/16 bit precision).
    ExtendedSequentialHuffman,
    /// Any data precision other than 8 bits/sample.
    NonBaselinePrecision(u8),
    /// Fractional (non-integral-ratio) chroma subsampling.
    FractionalSampling,
    /// DQT precision other than 8 bits.
    NonBaselineQuantPrecision,
}

impl Debug for UnsupportedFeature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProgressiveDctHuffman => {
                write!(f, "progressive DCT with Huffman coding is not supported")
            }
            Self::ExtendedSequentialDctArithmetic => {
                write!(f, "extended sequential DCT with arithmetic coding is not supported")
            }
            Self::ProgressiveDctArithmetic => {
                write!(f, "progressive DCT with arithmetic coding is not supported")
            }
            Self::Lossless => write!(f, "lossless JPEG is not supported"),
            Self::ExtendedSequentialHuffman => {
                write!(f, "extended sequential Huffman (non-baseline precision) is not supported")
            }
            Self::NonBaselinePrecision(bits) => {
                write!(f, "data precision of {bits} bits is not supported, only 8")
            }
            Self::FractionalSampling => {
                write!(f, "fractional (non-integral) chroma subsampling is not supported")
            }
            Self::NonBaselineQuantPrecision => {
                write!(f, "16-bit quantization table precision is not supported")
            }
        }
    }
}

/// A single typed failure. All variants are recoverable: nothing in this
/// crate calls `panic!`/`abort` on attacker- or corruption-controlled input.
pub enum JpegError {
    /// A precondition that only a caller's own misuse of the API can violate
    /// (e.g. calling `write_scanlines` before `start_compress`). Distinct from
    /// data-dependent failures because it can never be triggered by the
    /// bitstream itself.
    InvariantViolated(&'static str),
    /// A bitstream feature recognized but deliberately not implemented.
    Unsupported(UnsupportedFeature),
    /// The marker stream does not parse as a well-formed JPEG at all:
    /// missing/duplicate SOI, bad marker length, bad component ids, and so on.
    StructuralCorruption(&'static str),
    /// The marker structure is fine but the entropy-coded payload is
    /// corrupted: bad Huffman codes, restart mismatches, premature end of
    /// segment. Recovered from in place; surfaced so the caller can log it.
    DataCorruption(&'static str),
    /// The arena or output buffer was too small for the image being
    /// processed.
    ResourceExhaustion(&'static str),
}

impl Debug for JpegError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvariantViolated(msg) => write!(f, "invariant violated: {msg}"),
            Self::Unsupported(feature) => write!(f, "unsupported: {feature:?}"),
            Self::StructuralCorruption(msg) => write!(f, "structural corruption: {msg}"),
            Self::DataCorruption(msg) => write!(f, "data corruption: {msg}"),
            Self::ResourceExhaustion(msg) => write!(f, "resource exhaustion: {msg}"),
        }
    }
}

impl Display for JpegError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl std::error::Error for JpegError {}

pub type JpegResult<T> = Result<T, JpegError>;
