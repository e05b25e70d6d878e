pub mod adler32;
pub mod bits;
pub mod huffman;
pub mod inflate;
pub mod unpack;
pub mod window;


/// Error types for px operations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PxError {
    /// The compressed stream ended before the decoder reached the checksum.
    TruncatedBitstream,
    /// The stream header declares a compression method other than 8.
    StreamMethod {
        /// The declared method nibble.
        method: u8,
    },
    /// The stream header declares a window exponent outside `0 ... 7`.
    StreamWindowSize {
        /// The declared window exponent.
        exponent: u8,
    },
    /// The stream header fails its check-bits test.
    StreamHeaderCheckBits,
    /// The stream header requests a preset dictionary.
    StreamDictionary,
    /// The stream checksum does not match the decompressed output.
    StreamChecksum {
        /// The checksum declared in the stream trailer.
        declared: u32,
        /// The checksum computed over the decompressed output.
        computed: u32,
    },
    /// A block header declares the reserved block type.
    BlockType,
    /// A stored block's length field is not the complement of its check field.
    BlockElementCountParity {
        /// The declared byte count.
        length: u16,
        /// The declared complement.
        complement: u16,
    },
    /// A dynamic block declares an out-of-range run-literal symbol count.
    RunLiteralSymbolCount {
        /// The declared symbol count.
        count: u16,
    },
    /// The code length huffman table in a dynamic block is malformed.
    CodelengthHuffmanTable,
    /// The code length sequence in a dynamic block repeats with no previous
    /// length, or overruns the declared symbol counts.
    CodelengthSequence,
    /// The run-literal or distance huffman table in a dynamic block is
    /// malformed.
    HuffmanTable,
    /// A string reference points past the available output window.
    StringReference {
        /// The referenced distance.
        distance: usize,
        /// The number of window bytes available.
        available: usize,
    },
    /// A palette index points past the end of the palette.
    PaletteReference {
        /// The referenced index.
        index: u8,
        /// The number of palette entries.
        count: usize,
    },
    /// The requested operation is not supported.
    Unsupported,
}

impl std::fmt::Display for PxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TruncatedBitstream => write!(f, "unexpected end of compressed stream"),
            Self::StreamMethod { method } => {
                write!(f, "invalid stream compression method ({})", method)
            }
            Self::StreamWindowSize { exponent } => {
                write!(f, "invalid stream window exponent ({})", exponent)
            }
            Self::StreamHeaderCheckBits => write!(f, "stream header failed check bits"),
            Self::StreamDictionary => write!(f, "stream requires a preset dictionary"),
            Self::StreamChecksum { declared, computed } => write!(
                f,
                "stream checksum mismatch (declared {:08x}, computed {:08x})",
                declared, computed
            ),
            Self::BlockType => write!(f, "invalid block type"),
            Self::BlockElementCountParity { length, complement } => write!(
                f,
                "stored block length fields do not match ({:04x}, {:04x})",
                length, complement
            ),
            Self::RunLiteralSymbolCount { count } => {
                write!(f, "invalid run-literal symbol count ({})", count)
            }
            Self::CodelengthHuffmanTable => write!(f, "malformed code length huffman table"),
            Self::CodelengthSequence => write!(f, "invalid code length sequence"),
            Self::HuffmanTable => write!(f, "malformed huffman table"),
            Self::StringReference {
                distance,
                available,
            } => write!(
                f,
                "string reference distance {} exceeds window ({} bytes available)",
                distance, available
            ),
            Self::PaletteReference { index, count } => write!(
                f,
                "palette index {} exceeds palette length ({} entries)",
                index, count
            ),
            Self::Unsupported => write!(f, "unsupported operation"),
        }
    }
}

impl std::error::Error for PxError {}

pub type PxResult<T> = Result<T, PxError>;
