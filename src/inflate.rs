/// RFC 1950 + RFC 1951 streaming decompression (zlib-wrapped DEFLATE).
///
/// The decoder is an explicit state machine that suspends and resumes at
/// whole-token boundaries: [`Inflator::push`] ingests compressed bytes and
/// advances as far as the input allows, [`Inflator::pull`] drains
/// decompressed bytes from the sliding window. A partial header, code, or
/// back-reference never consumes input; the read is retried when more bytes
/// arrive.
///
/// Supports all three block types:
/// - Type 0: Stored (no compression)
/// - Type 1: Fixed Huffman codes
/// - Type 2: Dynamic Huffman codes
use crate::bits::{self, BitBuffer};
use crate::huffman::{HuffmanDecoder, HuffmanTable};
use crate::window::Window;
use crate::{PxError, PxResult};

// ---------------------------------------------------------------------------
// DEFLATE alphabets (RFC 1951)
// ---------------------------------------------------------------------------

/// Order of code length alphabet codes (RFC 1951 section 3.2.7).
static CODELEN_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// (extra bits, base length) per run symbol 0..=28, padded with two zero
/// decades for the reserved fixed-tree codes 286 and 287. A reserved code
/// composes a zero-length run, emits nothing, and the corrupt stream is
/// rejected at the checksum.
static RUN_DECADES: [(u16, u16); 31] = [
    (0, 3),
    (0, 4),
    (0, 5),
    (0, 6),
    (0, 7),
    (0, 8),
    (0, 9),
    (0, 10),
    (1, 11),
    (1, 13),
    (1, 15),
    (1, 17),
    (2, 19),
    (2, 23),
    (2, 27),
    (2, 31),
    (3, 35),
    (3, 43),
    (3, 51),
    (3, 59),
    (4, 67),
    (4, 83),
    (4, 99),
    (4, 115),
    (5, 131),
    (5, 163),
    (5, 195),
    (5, 227),
    (0, 258),
    (0, 0),
    (0, 0),
];

/// (extra bits, base distance) per distance symbol 0..=29, padded with two
/// poisoned decades for symbols 30 and 31. The padding base exceeds every
/// legal window, so invoking a padded symbol always fails the string
/// reference check.
static DISTANCE_DECADES: [(u16, u16); 32] = [
    (0, 1),
    (0, 2),
    (0, 3),
    (0, 4),
    (1, 5),
    (1, 7),
    (2, 9),
    (2, 13),
    (3, 17),
    (3, 25),
    (4, 33),
    (4, 49),
    (5, 65),
    (5, 97),
    (6, 129),
    (6, 193),
    (7, 257),
    (7, 385),
    (8, 513),
    (8, 769),
    (9, 1025),
    (9, 1537),
    (10, 2049),
    (10, 3073),
    (11, 4097),
    (11, 6145),
    (12, 8193),
    (12, 12289),
    (13, 16385),
    (13, 24577),
    (0, 32769),
    (0, 32769),
];

/// Distance symbol substituted into an all-zero distance table. Decoding it
/// resolves to a poisoned decade, so the error surfaces only if the stream
/// actually uses a string reference.
const DEGENERATE_DISTANCE: u16 = 31;

// ---------------------------------------------------------------------------
// Fixed Huffman tables (RFC 1951 section 3.2.6)
// ---------------------------------------------------------------------------

fn fixed_decoders() -> PxResult<(HuffmanDecoder, HuffmanDecoder)> {
    let mut lengths = [0u8; 288];
    lengths[..144].fill(8);
    lengths[144..256].fill(9);
    lengths[256..280].fill(7);
    lengths[280..].fill(8);
    let runliteral = HuffmanTable::validate(&lengths).ok_or(PxError::HuffmanTable)?;
    let distance = HuffmanTable::validate(&[5u8; 32]).ok_or(PxError::HuffmanTable)?;
    Ok((runliteral.decoder(), distance.decoder()))
}

// ---------------------------------------------------------------------------
// Inflator state machine
// ---------------------------------------------------------------------------

/// Result of a [`Inflator::push`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The stream checksum has been verified; the stream is complete.
    Done,
    /// The decoder consumed what it could and needs more input.
    NeedsMore,
}

#[derive(Debug)]
enum State {
    StreamStart,
    BlockStart,
    BlockTables {
        last: bool,
        decoder: HuffmanDecoder,
        literals: usize,
        distances: usize,
    },
    BlockUncompressed {
        last: bool,
        end: usize,
    },
    BlockCompressed {
        last: bool,
        runliteral: HuffmanDecoder,
        distance: HuffmanDecoder,
    },
    StreamChecksum,
    StreamEnd,
}

enum Flow {
    Advanced,
    Blocked,
    Finished,
}

/// Streaming zlib decompressor.
#[derive(Debug)]
pub struct Inflator {
    /// Read cursor, in bits from the start of the input buffer.
    b: usize,
    input: BitBuffer,
    /// Code lengths accumulated while recovering a dynamic table.
    lengths: Vec<u8>,
    state: State,
    output: Window,
}

impl Default for Inflator {
    fn default() -> Self {
        Self {
            b: 0,
            input: BitBuffer::new(),
            lengths: Vec::new(),
            state: State::StreamStart,
            output: Window::new(),
        }
    }
}

impl Inflator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed compressed bytes and advance as far as possible.
    pub fn push(&mut self, data: &[u8]) -> PxResult<Status> {
        self.input.rebase(data, &mut self.b);
        loop {
            match self.advance()? {
                Flow::Advanced => {}
                Flow::Blocked => return Ok(Status::NeedsMore),
                Flow::Finished => return Ok(Status::Done),
            }
        }
    }

    /// Take exactly `count` decompressed bytes, if that many are ready.
    pub fn pull(&mut self, count: usize) -> Option<Vec<u8>> {
        self.output.release(count)
    }

    /// Number of decompressed bytes produced but not yet pulled.
    pub fn retained(&self) -> usize {
        self.output.retained()
    }

    fn advance(&mut self) -> PxResult<Flow> {
        match std::mem::replace(&mut self.state, State::StreamEnd) {
            State::StreamStart => self.stream_start(),
            State::BlockStart => self.block_start(),
            State::BlockTables {
                last,
                decoder,
                literals,
                distances,
            } => self.block_tables(last, decoder, literals, distances),
            State::BlockUncompressed { last, end } => self.block_uncompressed(last, end),
            State::BlockCompressed {
                last,
                runliteral,
                distance,
            } => self.block_compressed(last, runliteral, distance),
            State::StreamChecksum => self.stream_checksum(),
            State::StreamEnd => Ok(Flow::Finished),
        }
    }

    fn stream_start(&mut self) -> PxResult<Flow> {
        if self.b + 16 > self.input.count() {
            self.state = State::StreamStart;
            return Ok(Flow::Blocked);
        }
        let header = self.input.get(self.b, 16);
        let method = (header & 0xf) as u8;
        if method != 8 {
            return Err(PxError::StreamMethod { method });
        }
        let exponent = (header >> 4 & 0xf) as u8;
        if exponent >= 8 {
            return Err(PxError::StreamWindowSize { exponent });
        }
        let flags = header >> 8;
        // the header bytes, read big-endian, must be divisible by 31
        if ((header & 0xff) as u32 * 256 + flags as u32) % 31 != 0 {
            return Err(PxError::StreamHeaderCheckBits);
        }
        if flags & 0x20 != 0 {
            return Err(PxError::StreamDictionary);
        }
        self.output.set_window(1 << (8 + exponent));
        self.b += 16;
        self.state = State::BlockStart;
        Ok(Flow::Advanced)
    }

    fn block_start(&mut self) -> PxResult<Flow> {
        if self.b + 3 > self.input.count() {
            self.state = State::BlockStart;
            return Ok(Flow::Blocked);
        }
        let header = self.input.get(self.b, 3);
        let last = header & 1 != 0;
        match header >> 1 {
            0 => {
                let boundary = (self.b + 3 + 7) & !7;
                if boundary + 32 > self.input.count() {
                    self.state = State::BlockStart;
                    return Ok(Flow::Blocked);
                }
                let length = self.input.get(boundary, 16);
                let complement = self.input.get(boundary + 16, 16);
                if length != !complement {
                    return Err(PxError::BlockElementCountParity { length, complement });
                }
                self.b = boundary + 32;
                self.state = State::BlockUncompressed {
                    last,
                    end: self.output.end() + length as usize,
                };
            }
            1 => {
                let (runliteral, distance) = fixed_decoders()?;
                self.b += 3;
                self.state = State::BlockCompressed {
                    last,
                    runliteral,
                    distance,
                };
            }
            2 => {
                if self.b + 17 > self.input.count() {
                    self.state = State::BlockStart;
                    return Ok(Flow::Blocked);
                }
                let literals = 257 + self.input.get(self.b + 3, 5) as usize;
                let distances = 1 + self.input.get(self.b + 8, 5) as usize;
                let codelengths = 4 + self.input.get(self.b + 13, 4) as usize;
                if literals > 286 {
                    return Err(PxError::RunLiteralSymbolCount {
                        count: literals as u16,
                    });
                }
                if self.b + 17 + 3 * codelengths > self.input.count() {
                    self.state = State::BlockStart;
                    return Ok(Flow::Blocked);
                }
                let mut lengths = [0u8; 19];
                for (i, &symbol) in CODELEN_ORDER.iter().take(codelengths).enumerate() {
                    lengths[symbol] = self.input.get(self.b + 17 + 3 * i, 3) as u8;
                }
                let table =
                    HuffmanTable::validate(&lengths).ok_or(PxError::CodelengthHuffmanTable)?;
                self.b += 17 + 3 * codelengths;
                self.lengths.clear();
                self.state = State::BlockTables {
                    last,
                    decoder: table.decoder(),
                    literals,
                    distances,
                };
            }
            _ => return Err(PxError::BlockType),
        }
        Ok(Flow::Advanced)
    }

    fn block_tables(
        &mut self,
        last: bool,
        decoder: HuffmanDecoder,
        literals: usize,
        distances: usize,
    ) -> PxResult<Flow> {
        let total = literals + distances;
        while self.lengths.len() < total {
            if self.b >= self.input.count() {
                self.state = State::BlockTables {
                    last,
                    decoder,
                    literals,
                    distances,
                };
                return Ok(Flow::Blocked);
            }
            let entry = decoder.decode(bits::reverse(self.input.atom(self.b)));
            let length = entry.length as usize;
            let (extra, base) = match entry.symbol {
                0..=15 => {
                    if self.b + length > self.input.count() {
                        self.state = State::BlockTables {
                            last,
                            decoder,
                            literals,
                            distances,
                        };
                        return Ok(Flow::Blocked);
                    }
                    self.b += length;
                    self.lengths.push(entry.symbol as u8);
                    continue;
                }
                16 => (2, 3),
                17 => (3, 3),
                _ => (7, 11),
            };
            if self.b + length + extra > self.input.count() {
                self.state = State::BlockTables {
                    last,
                    decoder,
                    literals,
                    distances,
                };
                return Ok(Flow::Blocked);
            }
            let value = match entry.symbol {
                16 => match self.lengths.last() {
                    Some(&previous) => previous,
                    None => return Err(PxError::CodelengthSequence),
                },
                _ => 0,
            };
            let repeat = base + self.input.get(self.b + length, extra) as usize;
            if self.lengths.len() + repeat > total {
                return Err(PxError::CodelengthSequence);
            }
            self.b += length + extra;
            self.lengths.resize(self.lengths.len() + repeat, value);
        }

        let runliteral =
            HuffmanTable::validate(&self.lengths[..literals]).ok_or(PxError::HuffmanTable)?;
        let distance = HuffmanTable::with_default(&self.lengths[literals..], DEGENERATE_DISTANCE)
            .ok_or(PxError::HuffmanTable)?;
        self.state = State::BlockCompressed {
            last,
            runliteral: runliteral.decoder(),
            distance: distance.decoder(),
        };
        Ok(Flow::Advanced)
    }

    fn block_compressed(
        &mut self,
        last: bool,
        runliteral: HuffmanDecoder,
        distance: HuffmanDecoder,
    ) -> PxResult<Flow> {
        loop {
            if self.b >= self.input.count() {
                self.state = State::BlockCompressed {
                    last,
                    runliteral,
                    distance,
                };
                return Ok(Flow::Blocked);
            }
            // a whole token fits in 48 bits: 15-bit run code, 5 extra bits,
            // 15-bit distance code, 13 extra bits
            let word = self.input.word48(self.b);
            let entry = runliteral.decode(bits::reverse(word as u16));
            let mut consumed = entry.length as usize;
            match entry.symbol {
                symbol @ 0..=255 => {
                    if self.b + consumed > self.input.count() {
                        self.state = State::BlockCompressed {
                            last,
                            runliteral,
                            distance,
                        };
                        return Ok(Flow::Blocked);
                    }
                    self.b += consumed;
                    self.output.append(symbol as u8);
                }
                256 => {
                    if self.b + consumed > self.input.count() {
                        self.state = State::BlockCompressed {
                            last,
                            runliteral,
                            distance,
                        };
                        return Ok(Flow::Blocked);
                    }
                    self.b += consumed;
                    self.state = if last {
                        State::StreamChecksum
                    } else {
                        State::BlockStart
                    };
                    return Ok(Flow::Advanced);
                }
                symbol => {
                    let (extra, base) = RUN_DECADES[(symbol - 257) as usize];
                    let count = base as usize
                        + ((word >> consumed) & ((1u64 << extra) - 1)) as usize;
                    consumed += extra as usize;

                    let entry = distance.decode(bits::reverse((word >> consumed) as u16));
                    consumed += entry.length as usize;
                    let (extra, base) = DISTANCE_DECADES[entry.symbol as usize];
                    let offset = base as usize
                        + ((word >> consumed) & ((1u64 << extra) - 1)) as usize;
                    consumed += extra as usize;

                    if self.b + consumed > self.input.count() {
                        self.state = State::BlockCompressed {
                            last,
                            runliteral,
                            distance,
                        };
                        return Ok(Flow::Blocked);
                    }
                    if offset > self.output.available() {
                        return Err(PxError::StringReference {
                            distance: offset,
                            available: self.output.available(),
                        });
                    }
                    self.b += consumed;
                    self.output.expand(offset, count);
                }
            }
        }
    }

    fn block_uncompressed(&mut self, last: bool, end: usize) -> PxResult<Flow> {
        while self.output.end() < end {
            if self.b + 8 > self.input.count() {
                self.state = State::BlockUncompressed { last, end };
                return Ok(Flow::Blocked);
            }
            self.output.append(self.input.get(self.b, 8) as u8);
            self.b += 8;
        }
        self.state = if last {
            State::StreamChecksum
        } else {
            State::BlockStart
        };
        Ok(Flow::Advanced)
    }

    fn stream_checksum(&mut self) -> PxResult<Flow> {
        let boundary = (self.b + 7) & !7;
        if boundary + 32 > self.input.count() {
            self.state = State::StreamChecksum;
            return Ok(Flow::Blocked);
        }
        let mut declared: u32 = 0;
        for i in 0..4 {
            declared = declared << 8 | self.input.get(boundary + 8 * i, 8) as u32;
        }
        let computed = self.output.checksum();
        if declared != computed {
            return Err(PxError::StreamChecksum { declared, computed });
        }
        self.b = boundary + 32;
        self.state = State::StreamEnd;
        Ok(Flow::Finished)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Decompress a complete zlib stream held in memory.
pub fn inflate(data: &[u8]) -> PxResult<Vec<u8>> {
    let mut inflator = Inflator::new();
    match inflator.push(data)? {
        Status::Done => {}
        Status::NeedsMore => return Err(PxError::TruncatedBitstream),
    }
    let count = inflator.retained();
    Ok(inflator.pull(count).unwrap_or_default())
}
