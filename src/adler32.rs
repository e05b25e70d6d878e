/// Adler-32 checksum (RFC 1950).
///
/// Maintains the two running sums in 32-bit registers and defers the
/// `% 65521` reduction to 5552-byte block boundaries, the largest block
/// size for which the double sum cannot overflow.
const BASE: u32 = 65521;

/// Largest `n` such that `255 * n * (n + 1) / 2 + (n + 1) * (BASE - 1)`
/// stays below `2^32`.
const BLOCK: usize = 5552;

/// Compute the Adler-32 checksum of a byte slice.
pub fn adler32(data: &[u8]) -> u32 {
    let mut state = Adler32::new();
    state.update(data);
    state.checksum()
}

/// Incremental Adler-32 state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adler32 {
    single: u32,
    double: u32,
}

impl Default for Adler32 {
    fn default() -> Self {
        Self {
            single: 1,
            double: 0,
        }
    }
}

impl Adler32 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        for block in data.chunks(BLOCK) {
            for &byte in block {
                self.single += byte as u32;
                self.double += self.single;
            }
            self.single %= BASE;
            self.double %= BASE;
        }
    }

    pub fn checksum(&self) -> u32 {
        self.double << 16 | self.single
    }
}
