//! 32-bit FNV-1a style word hash used to tag compressed sections
//!
//! The digest folds the input one little-endian 32-bit word at a time:
//! `hash = (hash ^ word) * 16777619`, starting from `2166136261`.
//!
//! A trailing remainder of 1-3 bytes that does not fill a whole word is
//! never folded in, so `b"abcd"` and `b"abcdXYZ"` hash identically. Stored
//! archive hashes depend on this behavior. The hash is a corruption signal
//! only, not a tamper-proof checksum.

/// FNV offset basis
const FNV_OFFSET: u32 = 2_166_136_261;

/// FNV 32-bit prime
const FNV_PRIME: u32 = 16_777_619;

const WORD: usize = 4;

/// Hash a whole buffer in one call
pub fn fnv_hash(data: &[u8]) -> u32 {
    let mut hasher = FnvHasher::new();
    hasher.update(data);
    hasher.finish()
}

/// Incremental form of [`fnv_hash`]
///
/// Feeding the input in any split produces the same digest as hashing it
/// in one piece.
#[derive(Debug, Clone)]
pub struct FnvHasher {
    state: u32,
    pending: [u8; WORD],
    pending_len: usize,
}

impl Default for FnvHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl FnvHasher {
    pub fn new() -> Self {
        Self {
            state: FNV_OFFSET,
            pending: [0; WORD],
            pending_len: 0,
        }
    }

    pub fn update(&mut self, mut data: &[u8]) {
        // Complete a word left over from the previous call first
        if self.pending_len > 0 {
            let take = (WORD - self.pending_len).min(data.len());
            self.pending[self.pending_len..self.pending_len + take].copy_from_slice(&data[..take]);
            self.pending_len += take;
            data = &data[take..];

            if self.pending_len < WORD {
                return;
            }
            let word = u32::from_le_bytes(self.pending);
            self.fold(word);
            self.pending_len = 0;
        }

        let mut words = data.chunks_exact(WORD);
        for chunk in &mut words {
            let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            self.fold(word);
        }

        let rest = words.remainder();
        self.pending[..rest.len()].copy_from_slice(rest);
        self.pending_len = rest.len();
    }

    /// Final digest; any incomplete trailing word is discarded
    pub fn finish(&self) -> u32 {
        self.state
    }

    fn fold(&mut self, word: u32) {
        self.state = (self.state ^ word).wrapping_mul(FNV_PRIME);
    }
}
