//! Message header: layout, parsing, padding rule, and the scramble.
//!
//! # Header format
//!
//! Plaintext layout, 32 octets, integer fields big-endian:
//!
//! ```text
//! [ version (1) ][ seq_num (3) ][ body_len (4) ]
//! [ body_key_num (2) ][ inner_salt (6) ]
//! [ tweak_seed (8) ]
//! [ body_checksum (8) ]
//! ```
//!
//! On the wire the header is first scrambled (a permutation of its 16
//! little-endian 16-bit words keyed by the header's own content) and then
//! XORed with 32 bytes of the session's header keystream. The scramble
//! swaps only even-indexed words with even targets and odd-indexed words
//! with odd targets, which keeps the XOR of the 32-bit words invariant, so
//! the receiving side can recompute the swap key from the scrambled bytes.

use crate::bytes;
use crate::traits::{Error, Result};

/// Wire size of a message header, in bytes.
pub const HEADER_LEN: usize = 32;

pub(crate) const VERSION: u8 = 0;

// Sequence numbers travel as 24-bit values.
pub(crate) const SEQ_NUM_MASK: u32 = 0x00FF_FFFF;

/// A parsed, validated message header.
#[derive(Clone, Debug)]
pub struct Header {
    pub seq_num: u32,
    pub body_len: u32,
    pub body_key_num: u16,
    pub(crate) inner_salt: [u8; 6],
    pub(crate) tweak_seed: [u8; 8],
    pub(crate) body_checksum: [u8; 8],
}

impl Header {
    /// Parse a decrypted, unscrambled header.
    pub(crate) fn parse(raw: &[u8; HEADER_LEN]) -> Result<Self> {
        if raw[0] != VERSION {
            return Err(Error::BadVersion);
        }

        Ok(Self {
            seq_num: bytes::read_be24(&raw[1..4]),
            body_len: bytes::read_be32(&raw[4..8]),
            body_key_num: bytes::read_be16(&raw[8..10]),
            inner_salt: raw[10..16].try_into().unwrap(),
            tweak_seed: raw[16..24].try_into().unwrap(),
            body_checksum: raw[24..32].try_into().unwrap(),
        })
    }

    /// Padded length of the body this header announces.
    #[must_use]
    pub fn body_len_padded(&self) -> usize {
        body_len_padded(self.body_len as usize)
    }
}

/// Padded body length: the smallest multiple of 64 that is at least
/// `body_len + 8`. An empty body still pads to 64 bytes.
#[must_use]
pub fn body_len_padded(body_len: usize) -> usize {
    (body_len + 8).div_ceil(64) * 64
}

pub(crate) fn scramble(header: &mut [u8; HEADER_LEN]) {
    let mut words = load_words(header);
    let swap_key = fold_words(&words);
    for i in 0..8 {
        swap_pair(&mut words, i, swap_key);
    }
    store_words(header, &words);
}

pub(crate) fn unscramble(header: &mut [u8; HEADER_LEN]) {
    let mut words = load_words(header);
    let swap_key = fold_words(&words);
    for i in (0..8).rev() {
        swap_pair(&mut words, i, swap_key);
    }
    store_words(header, &words);
}

/// Swap words `2i` and `2i + 1` with the targets named by nibble `i` of the
/// swap key. The nibble and its complement give one even and one odd
/// target; a self-swap is redirected to the opposite half.
fn swap_pair(words: &mut [u16; 16], i: usize, swap_key: u32) {
    let nibble = ((swap_key >> (4 * i)) & 0xF) as usize;
    let (mut even, mut odd) = if nibble % 2 == 1 {
        (!nibble & 0xF, nibble)
    } else {
        (nibble, !nibble & 0xF)
    };

    let j = 2 * i;
    if j == even {
        even = (even + 8) % 16;
    }
    words.swap(j, even);

    let j = j + 1;
    if j == odd {
        odd = (odd + 8) % 16;
    }
    words.swap(j, odd);
}

/// XOR of the header's eight 32-bit words; invariant under the swaps.
fn fold_words(words: &[u16; 16]) -> u32 {
    let mut folded = 0;
    for pair in words.chunks_exact(2) {
        folded ^= u32::from(pair[1]) << 16 | u32::from(pair[0]);
    }
    folded
}

fn load_words(header: &[u8; HEADER_LEN]) -> [u16; 16] {
    let mut words = [0u16; 16];
    for (word, chunk) in words.iter_mut().zip(header.chunks_exact(2)) {
        *word = u16::from_le_bytes(chunk.try_into().unwrap());
    }
    words
}

fn store_words(header: &mut [u8; HEADER_LEN], words: &[u16; 16]) {
    for (chunk, word) in header.chunks_exact_mut(2).zip(words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}
