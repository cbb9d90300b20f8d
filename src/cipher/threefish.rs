//! Threefish-512 in a per-block-tweak mode.
//!
//! Standard Threefish-512 rounds and key schedule, driven by a message-level
//! tweak schedule: an 8-byte seed (carried in the message header) seeds a
//! PCG32 generator, and after every 64-byte block the next four generator
//! outputs are folded into the tweak words of all 19 subkeys. Encrypting and
//! decrypting sides derive the same schedule from the same seed, so each
//! block of a message is enciphered under a distinct tweak.
//!
//! One [`Threefish512`] instance corresponds to one message; construct a
//! fresh one per message from the current body key and the header's tweak
//! seed.

use crate::bytes;

/// Cipher block size, in bytes.
pub const BLOCK_LEN: usize = 64;
/// Key size, in bytes.
pub const KEY_LEN: usize = 64;
/// Tweak seed size, in bytes.
pub const TWEAK_SEED_LEN: usize = 8;

const KEY_SCHEDULE_CONST: u64 = 0x1BD1_1BDA_A9FC_1A22;

const PCG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;

// Rotation constants per mix lane, cycling every eight rounds.
const ROTATION: [[u32; 4]; 8] = [
    [46, 36, 19, 37],
    [33, 27, 14, 42],
    [17, 49, 36, 39],
    [44, 9, 54, 56],
    [39, 30, 34, 24],
    [13, 50, 10, 17],
    [25, 29, 39, 43],
    [8, 35, 56, 22],
];

// Word permutation applied after every round, and its inverse.
const PERMUTATION: [usize; 8] = [2, 1, 4, 7, 6, 5, 0, 3];
const INVERSE_PERMUTATION: [usize; 8] = [6, 1, 0, 7, 2, 5, 4, 3];

/// Tweak generator: PCG32 seeded from the big-endian tweak seed.
///
/// Each draw uses the block number to derive its increment, so the stream
/// of tweaks is fixed by (seed, block number) alone.
struct Pcg32 {
    state: u64,
}

impl Pcg32 {
    fn new(seed: &[u8; TWEAK_SEED_LEN]) -> Self {
        Self {
            state: bytes::read_be64(seed),
        }
    }

    fn next(&mut self, increment: u32) -> u32 {
        let old_state = self.state;
        // Increments are forced odd.
        self.state = old_state
            .wrapping_mul(PCG_MULTIPLIER)
            .wrapping_add(u64::from(increment | 1));

        let xorshifted = (((old_state >> 18) ^ old_state) >> 27) as u32;
        let rot = (old_state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Tweak triple for `block_num` (0 seeds the first block's subkeys).
    fn next_tweaks(&mut self, block_num: u32) -> [u64; 3] {
        let increment = block_num.wrapping_mul(4);
        let r0 = self.next(increment);
        let r1 = self.next(increment + 1);
        let r2 = self.next(increment + 2);
        let r3 = self.next(increment + 3);

        let t0 = u64::from(r1) << 32 | u64::from(r0);
        let t1 = u64::from(r3) << 32 | u64::from(r2);
        [t0, t1, t0 ^ t1]
    }
}

/// Threefish-512 keyed for one message.
pub struct Threefish512 {
    subkeys: [[u64; 8]; 19],
    tweak_rng: Pcg32,
}

impl Threefish512 {
    /// Expand the key schedule with the first block's tweaks already folded
    /// in.
    #[must_use]
    pub fn new(key: &[u8; KEY_LEN], tweak_seed: &[u8; TWEAK_SEED_LEN]) -> Self {
        let mut tweak_rng = Pcg32::new(tweak_seed);
        let tweaks = tweak_rng.next_tweaks(0);

        let mut keys = [0u64; 9];
        keys[8] = KEY_SCHEDULE_CONST;
        for (i, chunk) in key.chunks_exact(8).enumerate() {
            keys[i] = u64::from_le_bytes(chunk.try_into().unwrap());
            keys[8] ^= keys[i];
        }

        let mut subkeys = [[0u64; 8]; 19];
        for (i, subkey) in subkeys.iter_mut().enumerate() {
            for (j, word) in subkey.iter_mut().enumerate() {
                *word = keys[(i + j) % 9];
            }
            subkey[5] = subkey[5].wrapping_add(tweaks[i % 3]);
            subkey[6] = subkey[6].wrapping_add(tweaks[(i + 1) % 3]);
            subkey[7] = subkey[7].wrapping_add(i as u64);
        }

        Self { subkeys, tweak_rng }
    }

    /// Encrypt `body` in place, one tweak generation per 64-byte block.
    ///
    /// `body.len()` must be a multiple of [`BLOCK_LEN`].
    pub fn encrypt(&mut self, body: &mut [u8]) {
        debug_assert_eq!(body.len() % BLOCK_LEN, 0);
        for (i, chunk) in body.chunks_exact_mut(BLOCK_LEN).enumerate() {
            let mut block = load_block(chunk);
            self.encrypt_block(&mut block);
            store_block(chunk, &block);
            self.advance_tweaks(i as u32 + 1);
        }
    }

    /// Decrypt `body` in place.
    ///
    /// `body.len()` must be a multiple of [`BLOCK_LEN`].
    pub fn decrypt(&mut self, body: &mut [u8]) {
        debug_assert_eq!(body.len() % BLOCK_LEN, 0);
        for (i, chunk) in body.chunks_exact_mut(BLOCK_LEN).enumerate() {
            let mut block = load_block(chunk);
            self.decrypt_block(&mut block);
            store_block(chunk, &block);
            self.advance_tweaks(i as u32 + 1);
        }
    }

    /// Fold the next block's tweak deltas into the subkey table.
    fn advance_tweaks(&mut self, block_num: u32) {
        let tweaks = self.tweak_rng.next_tweaks(block_num);
        for (i, subkey) in self.subkeys.iter_mut().enumerate() {
            subkey[5] = subkey[5].wrapping_add(tweaks[i % 3]);
            subkey[6] = subkey[6].wrapping_add(tweaks[(i + 1) % 3]);
        }
    }

    fn encrypt_block(&self, block: &mut [u64; 8]) {
        for round in 0..72 {
            if round % 4 == 0 {
                add_subkey(block, &self.subkeys[round / 4]);
            }

            let rotation = &ROTATION[round % 8];
            for lane in 0..4 {
                block[2 * lane] = block[2 * lane].wrapping_add(block[2 * lane + 1]);
                block[2 * lane + 1] =
                    block[2 * lane + 1].rotate_left(rotation[lane]) ^ block[2 * lane];
            }

            let mixed = *block;
            for (word, &source) in block.iter_mut().zip(&PERMUTATION) {
                *word = mixed[source];
            }
        }

        add_subkey(block, &self.subkeys[18]);
    }

    fn decrypt_block(&self, block: &mut [u64; 8]) {
        subtract_subkey(block, &self.subkeys[18]);

        for round in (0..72).rev() {
            let permuted = *block;
            for (word, &source) in block.iter_mut().zip(&INVERSE_PERMUTATION) {
                *word = permuted[source];
            }

            let rotation = &ROTATION[round % 8];
            for lane in 0..4 {
                block[2 * lane + 1] =
                    (block[2 * lane + 1] ^ block[2 * lane]).rotate_right(rotation[lane]);
                block[2 * lane] = block[2 * lane].wrapping_sub(block[2 * lane + 1]);
            }

            if round % 4 == 0 {
                subtract_subkey(block, &self.subkeys[round / 4]);
            }
        }
    }
}

fn load_block(chunk: &[u8]) -> [u64; 8] {
    let mut block = [0u64; 8];
    for (word, bytes) in block.iter_mut().zip(chunk.chunks_exact(8)) {
        *word = u64::from_le_bytes(bytes.try_into().unwrap());
    }
    block
}

fn store_block(chunk: &mut [u8], block: &[u64; 8]) {
    for (bytes, word) in chunk.chunks_exact_mut(8).zip(block) {
        bytes.copy_from_slice(&word.to_le_bytes());
    }
}

fn add_subkey(block: &mut [u64; 8], subkey: &[u64; 8]) {
    for (word, key) in block.iter_mut().zip(subkey) {
        *word = word.wrapping_add(*key);
    }
}

fn subtract_subkey(block: &mut [u64; 8], subkey: &[u64; 8]) {
    for (word, key) in block.iter_mut().zip(subkey) {
        *word = word.wrapping_sub(*key);
    }
}
