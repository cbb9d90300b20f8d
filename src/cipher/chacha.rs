//! ChaCha-based keystream generators.
//!
//! Two flavors back the transport:
//!
//! - [`ChaCha8Rng`], an 8-round stream consumed byte-wise. It is the
//!   sender's auxiliary randomness source (inner salt, body padding, tweak
//!   seed, and the demo handshake nonce).
//! - [`HeaderKeystream`], a 20-round stream consumed in 32-byte halves, one
//!   half per message header.
//!
//! Both read key and nonce words little-endian and start their block
//! counter at zero.

// "expand 32-byte k", little-endian.
const CONSTANTS: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

#[inline]
fn quarter_round(state: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    state[a] = state[a].wrapping_add(state[b]);
    state[d] = (state[d] ^ state[a]).rotate_left(16);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_left(12);

    state[a] = state[a].wrapping_add(state[b]);
    state[d] = (state[d] ^ state[a]).rotate_left(8);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_left(7);
}

/// Run the block function and serialize the result little-endian.
fn keystream_block(initial: &[u32; 16], double_rounds: usize) -> [u8; 64] {
    let mut working = *initial;

    for _ in 0..double_rounds {
        // Column rounds.
        quarter_round(&mut working, 0, 4, 8, 12);
        quarter_round(&mut working, 1, 5, 9, 13);
        quarter_round(&mut working, 2, 6, 10, 14);
        quarter_round(&mut working, 3, 7, 11, 15);
        // Diagonal rounds.
        quarter_round(&mut working, 0, 5, 10, 15);
        quarter_round(&mut working, 1, 6, 11, 12);
        quarter_round(&mut working, 2, 7, 8, 13);
        quarter_round(&mut working, 3, 4, 9, 14);
    }

    for (word, initial) in working.iter_mut().zip(initial) {
        *word = word.wrapping_add(*initial);
    }

    let mut block = [0u8; 64];
    for (chunk, word) in block.chunks_exact_mut(4).zip(working) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    block
}

fn load_words(bytes: &[u8], words: &mut [u32]) {
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_le_bytes(chunk.try_into().unwrap());
    }
}

/// ChaCha8 keystream consumed byte-wise.
pub struct ChaCha8Rng {
    key: [u32; 8],
    nonce: [u32; 2],
    counter: u32,
    block: [u8; 64],
    pos: usize,
}

impl ChaCha8Rng {
    #[must_use]
    pub fn new(key: &[u8; 32], nonce: &[u8; 8]) -> Self {
        let mut key_words = [0u32; 8];
        load_words(key, &mut key_words);
        let mut nonce_words = [0u32; 2];
        load_words(nonce, &mut nonce_words);

        Self {
            key: key_words,
            nonce: nonce_words,
            counter: 0,
            block: [0; 64],
            // Exhausted, so the first draw computes a block.
            pos: 64,
        }
    }

    /// Fill `dst` with the next keystream bytes.
    pub fn fill_bytes(&mut self, dst: &mut [u8]) {
        for byte in dst {
            if self.pos == 64 {
                self.refill();
            }
            *byte = self.block[self.pos];
            self.pos += 1;
        }
    }

    fn refill(&mut self) {
        // constants | key | counter, 0 | nonce
        let mut initial = [0u32; 16];
        initial[..4].copy_from_slice(&CONSTANTS);
        initial[4..12].copy_from_slice(&self.key);
        initial[12] = self.counter;
        initial[14..].copy_from_slice(&self.nonce);

        self.block = keystream_block(&initial, 4);
        self.counter = self.counter.wrapping_add(1);
        self.pos = 0;
    }
}

/// ChaCha20 keystream consumed in 32-byte halves, one per header.
pub struct HeaderKeystream {
    key: [u32; 8],
    nonce: [u32; 3],
    counter: u32,
    block: [u8; 64],
    pos: usize,
}

impl HeaderKeystream {
    #[must_use]
    pub fn new(key: &[u8; 32], nonce: &[u8; 12]) -> Self {
        let mut key_words = [0u32; 8];
        load_words(key, &mut key_words);
        let mut nonce_words = [0u32; 3];
        load_words(nonce, &mut nonce_words);

        Self {
            key: key_words,
            nonce: nonce_words,
            counter: 0,
            block: [0; 64],
            // Both halves spent, so the first header computes a block.
            pos: 2,
        }
    }

    /// XOR the next 32-byte keystream half into `header`.
    pub fn xor_header(&mut self, header: &mut [u8; 32]) {
        if self.pos == 2 {
            self.refill();
        }

        let half = &self.block[self.pos * 32..][..32];
        for (byte, key) in header.iter_mut().zip(half) {
            *byte ^= key;
        }
        self.pos += 1;
    }

    fn refill(&mut self) {
        // constants | key | counter | nonce
        let mut initial = [0u32; 16];
        initial[..4].copy_from_slice(&CONSTANTS);
        initial[4..12].copy_from_slice(&self.key);
        initial[12] = self.counter;
        initial[13..].copy_from_slice(&self.nonce);

        self.block = keystream_block(&initial, 10);
        self.counter = self.counter.wrapping_add(1);
        self.pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reduced-round keystream vector with this exact state layout (8-byte
    // nonce, block counter starting at zero).
    const CHACHA8_KEY: &str = "641aeaeb08036b617a42cf14e8c5d2d115f8d7cb6ea5e28b9bfaf83e038426a7";
    const CHACHA8_NONCE: &str = "a14a1168271d459b";
    const CHACHA8_KEYSTREAM: &str = "\
        1721c044a8a6453522dddb3143d0be3512633ca3c79bf8ccc3594cb2c2f310f7\
        bd544f55ce0db38123412d6c45207d5cf9af0c6c680cce1f7e43388d1b0346b7\
        133c59fd6af4a5a568aa334ccdc38af5ace201df84d0a3ca225494ca6209345f\
        cf30132e";

    fn chacha8_from_vectors() -> ChaCha8Rng {
        let key: [u8; 32] = hex::decode(CHACHA8_KEY).unwrap().try_into().unwrap();
        let nonce: [u8; 8] = hex::decode(CHACHA8_NONCE).unwrap().try_into().unwrap();
        ChaCha8Rng::new(&key, &nonce)
    }

    #[test]
    fn chacha8_known_keystream() {
        let mut rng = chacha8_from_vectors();

        let mut keystream = [0u8; 100];
        rng.fill_bytes(&mut keystream);

        assert_eq!(keystream.to_vec(), hex::decode(CHACHA8_KEYSTREAM).unwrap());
    }

    #[test]
    fn chacha8_byte_wise_draws_match_bulk_draw() {
        let mut bulk = chacha8_from_vectors();
        let mut byte_wise = chacha8_from_vectors();

        let mut expected = [0u8; 100];
        bulk.fill_bytes(&mut expected);

        for &expected_byte in &expected {
            let mut byte = [0u8; 1];
            byte_wise.fill_bytes(&mut byte);
            assert_eq!(byte[0], expected_byte);
        }
    }

    #[test]
    fn chacha20_known_keystream() {
        // First 64 keystream bytes for an all-zero key and nonce, block
        // counter zero (RFC 8439 test vector), split over two headers.
        let mut keystream = HeaderKeystream::new(&[0u8; 32], &[0u8; 12]);

        let mut first = [0u8; 32];
        let mut second = [0u8; 32];
        keystream.xor_header(&mut first);
        keystream.xor_header(&mut second);

        assert_eq!(
            first.to_vec(),
            hex::decode("76b8e0ada0f13d90405d6ae55386bd28bdd219b8a08ded1aa836efcc8b770dc7")
                .unwrap()
        );
        assert_eq!(
            second.to_vec(),
            hex::decode("da41597c5157488d7724e03fb8d84a376a43b8f41518a11cc387b669b2ee6586")
                .unwrap()
        );
    }

    #[test]
    fn header_xor_is_an_involution_across_synchronized_streams() {
        let key = [7u8; 32];
        let nonce = [3u8; 12];
        let mut encrypt_side = HeaderKeystream::new(&key, &nonce);
        let mut decrypt_side = HeaderKeystream::new(&key, &nonce);

        for round in 0u8..5 {
            let mut header = [round; 32];
            encrypt_side.xor_header(&mut header);
            decrypt_side.xor_header(&mut header);
            assert_eq!(header, [round; 32]);
        }
    }

    #[test]
    fn distinct_nonces_produce_distinct_keystreams() {
        let key = [9u8; 32];
        let mut a = ChaCha8Rng::new(&key, &[0u8; 8]);
        let mut b = ChaCha8Rng::new(&key, &[1u8; 8]);

        let mut keystream_a = [0u8; 64];
        let mut keystream_b = [0u8; 64];
        a.fill_bytes(&mut keystream_a);
        b.fill_bytes(&mut keystream_b);

        assert_ne!(keystream_a, keystream_b);
    }
}
