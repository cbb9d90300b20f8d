//! Shared session state for the sender and receiver roles.
//!
//! Both roles hold the same [`Session`]: a ratcheting body key, a message
//! sequence counter, and the header keystream. The sender additionally owns
//! the auxiliary RNG (see [`sender::Sender`]); the receiver is a session
//! alone. All derivations are deterministic in the bootstrap secrets, so two
//! peers initialized from the same [`Bootstrap`] stay in lockstep.

pub mod header;
pub mod receiver;
pub mod sender;

use crate::cipher::chacha::HeaderKeystream;
use crate::cipher::cubehash::cubehash;
use crate::cipher::sha256::sha256_48;
use crate::traits::{Error, Result};

/// Size of a response MAC, in bytes.
pub const RESPONSE_MAC_LEN: usize = 32;

/// Bootstrap secrets, produced by an external handshake and consumed here as
/// opaque byte strings.
///
/// The salts are long-lived shared secrets; the state seeds and the header
/// RNG nonce are per-session values.
pub struct Bootstrap {
    pub header_salt: [u8; 16],
    pub header_state_init: [u8; 32],
    pub header_rng_nonce: [u8; 12],
    pub body_salt: [u8; 16],
    pub body_state0: [u8; 32],
}

pub(crate) struct Session {
    body_key_salt: [u8; 16],
    body_key_state: [u8; 32],
    pub(crate) body_key: [u8; 64],
    pub(crate) body_key_num: u16,
    response_mac_salt: [u8; 16],
    pub(crate) header_key_rng: HeaderKeystream,
    pub(crate) seq_num: u32,
}

impl Session {
    pub(crate) fn new(bootstrap: &Bootstrap) -> Self {
        let mut buf = [0u8; 48];
        buf[..16].copy_from_slice(&bootstrap.header_salt);
        buf[16..].copy_from_slice(&bootstrap.header_state_init);
        let header_key = sha256_48(&buf);

        let mut session = Self {
            body_key_salt: bootstrap.body_salt,
            body_key_state: bootstrap.body_state0,
            body_key: [0; 64],
            body_key_num: 0,
            response_mac_salt: [0; 16],
            header_key_rng: HeaderKeystream::new(&header_key, &bootstrap.header_rng_nonce),
            seq_num: 1,
        };
        // First ratchet; generation 1 is the first usable body key.
        session.body_key_next();
        session
    }

    /// Advance the body-key ladder by one generation.
    ///
    /// The state evolves through SHA-256, and the new state's first 31 bytes
    /// (the last byte never enters the digest) expand through CubeHash into
    /// the 64-byte Threefish key and the 16-byte response-MAC salt.
    pub(crate) fn body_key_next(&mut self) {
        let mut buf = [0u8; 48];
        buf[..16].copy_from_slice(&self.body_key_salt);
        buf[16..].copy_from_slice(&self.body_key_state);
        let new_state = sha256_48(&buf);

        let expanded = cubehash(&new_state[..31]);
        self.body_key.copy_from_slice(&expanded[..64]);
        self.response_mac_salt.copy_from_slice(&expanded[64..80]);

        self.body_key_state = new_state;
        self.body_key_num = self.body_key_num.wrapping_add(1);
    }

    /// MAC over the message body and the current generation's MAC salt.
    ///
    /// The inner salt is XORed into the body prefix for the digest and
    /// undone afterwards, so identical bodies under one key still produce
    /// distinct MACs while `body` is left untouched.
    pub(crate) fn compute_response_mac(
        &self,
        inner_salt: &[u8; 6],
        body: &mut [u8],
    ) -> [u8; RESPONSE_MAC_LEN] {
        let n = body.len().min(inner_salt.len());
        for (byte, salt) in body[..n].iter_mut().zip(inner_salt) {
            *byte ^= salt;
        }

        let digest = cubehash(body);

        let mut buf = [0u8; 48];
        buf[..16].copy_from_slice(&self.response_mac_salt);
        buf[16..].copy_from_slice(&digest[..32]);
        let mac = sha256_48(&buf);

        for (byte, salt) in body[..n].iter_mut().zip(inner_salt) {
            *byte ^= salt;
        }
        mac
    }
}

/// Check a received response MAC against the sender's expected value.
///
/// # Errors
///
/// Errors with [`Error::BadResponseMac`] if the values differ. The
/// comparison is constant-time.
pub fn verify_response_mac(
    expected: &[u8; RESPONSE_MAC_LEN],
    received: &[u8; RESPONSE_MAC_LEN],
) -> Result<()> {
    if ct_eq(expected, received) {
        Ok(())
    } else {
        Err(Error::BadResponseMac)
    }
}

/// XOR fold of the padded body: the first 8 bytes, then every further byte
/// folded into position `i % 8`.
pub(crate) fn body_checksum(body: &[u8]) -> [u8; 8] {
    let mut checksum = [0u8; 8];
    let n = body.len().min(8);
    checksum[..n].copy_from_slice(&body[..n]);
    for (i, byte) in body[n..].iter().enumerate() {
        checksum[(n + i) % 8] ^= byte;
    }
    checksum
}

/// Constant-time equality: every byte pair is visited regardless of where
/// the first difference sits.
pub(crate) fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bootstrap() -> Bootstrap {
        Bootstrap {
            header_salt: [1; 16],
            header_state_init: [2; 32],
            header_rng_nonce: [3; 12],
            body_salt: [4; 16],
            body_state0: [5; 32],
        }
    }

    #[test]
    fn fresh_sessions_start_at_generation_one() {
        let session = Session::new(&bootstrap());

        assert_eq!(session.body_key_num, 1);
        assert_eq!(session.seq_num, 1);
    }

    #[test]
    fn key_ladder_is_deterministic() {
        let mut a = Session::new(&bootstrap());
        let mut b = Session::new(&bootstrap());

        for _ in 0..4 {
            assert_eq!(a.body_key, b.body_key);
            assert_eq!(a.response_mac_salt, b.response_mac_salt);
            a.body_key_next();
            b.body_key_next();
        }
    }

    #[test]
    fn key_ladder_generations_differ() {
        let mut session = Session::new(&bootstrap());
        let generation_one = session.body_key;

        session.body_key_next();

        assert_eq!(session.body_key_num, 2);
        assert_ne!(session.body_key, generation_one);
    }

    #[test]
    fn bootstrap_secrets_determine_the_ladder() {
        let a = Session::new(&bootstrap());
        let mut other = bootstrap();
        other.body_state0[0] ^= 1;
        let b = Session::new(&other);

        assert_ne!(a.body_key, b.body_key);
    }

    #[test]
    fn response_mac_leaves_the_body_untouched() {
        let session = Session::new(&bootstrap());
        let mut body = *b"response mac input";
        let original = body;

        let _ = session.compute_response_mac(&[9; 6], &mut body);

        assert_eq!(body, original);
    }

    #[test]
    fn response_mac_depends_on_inner_salt() {
        let session = Session::new(&bootstrap());
        let mut body = *b"same body";

        let one = session.compute_response_mac(&[1; 6], &mut body);
        let two = session.compute_response_mac(&[2; 6], &mut body);

        assert_ne!(one, two);
    }

    #[test]
    fn response_mac_handles_bodies_shorter_than_the_salt() {
        let session = Session::new(&bootstrap());
        let mut body = *b"abc";
        let original = body;

        let short = session.compute_response_mac(&[7; 6], &mut body);
        assert_eq!(body, original);

        let mut empty: [u8; 0] = [];
        let _ = session.compute_response_mac(&[7; 6], &mut empty);

        assert_ne!(short, [0; RESPONSE_MAC_LEN]);
    }

    #[test]
    fn verify_response_mac_accepts_equal_values() {
        assert!(verify_response_mac(&[6; 32], &[6; 32]).is_ok());
    }

    #[test]
    fn verify_response_mac_rejects_differing_values() {
        let mut received = [6; 32];
        received[31] ^= 0x80;

        assert_eq!(
            verify_response_mac(&[6; 32], &received).unwrap_err(),
            Error::BadResponseMac
        );
    }

    #[test]
    fn body_checksum_folds_trailing_bytes() {
        let mut body = [0u8; 64];
        body[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        body[8] = 0xF0;
        body[63] = 0x0F;

        let checksum = body_checksum(&body);

        assert_eq!(checksum, [1 ^ 0xF0, 2, 3, 4, 5, 6, 7, 8 ^ 0x0F]);
    }

    #[test]
    fn ct_eq_detects_any_difference() {
        assert!(ct_eq(&[1, 2, 3], &[1, 2, 3]));
        assert!(!ct_eq(&[1, 2, 3], &[1, 2, 4]));
        assert!(!ct_eq(&[0, 2, 3], &[1, 2, 3]));
    }
}
