//! Initiating role: seals messages for the wire.

use crate::bytes;
use crate::cipher::chacha::ChaCha8Rng;
use crate::cipher::threefish::Threefish512;
use crate::session::header::{self, HEADER_LEN, SEQ_NUM_MASK, VERSION};
use crate::session::{Bootstrap, RESPONSE_MAC_LEN, Session, body_checksum};

/// Sending side of a session.
///
/// Wraps the shared [`Session`] state together with an owned auxiliary RNG
/// that supplies all per-message randomness: the inner salt, the body
/// padding, and the tweak seed. The RNG is constructed by the caller (its
/// key is a bootstrap concern) and moved in; the sender only consumes bytes
/// from it.
pub struct Sender {
    session: Session,
    rng: ChaCha8Rng,
}

impl Sender {
    #[must_use]
    pub fn new(rng: ChaCha8Rng, bootstrap: &Bootstrap) -> Self {
        Self {
            session: Session::new(bootstrap),
            rng,
        }
    }

    /// Rotate to the next body-key generation.
    ///
    /// The receiver catches up on its own when a message arrives carrying
    /// the higher generation number.
    pub fn new_body_key(&mut self) {
        self.session.body_key_next();
    }

    /// Seal one message in place.
    ///
    /// On entry `body[..body_len]` holds the plaintext. The remainder of
    /// `body` up to the padded length is overwritten with random padding,
    /// and the whole padded body is encrypted in place. `header` receives
    /// the scrambled, keystream-encrypted header. Returns the padded body
    /// length (the number of body bytes to put on the wire) and the
    /// response MAC the receiver is expected to echo.
    ///
    /// # Panics
    ///
    /// Panics if `body` is shorter than
    /// [`body_len_padded(body_len)`](header::body_len_padded).
    pub fn new_msg(
        &mut self,
        header: &mut [u8; HEADER_LEN],
        body: &mut [u8],
        body_len: usize,
    ) -> (usize, [u8; RESPONSE_MAC_LEN]) {
        let body_len_padded = header::body_len_padded(body_len);
        assert!(
            body.len() >= body_len_padded,
            "body buffer too short for padding: {} < {body_len_padded}",
            body.len(),
        );

        header[0] = VERSION;
        bytes::write_be24(&mut header[1..4], self.session.seq_num & SEQ_NUM_MASK);
        bytes::write_be32(&mut header[4..8], body_len as u32);
        bytes::write_be16(&mut header[8..10], self.session.body_key_num);

        let mut inner_salt = [0u8; 6];
        self.rng.fill_bytes(&mut inner_salt);
        header[10..16].copy_from_slice(&inner_salt);

        let response_mac = self
            .session
            .compute_response_mac(&inner_salt, &mut body[..body_len]);

        self.rng.fill_bytes(&mut body[body_len..body_len_padded]);

        let mut tweak_seed = [0u8; 8];
        self.rng.fill_bytes(&mut tweak_seed);
        header[16..24].copy_from_slice(&tweak_seed);

        header[24..32].copy_from_slice(&body_checksum(&body[..body_len_padded]));

        Threefish512::new(&self.session.body_key, &tweak_seed)
            .encrypt(&mut body[..body_len_padded]);

        header::scramble(header);
        self.session.header_key_rng.xor_header(header);

        self.session.seq_num = self.session.seq_num.wrapping_add(1);

        (body_len_padded, response_mac)
    }
}
