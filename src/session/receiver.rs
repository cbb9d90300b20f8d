//! Responding role: opens messages from the wire.

use crate::cipher::threefish::Threefish512;
use crate::session::header::{HEADER_LEN, Header, SEQ_NUM_MASK, unscramble};
use crate::session::{Bootstrap, RESPONSE_MAC_LEN, Session, body_checksum, ct_eq};
use crate::traits::{Error, Result};

/// Receiving side of a session.
///
/// A session alone; the receiver draws no randomness. Every error returned
/// here is session-fatal: the header keystream advances on each
/// [`read_header`](Receiver::read_header) call whether or not the checks
/// pass, so after a failure the peers cannot be resynchronized.
pub struct Receiver {
    session: Session,
}

impl Receiver {
    #[must_use]
    pub fn new(bootstrap: &Bootstrap) -> Self {
        Self {
            session: Session::new(bootstrap),
        }
    }

    /// Decrypt and parse a raw header in place.
    ///
    /// # Errors
    ///
    /// Errors with [`Error::BadVersion`] for an unknown version byte, or
    /// [`Error::BadSeqNum`] if the sequence number is not the expected one.
    /// Neither advances the session's sequence counter.
    pub fn read_header(&mut self, raw_header: &mut [u8; HEADER_LEN]) -> Result<Header> {
        self.session.header_key_rng.xor_header(raw_header);
        unscramble(raw_header);

        let header = Header::parse(raw_header)?;
        if header.seq_num != self.session.seq_num & SEQ_NUM_MASK {
            return Err(Error::BadSeqNum);
        }

        Ok(header)
    }

    /// Decrypt and verify the body that belongs to `header`, in place.
    ///
    /// Ratchets the body key forward if the header announces a newer
    /// generation. On success the plaintext sits in
    /// `body[..header.body_len]`, the sequence counter advances, and the
    /// response MAC to echo back is returned.
    ///
    /// # Errors
    ///
    /// Errors with [`Error::BadBodyKeyNum`] if the header names an already
    /// retired key generation, or [`Error::BadBodyChecksum`] if the
    /// decrypted body does not match the header's checksum.
    ///
    /// # Panics
    ///
    /// Panics if `body.len()` is not `header.body_len_padded()`.
    pub fn read_body(
        &mut self,
        header: &Header,
        body: &mut [u8],
    ) -> Result<[u8; RESPONSE_MAC_LEN]> {
        let body_len_padded = header.body_len_padded();
        assert_eq!(
            body.len(),
            body_len_padded,
            "body buffer must hold exactly the padded body",
        );

        // The key generation may never move backwards.
        if header.body_key_num < self.session.body_key_num {
            return Err(Error::BadBodyKeyNum);
        }
        while self.session.body_key_num < header.body_key_num {
            self.session.body_key_next();
        }

        Threefish512::new(&self.session.body_key, &header.tweak_seed).decrypt(body);

        if !ct_eq(&body_checksum(body), &header.body_checksum) {
            return Err(Error::BadBodyChecksum);
        }

        let response_mac = self
            .session
            .compute_response_mac(&header.inner_salt, &mut body[..header.body_len as usize]);

        self.session.seq_num = self.session.seq_num.wrapping_add(1);

        Ok(response_mac)
    }
}

#[cfg(test)]
mod tests {
    use crate::cipher::chacha::ChaCha8Rng;
    use crate::session::sender::Sender;

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

    fn pair() -> (Sender, Receiver) {
        let sender = Sender::new(ChaCha8Rng::new(&[6; 32], &[7; 8]), &bootstrap());
        let receiver = Receiver::new(&bootstrap());
        (sender, receiver)
    }

    #[test]
    fn opens_what_the_sender_seals() {
        let (mut sender, mut receiver) = pair();

        let mut header = [0u8; HEADER_LEN];
        let mut body = [0u8; 64];
        body[..11].copy_from_slice(b"hello world");
        let (padded, sender_mac) = sender.new_msg(&mut header, &mut body, 11);

        let parsed = receiver.read_header(&mut header).unwrap();
        assert_eq!(parsed.body_len, 11);
        assert_eq!(parsed.body_len_padded(), padded);

        let receiver_mac = receiver.read_body(&parsed, &mut body).unwrap();
        assert_eq!(&body[..11], b"hello world");
        assert_eq!(receiver_mac, sender_mac);
    }

    #[test]
    fn read_header_rejects_a_garbled_stream() {
        let (mut sender, mut receiver) = pair();

        let mut header = [0u8; HEADER_LEN];
        let mut body = [0u8; 64];
        sender.new_msg(&mut header, &mut body, 3);

        // Consume the receiver's first keystream half out of band; the
        // frame now decrypts under the wrong half.
        let mut stolen = [0u8; HEADER_LEN];
        receiver.read_header(&mut stolen).unwrap_err();

        let err = receiver.read_header(&mut header).unwrap_err();
        assert!(matches!(err, Error::BadVersion | Error::BadSeqNum));
    }

    #[test]
    fn failed_reads_do_not_advance_the_sequence() {
        let (_, mut receiver) = pair();

        let mut garbage = [0xFFu8; HEADER_LEN];
        receiver.read_header(&mut garbage).unwrap_err();

        // A fresh sender burns one frame so its header keystream lines up
        // with the receiver again, then seals a frame with sequence
        // number 2.
        let mut sender = Sender::new(ChaCha8Rng::new(&[6; 32], &[7; 8]), &bootstrap());
        let mut header = [0u8; HEADER_LEN];
        let mut body = [0u8; 64];
        sender.new_msg(&mut header, &mut body, 1);

        let mut header = [0u8; HEADER_LEN];
        let mut body = [0u8; 64];
        body[..2].copy_from_slice(b"ok");
        sender.new_msg(&mut header, &mut body, 2);

        // The receiver never consumed sequence number 1.
        assert_eq!(
            receiver.read_header(&mut header).unwrap_err(),
            Error::BadSeqNum
        );
    }

    #[test]
    fn read_body_catches_up_the_key_ladder() {
        let (mut sender, mut receiver) = pair();
        sender.new_body_key();
        sender.new_body_key();

        let mut header = [0u8; HEADER_LEN];
        let mut body = [0u8; 64];
        body[..4].copy_from_slice(b"skip");
        sender.new_msg(&mut header, &mut body, 4);

        let parsed = receiver.read_header(&mut header).unwrap();
        assert_eq!(parsed.body_key_num, 3);

        receiver.read_body(&parsed, &mut body).unwrap();
        assert_eq!(&body[..4], b"skip");
    }

    #[test]
    fn read_body_rejects_corrupted_ciphertext() {
        let (mut sender, mut receiver) = pair();

        let mut header = [0u8; HEADER_LEN];
        let mut body = [0u8; 64];
        body[..6].copy_from_slice(b"honest");
        sender.new_msg(&mut header, &mut body, 6);

        body[40] ^= 0x01;

        let parsed = receiver.read_header(&mut header).unwrap();
        assert_eq!(
            receiver.read_body(&parsed, &mut body).unwrap_err(),
            Error::BadBodyChecksum
        );
    }
}
