use std::fmt;

/// Transport and command-layer errors.
///
/// The protocol variants (`BadVersion` through `BadResponseMac`) are
/// session-fatal: once one surfaces, the peers' keystreams can no longer be
/// assumed synchronized and the session must be torn down. Nothing is
/// retried internally.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    BadVersion,
    BadSeqNum,
    BadBodyChecksum,
    BadBodyKeyNum,
    BadResponseMac,
    Base64Decode(String),
    Read(String),
    Write(String),
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadVersion => write!(f, "Unsupported protocol version."),
            Self::BadSeqNum => write!(
                f,
                "\
Unexpected message sequence number.
The frame is a replay, or the peers are desynchronized."
            ),
            Self::BadBodyChecksum => write!(
                f,
                "\
Body checksum mismatch.
The frame is corrupted, or the peers are desynchronized."
            ),
            Self::BadBodyKeyNum => write!(f, "Stale body key generation."),
            Self::BadResponseMac => write!(
                f,
                "\
Response MAC mismatch.
The receiver did not prove receipt of the message body."
            ),
            Self::Base64Decode(reason) => write!(f, "Could not decode base64: {reason}"),
            Self::Read(reason) => write!(f, "Could not read from input: {reason}"),
            Self::Write(reason) => write!(f, "Could not write to output: {reason}"),
            Self::Other(reason) => write!(f, "{reason}"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
