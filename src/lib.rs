pub mod cipher;
pub mod session;
pub mod traits;

mod bytes;

pub use cipher::chacha::ChaCha8Rng;
pub use session::header::{HEADER_LEN, Header, body_len_padded};
pub use session::receiver::Receiver;
pub use session::sender::Sender;
pub use session::{Bootstrap, RESPONSE_MAC_LEN, verify_response_mac};
pub use traits::*;
