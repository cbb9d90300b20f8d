pub mod chacha;
pub mod cubehash;
pub mod sha256;
pub mod threefish;

pub use chacha::{ChaCha8Rng, HeaderKeystream};
pub use cubehash::cubehash;
pub use sha256::sha256_48;
pub use threefish::Threefish512;
