//! ZipCrypto key schedule and keystream.

mod keys;
mod stream;

pub use keys::Keys;
pub use stream::DecryptReader;
