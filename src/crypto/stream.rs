use std::io::{self, Read};

use super::Keys;

/// Decrypts a borrowed ciphertext slice on the fly.
///
/// Used to feed the inflater without materialising the plaintext.
pub struct DecryptReader<'a> {
    keys: Keys,
    cipher: &'a [u8],
}

impl<'a> DecryptReader<'a> {
    /// `keys` must already have consumed everything before `cipher`.
    pub fn new(keys: Keys, cipher: &'a [u8]) -> Self {
        Self { keys, cipher }
    }
}

impl Read for DecryptReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.cipher.len());
        let (head, tail) = self.cipher.split_at(n);
        for (out, &c) in buf.iter_mut().zip(head) {
            *out = self.keys.decrypt_byte(c);
        }
        self.cipher = tail;
        Ok(n)
    }
}
