//! The traditional PKWARE stream cipher.
//!
//! The cipher state is three 32-bit words. Every plaintext byte is fed back
//! into the state, so decryption of byte `n` depends on all bytes before it.

/// Reflected CRC-32 (polynomial 0xEDB88320) lookup table used by the key schedule.
const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { 0xEDB8_8320 ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

#[inline]
fn crc32_step(crc: u32, byte: u8) -> u32 {
    (crc >> 8) ^ CRC_TABLE[((crc ^ byte as u32) & 0xff) as usize]
}

/// Cipher state of the ZipCrypto keystream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keys {
    k0: u32,
    k1: u32,
    k2: u32,
}

impl Keys {
    const SEED: Keys = Keys {
        k0: 0x1234_5678,
        k1: 0x2345_6789,
        k2: 0x3456_7890,
    };

    /// Run the key schedule over `password`, starting from the fixed seed.
    pub fn derive(password: &[u8]) -> Self {
        password.iter().fold(Self::SEED, |keys, &b| keys.updated(b))
    }

    pub fn as_tuple(&self) -> (u32, u32, u32) {
        (self.k0, self.k1, self.k2)
    }

    #[inline]
    fn updated(self, byte: u8) -> Self {
        let k0 = crc32_step(self.k0, byte);
        let k1 = self
            .k1
            .wrapping_add(k0 & 0xff)
            .wrapping_mul(134_775_813)
            .wrapping_add(1);
        let k2 = crc32_step(self.k2, (k1 >> 24) as u8);
        Self { k0, k1, k2 }
    }

    #[inline]
    fn keystream_byte(&self) -> u8 {
        let t = (self.k2 | 2) as u16;
        (t.wrapping_mul(t ^ 1) >> 8) as u8
    }

    #[inline]
    pub fn decrypt_byte(&mut self, cipher: u8) -> u8 {
        let plain = cipher ^ self.keystream_byte();
        *self = self.updated(plain);
        plain
    }

    #[inline]
    pub fn encrypt_byte(&mut self, plain: u8) -> u8 {
        let cipher = plain ^ self.keystream_byte();
        *self = self.updated(plain);
        cipher
    }

    pub fn decrypt(&mut self, buf: &mut [u8]) {
        for b in buf {
            *b = self.decrypt_byte(*b);
        }
    }

    pub fn encrypt(&mut self, buf: &mut [u8]) {
        for b in buf {
            *b = self.encrypt_byte(*b);
        }
    }
}
