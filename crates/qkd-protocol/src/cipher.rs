//! One-time-pad stream cipher over bitstrings.
//!
//! A message is turned into its UTF-8 bytes, eight bits per byte, most
//! significant bit first, and XORed position by position with key bits.
//!
//! [`encrypt`] and [`decrypt`] always use the key from its first bit; they
//! cannot tell whether that key has been used before. [`OneTimePad`] owns
//! a key and hands every bit out at most once, so reuse surfaces as
//! [`ProtocolError::KeyExhausted`].

use tracing::debug;

use crate::bitstring::Bitstring;
use crate::error::{ProtocolError, ProtocolResult};
use crate::key::SecureKey;

/// The bits of `message`'s UTF-8 encoding.
pub fn message_to_bits(message: &str) -> Bitstring {
    message
        .as_bytes()
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| byte & (1 << i) != 0))
        .collect()
}

/// Repack bits into bytes and decode them as UTF-8.
pub fn bits_to_message(bits: &Bitstring) -> ProtocolResult<String> {
    if bits.len() % 8 != 0 {
        return Err(ProtocolError::MalformedCiphertext(bits.len()));
    }
    let bytes: Vec<u8> = bits
        .as_slice()
        .chunks(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &bit| (acc << 1) | u8::from(bit)))
        .collect();
    Ok(String::from_utf8(bytes)?)
}

/// XOR `bits` with the leading bits of `key`.
fn xor_with(bits: &Bitstring, key: &Bitstring) -> ProtocolResult<Bitstring> {
    if key.len() < bits.len() {
        return Err(ProtocolError::InsufficientKey {
            needed: bits.len(),
            available: key.len(),
        });
    }
    Ok(bits.iter().zip(key.iter()).map(|(b, k)| b ^ k).collect())
}

/// Encrypt `message` with the leading bits of `key`.
pub fn encrypt(message: &str, key: &Bitstring) -> ProtocolResult<Bitstring> {
    xor_with(&message_to_bits(message), key)
}

/// Decrypt `cipher` with the leading bits of `key`.
pub fn decrypt(cipher: &Bitstring, key: &Bitstring) -> ProtocolResult<String> {
    if cipher.len() % 8 != 0 {
        return Err(ProtocolError::MalformedCiphertext(cipher.len()));
    }
    bits_to_message(&xor_with(cipher, key)?)
}

/// A key consumed front to back, never handing a bit out twice.
///
/// Both parties keep their own pad over their copy of the agreed key and
/// must process messages in the same order.
#[derive(Debug, Clone)]
pub struct OneTimePad {
    key: SecureKey,
    cursor: usize,
}

impl OneTimePad {
    /// Start a pad at the beginning of `key`.
    pub fn new(key: SecureKey) -> Self {
        Self { key, cursor: 0 }
    }

    /// Continue a pad whose first `used` bits were handed out earlier.
    pub fn resume(key: SecureKey, used: usize) -> ProtocolResult<Self> {
        if used > key.len() {
            return Err(ProtocolError::IndexOutOfRange {
                index: used,
                len: key.len(),
            });
        }
        Ok(Self { key, cursor: used })
    }

    /// Bits not yet used.
    pub fn remaining(&self) -> usize {
        self.key.len() - self.cursor
    }

    /// Bits already used.
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Encrypt with the next unused key bits.
    pub fn encrypt(&mut self, message: &str) -> ProtocolResult<Bitstring> {
        let bits = message_to_bits(message);
        let pad = self.take(bits.len())?;
        xor_with(&bits, &pad)
    }

    /// Decrypt with the next unused key bits.
    pub fn decrypt(&mut self, cipher: &Bitstring) -> ProtocolResult<String> {
        if cipher.len() % 8 != 0 {
            return Err(ProtocolError::MalformedCiphertext(cipher.len()));
        }
        let pad = self.take(cipher.len())?;
        bits_to_message(&xor_with(cipher, &pad)?)
    }

    fn take(&mut self, needed: usize) -> ProtocolResult<Bitstring> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(ProtocolError::KeyExhausted { needed, remaining });
        }
        let pad = self.key.bits().range(self.cursor, self.cursor + needed)?;
        self.cursor += needed;
        debug!(used = self.cursor, remaining = self.remaining(), "consumed pad bits");
        Ok(pad)
    }
}
