use std::fmt;
use std::io;

use log::{trace, warn};
use zeroize::Zeroize;

use super::transform::{encode, transform, BLOCK_SIZE, INIT_STATE};
use super::MD5_OUTPUT_SIZE;
use crate::error::{Error, Result};

/// Offset inside a block at which the 8-byte length suffix starts.
const LENGTH_OFFSET: usize = BLOCK_SIZE - 8;

/// A lone 0x80 marker followed by zeros; finalize feeds a prefix of it.
static PADDING: [u8; BLOCK_SIZE] = {
    let mut padding = [0u8; BLOCK_SIZE];
    padding[0] = 0x80;
    padding
};

/// A streaming MD5 context.
///
/// Feed data with [`Md5::update`], then call [`Md5::finalize`] once. After that the digest is
/// available through [`Md5::hexdigest`] and [`Md5::digest_bytes`], and further updates are
/// rejected until [`Md5::init`] starts a new message.
///
/// MD5 is broken for collision resistance. Use it for interoperability checksums only.
#[derive(Debug, Clone)]
pub struct Md5 {
    /// State (A, B, C, D).
    state: [u32; 4],
    /// Message length in bits mod 2^64.
    count: u64,
    /// Unprocessed tail of the input, `(count / 8) % 64` bytes long.
    buffer: [u8; BLOCK_SIZE],
    digest: [u8; MD5_OUTPUT_SIZE],
    finalized: bool,
}

impl Default for Md5 {
    fn default() -> Self {
        Self::new()
    }
}

impl Md5 {
    /// Creates a new, initialized MD5 context.
    pub fn new() -> Self {
        Self {
            state: INIT_STATE,
            count: 0,
            buffer: [0u8; BLOCK_SIZE],
            digest: [0u8; MD5_OUTPUT_SIZE],
            finalized: false,
        }
    }

    /// Hashes `data` in one go and returns the finalized context.
    pub fn compute(data: impl AsRef<[u8]>) -> Self {
        let mut md5 = Self::new();
        md5.absorb(data.as_ref());
        md5.finalize();
        md5
    }

    /// Resets the context to the initial state, discarding any buffered input and digest.
    pub fn init(&mut self) {
        self.state = INIT_STATE;
        self.count = 0;
        self.buffer.zeroize();
        self.digest.zeroize();
        self.finalized = false;
    }

    /// Returns `true` once [`Md5::finalize`] has run.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Feeds more message bytes into the context.
    ///
    /// Fails with [`Error::AlreadyFinalized`] if the digest has already been computed.
    pub fn update(&mut self, data: impl AsRef<[u8]>) -> Result<()> {
        if self.finalized {
            warn!("md5: update rejected, context already finalized");
            return Err(Error::AlreadyFinalized);
        }
        self.absorb(data.as_ref());
        Ok(())
    }

    /// Same as [`Md5::update`] for a signed byte view. Each `i8` is hashed as its two's
    /// complement bit pattern.
    pub fn update_signed(&mut self, data: &[i8]) -> Result<()> {
        if self.finalized {
            warn!("md5: update rejected, context already finalized");
            return Err(Error::AlreadyFinalized);
        }
        let mut chunk = [0u8; BLOCK_SIZE];
        for signed in data.chunks(BLOCK_SIZE) {
            for (dst, &src) in chunk.iter_mut().zip(signed) {
                *dst = src as u8;
            }
            self.absorb(&chunk[..signed.len()]);
        }
        chunk.zeroize();
        Ok(())
    }

    /// Appends padding and the length suffix, then freezes the state into the digest.
    ///
    /// Calling this more than once is a no-op.
    pub fn finalize(&mut self) -> &mut Self {
        if self.finalized {
            return self;
        }

        // length of the message before padding
        let bits = self.count.to_le_bytes();

        // pad out to 56 mod 64
        let index = self.buffer_len();
        let pad_len = if index < LENGTH_OFFSET {
            LENGTH_OFFSET - index
        } else {
            BLOCK_SIZE + LENGTH_OFFSET - index
        };
        self.absorb(&PADDING[..pad_len]);
        self.absorb(&bits);
        debug_assert_eq!(self.buffer_len(), 0);

        encode(&mut self.digest, &self.state);
        trace!(
            "md5: finalized message of {} bits, padded with {} bytes",
            u64::from_le_bytes(bits),
            pad_len
        );

        self.buffer.zeroize();
        self.count.zeroize();
        self.finalized = true;
        self
    }

    /// Returns the digest as 32 lowercase hex characters, or an empty string if the
    /// context has not been finalized.
    pub fn hexdigest(&self) -> String {
        if !self.finalized {
            return String::new();
        }
        hex::encode(self.digest)
    }

    /// Returns the raw 16-byte digest.
    pub fn digest_bytes(&self) -> Result<[u8; MD5_OUTPUT_SIZE]> {
        if !self.finalized {
            warn!("md5: digest requested before finalize");
            return Err(Error::NotFinalized);
        }
        Ok(self.digest)
    }

    /// Consumes a context that [`Md5::compute`] has already finalized.
    pub(super) fn into_digest(self) -> [u8; MD5_OUTPUT_SIZE] {
        debug_assert!(self.finalized);
        self.digest
    }

    /// Number of bytes currently sitting in the block buffer.
    fn buffer_len(&self) -> usize {
        ((self.count >> 3) % BLOCK_SIZE as u64) as usize
    }

    fn absorb(&mut self, input: &[u8]) {
        let mut index = self.buffer_len();
        self.count = self.count.wrapping_add((input.len() as u64) << 3);

        // number of bytes needed to complete the buffered block
        let first_part = BLOCK_SIZE - index;

        let mut rest = input;
        if input.len() >= first_part {
            self.buffer[index..].copy_from_slice(&input[..first_part]);
            transform(&mut self.state, &self.buffer);
            self.buffer.zeroize();

            // full blocks go straight from the input
            let mut blocks = input[first_part..].chunks_exact(BLOCK_SIZE);
            for block in &mut blocks {
                transform(&mut self.state, block);
            }
            rest = blocks.remainder();
            index = 0;
        }

        self.buffer[index..index + rest.len()].copy_from_slice(rest);
    }
}

impl fmt::Display for Md5 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hexdigest())
    }
}

impl fmt::LowerHex for Md5 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hexdigest())
    }
}

impl io::Write for Md5 {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_new_is_initialized() {
        let md5 = Md5::new();
        assert_eq!(md5.state, [0x67452301, 0xEFCDAB89, 0x98BADCFE, 0x10325476]);
        assert_eq!(md5.count, 0);
        assert!(!md5.is_finalized());
    }

    #[test]
    fn test_abc() {
        let mut md5 = Md5::new();
        md5.update(b"abc").unwrap();
        md5.finalize();
        assert_eq!(md5.hexdigest(), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_buffer_tracks_bit_count() {
        let mut md5 = Md5::new();
        md5.update([0u8; 70]).unwrap();
        assert_eq!(md5.count, 70 * 8);
        assert_eq!(md5.buffer_len(), 6);
        md5.update([0u8; 58]).unwrap();
        assert_eq!(md5.buffer_len(), 0);
    }

    #[test]
    fn test_count_carries_into_high_word() {
        let mut md5 = Md5::new();
        md5.count = 0xFFFF_FFF8;
        md5.update(b"x").unwrap();
        assert_eq!(md5.count, 0x1_0000_0000);
    }

    #[test]
    fn test_update_after_finalize_is_rejected() {
        let mut md5 = Md5::new();
        md5.update("hello").unwrap();
        md5.finalize();
        assert_eq!(md5.update("world"), Err(Error::AlreadyFinalized));
        assert_eq!(md5.update_signed(&[1, 2]), Err(Error::AlreadyFinalized));
        assert_eq!(md5.hexdigest(), "5d41402abc4b2a76b9719d911017c592");
    }

    #[test]
    fn test_read_before_finalize() {
        let mut md5 = Md5::new();
        md5.update("partial").unwrap();
        assert_eq!(md5.hexdigest(), "");
        assert_eq!(md5.to_string(), "");
        assert_eq!(md5.digest_bytes(), Err(Error::NotFinalized));
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut md5 = Md5::new();
        md5.update("abc").unwrap();
        let first = md5.finalize().hexdigest();
        let second = md5.finalize().hexdigest();
        assert_eq!(first, second);
    }

    #[test]
    fn test_finalize_wipes_buffer_and_count() {
        let mut md5 = Md5::new();
        md5.update("some secret bytes").unwrap();
        md5.finalize();
        assert_eq!(md5.buffer, [0u8; BLOCK_SIZE]);
        assert_eq!(md5.count, 0);
    }

    #[test]
    fn test_init_restarts_finalized_context() {
        let mut md5 = Md5::compute("first message");
        md5.init();
        assert!(!md5.is_finalized());
        assert_eq!(md5.hexdigest(), "");
        md5.update("abc").unwrap();
        assert_eq!(md5.finalize().hexdigest(), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_signed_view_matches_unsigned() {
        let unsigned: Vec<u8> = (0..=255u8).cycle().take(300).collect();
        let signed: Vec<i8> = unsigned.iter().map(|&b| b as i8).collect();

        let mut a = Md5::new();
        a.update(&unsigned).unwrap();
        let mut b = Md5::new();
        b.update_signed(&signed).unwrap();

        assert_eq!(a.finalize().hexdigest(), b.finalize().hexdigest());
    }

    #[test]
    fn test_digest_bytes() {
        let md5 = Md5::compute("");
        assert_eq!(
            md5.digest_bytes().unwrap(),
            [
                0xd4, 0x1d, 0x8c, 0xd9, 0x8f, 0x00, 0xb2, 0x04, 0xe9, 0x80, 0x09, 0x98, 0xec,
                0xf8, 0x42, 0x7e
            ]
        );
    }

    #[test]
    fn test_display_and_lower_hex() {
        let md5 = Md5::compute("abc");
        assert_eq!(format!("{}", md5), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(format!("{:x}", md5), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_io_write() {
        let mut md5 = Md5::new();
        let mut reader: &[u8] = b"The quick brown fox jumps over the lazy dog";
        io::copy(&mut reader, &mut md5).unwrap();
        md5.finalize();
        assert_eq!(md5.hexdigest(), "9e107d9d372bb6826bd81d3542a419d6");

        let err = md5.write(b"more").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }
}
