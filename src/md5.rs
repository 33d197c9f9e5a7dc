//! # MD5 Message-Digest
//!
//! A streaming implementation of MD5 as defined in RFC 1321. Data is fed through
//! [`Md5::update`] in chunks of any size, [`Md5::finalize`] applies the standard padding and
//! length suffix, and the digest is read back as lowercase hex or as 16 raw bytes.
//!
//! **Note**: MD5 is not collision resistant. It is provided for interoperability with
//! existing checksums, not for security.
//!
//! ```
//! use md5_engine::md5::{hash, Md5};
//!
//! let mut md5 = Md5::new();
//! md5.update("The quick brown fox ").unwrap();
//! md5.update("jumps over the lazy dog").unwrap();
//! assert_eq!(md5.finalize().hexdigest(), "9e107d9d372bb6826bd81d3542a419d6");
//! assert_eq!(hash("abc"), "900150983cd24fb0d6963f7d28e17f72");
//! ```

pub mod engine;
mod transform;

pub use engine::Md5;
pub use transform::BLOCK_SIZE;

/// The size of the MD5 digest in bytes (128 bits = 16 bytes).
pub const MD5_OUTPUT_SIZE: usize = 16;

/// Hashes a complete string and returns the 32-character lowercase hex digest.
pub fn hash(input: &str) -> String {
    Md5::compute(input).hexdigest()
}

/// Hashes a complete byte slice and returns the raw 16-byte digest.
pub fn digest(data: &[u8]) -> [u8; MD5_OUTPUT_SIZE] {
    Md5::compute(data).into_digest()
}
