pub mod error;
pub mod md5;

pub use error::{Error, Result};
pub use md5::{digest, hash, Md5, MD5_OUTPUT_SIZE};
