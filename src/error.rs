use thiserror::Error;

/// Misuse of a digest engine.
///
/// MD5 accepts any byte sequence, so the only failures are calls made in the wrong
/// order relative to `finalize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Data was fed to an engine whose digest has already been computed.
    #[error("digest already finalized, call init() before feeding more data")]
    AlreadyFinalized,

    /// The digest was requested before `finalize` was called.
    #[error("digest not finalized yet")]
    NotFinalized,
}

pub type Result<T> = std::result::Result<T, Error>;
