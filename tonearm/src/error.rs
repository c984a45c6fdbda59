//! Error types for tonearm

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TonearmError {
    /// The output device could not be acquired or the stream could not be
    /// built with the requested mixer parameters.
    #[error("device init error: {0}")]
    DeviceInit(String),

    /// The audio asset is missing, unreadable, or not decodable.
    #[error("asset load error: {0}")]
    AssetLoad(String),

    /// Structurally invalid audio data (bad channel index, zero rates).
    #[error("audio format error: {0}")]
    AudioFormat(String),

    /// Playback sequencing or command-channel failure.
    #[error("mixer error: {0}")]
    Mixer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TonearmError>;
