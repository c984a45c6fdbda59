use crate::error::Result;
use crate::track::{LoadOptions, Track};
use std::path::Path;
use std::sync::Arc;

/// Trait for decoding audio files into [`Track`]s.
///
/// The built-in [`DefaultTrackLoader`] covers the formats Symphonia decodes;
/// a custom loader can stand in for specialized formats or test doubles.
///
/// [`DefaultTrackLoader`]: crate::track::DefaultTrackLoader
pub trait TrackLoader {
    /// Decodes the file at `path` into an in-memory track.
    ///
    /// # Errors
    ///
    /// Returns [`TonearmError::AssetLoad`] when the file is missing,
    /// unreadable, or not a decodable audio format.
    ///
    /// [`TonearmError::AssetLoad`]: crate::error::TonearmError::AssetLoad
    fn load(&self, path: &Path, options: &LoadOptions) -> Result<Arc<Track>>;
}
