mod default_loader;
mod load_options;
mod loader;
mod resampler;

use crate::error::Result;
pub use default_loader::DefaultTrackLoader;
pub use load_options::{ChannelMode, LoadOptions};
pub use loader::TrackLoader;
pub use resampler::TrackResampler;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// One decoded audio asset, ready for playback.
///
/// Samples are stored interleaved (`[L0, R0, L1, R1, ...]` for stereo) as
/// f32 PCM. The data is reference-counted and immutable; the mixer's audio
/// callback shares it with the caller for the lifetime of playback.
#[derive(Debug, Clone)]
pub struct Track {
    inner: Arc<TrackInner>,
}

#[derive(Debug)]
struct TrackInner {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    duration: Duration,
    total_frames: usize,
}

impl Track {
    pub(crate) fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        let total_frames = samples.len() / channels as usize;
        let duration = Duration::from_secs_f64(total_frames as f64 / sample_rate as f64);
        Self {
            inner: Arc::new(TrackInner {
                samples,
                sample_rate,
                channels,
                duration,
                total_frames,
            }),
        }
    }

    /// Loads a track from a file path using the built-in Symphonia loader
    /// with default options.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        DefaultTrackLoader.load(path.as_ref(), &LoadOptions::default())
    }

    /// Loads a track from a file path with custom options.
    pub fn from_path_with_options<P: AsRef<Path>>(
        path: P,
        options: &LoadOptions,
    ) -> Result<Arc<Self>> {
        DefaultTrackLoader.load(path.as_ref(), options)
    }

    /// Loads a track through a caller-supplied [`TrackLoader`].
    pub fn from_path_with_loader<P, L>(path: P, loader: &L, options: &LoadOptions) -> Result<Arc<Self>>
    where
        P: AsRef<Path>,
        L: TrackLoader,
    {
        loader.load(path.as_ref(), options)
    }

    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.inner.channels
    }

    pub fn duration(&self) -> Duration {
        self.inner.duration
    }

    pub fn samples(&self) -> &[f32] {
        &self.inner.samples
    }

    pub fn total_frames(&self) -> usize {
        self.inner.total_frames
    }

    pub fn is_empty(&self) -> bool {
        self.inner.samples.is_empty()
    }

    /// Downmixes all channels to mono by averaging each frame.
    pub fn to_mono(&self) -> Self {
        if self.inner.channels == 1 {
            return self.clone();
        }

        let channels = self.inner.channels as usize;
        let mono: Vec<f32> = self
            .inner
            .samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        Self::new(mono, self.inner.sample_rate, 1)
    }

    /// Returns a copy of this track resampled to `target_sample_rate`.
    pub fn resample(&self, target_sample_rate: u32) -> Result<Self> {
        if target_sample_rate == self.inner.sample_rate {
            return Ok(self.clone());
        }

        let resampler = TrackResampler::new(
            self.inner.sample_rate,
            target_sample_rate,
            self.inner.channels,
            None,
        )?;
        let resampled = resampler.resample_interleaved(&self.inner.samples)?;

        Ok(Self::new(resampled, target_sample_rate, self.inner.channels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_and_duration_accounting() {
        let track = Track::new(vec![0.0; 44100 * 2], 44100, 2);
        assert_eq!(track.total_frames(), 44100);
        assert_eq!(track.channels(), 2);
        assert_eq!(track.duration(), Duration::from_secs(1));
    }

    #[test]
    fn mono_downmix_averages_frames() {
        let track = Track::new(vec![1.0, 0.0, 0.5, 0.5], 44100, 2);
        let mono = track.to_mono();
        assert_eq!(mono.channels(), 1);
        assert_eq!(mono.samples(), &[0.5, 0.5]);
    }

    #[test]
    fn resample_to_same_rate_is_passthrough() {
        let track = Track::new(vec![0.1, 0.2, 0.3, 0.4], 44100, 2);
        let same = track.resample(44100).unwrap();
        assert_eq!(same.samples(), track.samples());
    }
}
