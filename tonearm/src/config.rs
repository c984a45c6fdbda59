//! Mixer configuration

/// Sample format the output stream is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// 16-bit signed integer samples.
    I16,
    /// 16-bit unsigned integer samples.
    U16,
    /// 32-bit float samples.
    F32,
}

/// Output-device parameters, fixed for the lifetime of an opened [`Mixer`].
///
/// Values are handed to the audio driver as-is; unsupported combinations
/// surface as a device-initialization failure when the mixer is opened.
///
/// [`Mixer`]: crate::mixer::Mixer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixerConfig {
    pub sample_rate: u32,
    pub sample_format: SampleFormat,
    pub channels: u16,
    /// Output buffer size in frames.
    pub buffer_frames: u32,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            sample_format: SampleFormat::I16,
            channels: 2,
            buffer_frames: 4096,
        }
    }
}

impl MixerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn sample_format(mut self, format: SampleFormat) -> Self {
        self.sample_format = format;
        self
    }

    pub fn channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    pub fn buffer_frames(mut self, frames: u32) -> Self {
        self.buffer_frames = frames;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_parameters() {
        let config = MixerConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.sample_format, SampleFormat::I16);
        assert_eq!(config.channels, 2);
        assert_eq!(config.buffer_frames, 4096);
    }

    #[test]
    fn reapplying_a_setter_is_idempotent() {
        let once = MixerConfig::new().sample_rate(44100).channels(2);
        let twice = MixerConfig::new()
            .sample_rate(44100)
            .channels(2)
            .sample_rate(44100)
            .channels(2);
        assert_eq!(once, twice);
    }
}
