use crate::error::{Result, TonearmError};
use rubato::{FftFixedIn, Resampler};

/// Offline sample-rate converter for decoded tracks.
///
/// Wraps rubato's FFT resampler; input is fed in fixed-size chunks with the
/// tail zero-padded, so output length may exceed the exact rate ratio by a
/// fraction of a chunk.
pub struct TrackResampler {
    source_sample_rate: u32,
    target_sample_rate: u32,
    channels: u16,
    chunk_size: usize,
}

impl TrackResampler {
    pub fn new(
        source_sample_rate: u32,
        target_sample_rate: u32,
        channels: u16,
        chunk_size: Option<usize>,
    ) -> Result<Self> {
        if source_sample_rate == 0 || target_sample_rate == 0 {
            return Err(TonearmError::AudioFormat(
                "sample rates must be greater than 0".to_string(),
            ));
        }

        if channels == 0 {
            return Err(TonearmError::AudioFormat(
                "channel count must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            source_sample_rate,
            target_sample_rate,
            channels,
            chunk_size: chunk_size.unwrap_or(1024),
        })
    }

    pub fn source_sample_rate(&self) -> u32 {
        self.source_sample_rate
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// Resamples an interleaved buffer, returning a new interleaved buffer
    /// at the target rate.
    pub fn resample_interleaved(&self, interleaved: &[f32]) -> Result<Vec<f32>> {
        if self.source_sample_rate == self.target_sample_rate {
            return Ok(interleaved.to_vec());
        }

        let channels = self.channels as usize;
        let frames = interleaved.len() / channels;

        // rubato wants planar input
        let mut planar: Vec<Vec<f32>> = vec![Vec::with_capacity(frames); channels];
        for frame in interleaved.chunks(channels) {
            for (ch, sample) in frame.iter().enumerate() {
                planar[ch].push(*sample);
            }
        }

        let mut resampler = FftFixedIn::<f32>::new(
            self.source_sample_rate as usize,
            self.target_sample_rate as usize,
            self.chunk_size,
            2, // sub_chunks
            channels,
        )
        .map_err(|e| TonearmError::AudioFormat(format!("failed to create resampler: {e}")))?;

        let mut out_planar: Vec<Vec<f32>> = vec![Vec::new(); channels];
        let mut index = 0;

        while index < frames {
            let take = (frames - index).min(self.chunk_size);

            // Pad the final chunk to chunk_size
            let mut chunk: Vec<Vec<f32>> = vec![vec![0.0f32; self.chunk_size]; channels];
            for ch in 0..channels {
                chunk[ch][..take].copy_from_slice(&planar[ch][index..index + take]);
            }

            let processed = resampler
                .process(&chunk, None)
                .map_err(|e| TonearmError::AudioFormat(format!("resampling error: {e}")))?;

            for (ch, data) in processed.into_iter().enumerate() {
                out_planar[ch].extend_from_slice(&data);
            }

            index += take;
        }

        let out_frames = out_planar[0].len();
        let mut out = Vec::with_capacity(out_frames * channels);
        for frame_idx in 0..out_frames {
            for ch in 0..channels {
                out.push(out_planar[ch][frame_idx]);
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resampler_creation() {
        let resampler = TrackResampler::new(48000, 44100, 2, None).unwrap();
        assert_eq!(resampler.source_sample_rate(), 48000);
        assert_eq!(resampler.target_sample_rate(), 44100);
    }

    #[test]
    fn same_rate_is_passthrough() {
        let resampler = TrackResampler::new(44100, 44100, 1, None).unwrap();
        let samples = vec![0.1, 0.2, 0.3, 0.4];
        assert_eq!(resampler.resample_interleaved(&samples).unwrap(), samples);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(TrackResampler::new(0, 44100, 2, None).is_err());
        assert!(TrackResampler::new(48000, 0, 2, None).is_err());
        assert!(TrackResampler::new(48000, 44100, 0, None).is_err());
    }

    #[test]
    fn halving_the_rate_roughly_halves_the_frames() {
        let resampler = TrackResampler::new(44100, 22050, 1, None).unwrap();
        let input = vec![0.0f32; 44100];
        let output = resampler.resample_interleaved(&input).unwrap();
        // Chunked FFT processing pads the tail, so allow a chunk of slack.
        assert!(output.len() >= 22050 - 1024 && output.len() <= 22050 + 1024);
    }
}
