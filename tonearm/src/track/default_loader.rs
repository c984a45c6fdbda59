use crate::error::{Result, TonearmError};
use crate::track::{ChannelMode, LoadOptions, Track, TrackLoader};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use symphonia::{
    core::{
        audio::SampleBuffer, codecs::DecoderOptions, errors::Error, formats::FormatOptions,
        io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
    },
    default::{get_codecs, get_probe},
};

/// Default loader backed by the Symphonia decoder library.
///
/// Decodes MP3, WAV, FLAC, OGG and friends into interleaved f32 PCM.
/// Every failure mode maps to [`TonearmError::AssetLoad`]: the asset either
/// loads completely or the error propagates to the caller untouched.
pub struct DefaultTrackLoader;

impl TrackLoader for DefaultTrackLoader {
    fn load(&self, path: &Path, options: &LoadOptions) -> Result<Arc<Track>> {
        let file = File::open(path).map_err(|e| {
            TonearmError::AssetLoad(format!("cannot open {}: {}", path.display(), e))
        })?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| TonearmError::AssetLoad(format!("failed to probe audio format: {e}")))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| TonearmError::AssetLoad("no default audio track found".to_string()))?;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| TonearmError::AssetLoad("sample rate not found".to_string()))?;

        let channels = track
            .codec_params
            .channels
            .ok_or_else(|| TonearmError::AssetLoad("channel count not found".to_string()))?
            .count() as u16;

        let mut decoder = get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| TonearmError::AssetLoad(format!("failed to create decoder: {e}")))?;

        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(Error::IoError(_)) => break, // end-of-file
                Err(e) => {
                    return Err(TonearmError::AssetLoad(format!("error reading packet: {e}")));
                }
            };

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(Error::IoError(_)) => break, // also EOF in some formats
                Err(Error::DecodeError(_)) => continue, // recoverable corruption
                Err(e) => {
                    return Err(TonearmError::AssetLoad(format!("error decoding packet: {e}")));
                }
            };

            let spec = *decoded.spec();
            let capacity = decoded.capacity();

            let mut buf = SampleBuffer::<f32>::new(capacity as u64, spec);
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }

        let decoded = Track::new(samples, sample_rate, channels);

        let decoded = match options.channel_mode {
            ChannelMode::Keep => decoded,
            ChannelMode::DownmixMono => decoded.to_mono(),
        };

        log::debug!(
            "decoded {}: {} Hz, {} ch, {:.2} s",
            path.display(),
            decoded.sample_rate(),
            decoded.channels(),
            decoded.duration().as_secs_f64()
        );

        Ok(Arc::new(decoded))
    }
}
