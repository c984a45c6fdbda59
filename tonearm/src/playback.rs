//! Playback state for the loaded track

use crate::track::Track;
use std::sync::Arc;

/// Playback state of the loaded track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Playing,
    Paused,
    Stopped,
}

/// Position and duration bookkeeping for the loaded track.
#[derive(Debug, Clone)]
pub struct PlaybackInfo {
    /// Current playback position in frames
    pub current_frame: usize,
    /// Total number of frames in the track
    pub total_frames: usize,
    /// Current playback time in seconds
    pub current_time: f64,
    /// Total duration in seconds
    pub total_time: f64,
    /// Current playback state
    pub play_state: PlayState,
}

impl PlaybackInfo {
    pub fn new(total_frames: usize, sample_rate: u32) -> Self {
        let total_time = total_frames as f64 / sample_rate as f64;
        Self {
            current_frame: 0,
            total_frames,
            current_time: 0.0,
            total_time,
            play_state: PlayState::Stopped,
        }
    }

    pub fn update_position(&mut self, current_frame: usize, sample_rate: u32) {
        self.current_frame = current_frame.min(self.total_frames);
        self.current_time = self.current_frame as f64 / sample_rate as f64;
    }

    pub fn is_finished(&self) -> bool {
        self.current_frame >= self.total_frames
    }
}

/// The track currently owned by the audio callback, with its play state
/// and volume.
#[derive(Debug)]
pub struct PlaybackInstance {
    pub track: Arc<Track>,
    pub info: PlaybackInfo,
    /// Volume scalar in [0.0, 1.0], applied per sample while rendering.
    pub volume: f32,
}

impl PlaybackInstance {
    pub fn new(track: Arc<Track>) -> Self {
        let info = PlaybackInfo::new(track.total_frames(), track.sample_rate());
        Self {
            track,
            info,
            volume: 1.0,
        }
    }

    /// Restart playback from the first frame.
    pub fn play_from_beginning(&mut self) {
        self.info.current_frame = 0;
        self.info.current_time = 0.0;
        self.info.play_state = PlayState::Playing;
    }

    pub fn pause(&mut self) {
        if self.info.play_state == PlayState::Playing {
            self.info.play_state = PlayState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.info.play_state == PlayState::Paused {
            self.info.play_state = PlayState::Playing;
        }
    }

    pub fn stop(&mut self) {
        self.info.play_state = PlayState::Stopped;
        self.info.current_frame = 0;
        self.info.current_time = 0.0;
    }

    /// Renders up to `buffer.len() / channels` frames into an interleaved
    /// output buffer, returning the number of frames written.
    ///
    /// Output channel `ch` reads track channel `ch % track_channels`, so a
    /// mono track is duplicated across the output and a stereo track maps
    /// straight through. Reaching the last frame flips the state to
    /// [`PlayState::Stopped`].
    pub fn fill_buffer(&mut self, buffer: &mut [f32], channels: u16) -> usize {
        if self.info.play_state != PlayState::Playing {
            return 0;
        }

        let out_channels = channels as usize;
        let track_channels = self.track.channels() as usize;
        let samples = self.track.samples();
        let frame_count = buffer.len() / out_channels;
        let mut frames_filled = 0;

        for frame_idx in 0..frame_count {
            if self.info.current_frame >= self.info.total_frames {
                break;
            }

            let base = self.info.current_frame * track_channels;
            for ch in 0..out_channels {
                let sample = samples[base + ch % track_channels];
                buffer[frame_idx * out_channels + ch] = sample * self.volume;
            }

            self.info.current_frame += 1;
            frames_filled += 1;
        }

        // The block that writes the final frame also flips the state, not
        // the next one.
        if self.info.current_frame >= self.info.total_frames {
            self.info.play_state = PlayState::Stopped;
        }

        self.info
            .update_position(self.info.current_frame, self.track.sample_rate());
        frames_filled
    }
}

/// Commands the caller sends to the audio callback. Delivered over an
/// unbounded channel and drained FIFO at the start of every block, so
/// ordering between commands (volume before play) is preserved.
#[derive(Debug)]
pub enum MixerCommand {
    Load(Arc<Track>),
    Play,
    Pause,
    Resume,
    Stop,
    SetVolume(f32),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(samples: Vec<f32>, channels: u16) -> Arc<Track> {
        Arc::new(Track::new(samples, 44100, channels))
    }

    #[test]
    fn fill_applies_volume() {
        let mut instance = PlaybackInstance::new(track(vec![1.0; 8], 2));
        instance.volume = 0.25;
        instance.play_from_beginning();

        let mut buffer = vec![0.0f32; 8];
        let frames = instance.fill_buffer(&mut buffer, 2);

        assert_eq!(frames, 4);
        assert!(buffer.iter().all(|s| (*s - 0.25).abs() < f32::EPSILON));
    }

    #[test]
    fn mono_track_is_duplicated_across_output_channels() {
        let mut instance = PlaybackInstance::new(track(vec![0.5, -0.5], 1));
        instance.play_from_beginning();

        let mut buffer = vec![0.0f32; 4];
        instance.fill_buffer(&mut buffer, 2);

        assert_eq!(buffer, vec![0.5, 0.5, -0.5, -0.5]);
    }

    #[test]
    fn exhausting_samples_stops_playback() {
        let mut instance = PlaybackInstance::new(track(vec![1.0; 4], 2));
        instance.play_from_beginning();

        let mut buffer = vec![0.0f32; 16];
        let frames = instance.fill_buffer(&mut buffer, 2);

        assert_eq!(frames, 2);
        assert_eq!(instance.info.play_state, PlayState::Stopped);
        assert!(instance.info.is_finished());
    }

    #[test]
    fn paused_instance_renders_nothing() {
        let mut instance = PlaybackInstance::new(track(vec![1.0; 8], 2));
        instance.play_from_beginning();
        instance.pause();

        let mut buffer = vec![0.0f32; 8];
        assert_eq!(instance.fill_buffer(&mut buffer, 2), 0);
        assert!(buffer.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn resume_continues_from_pause_position() {
        let mut instance = PlaybackInstance::new(track(vec![1.0; 8], 2));
        instance.play_from_beginning();

        let mut buffer = vec![0.0f32; 4];
        instance.fill_buffer(&mut buffer, 2);
        instance.pause();
        instance.resume();

        assert_eq!(instance.info.play_state, PlayState::Playing);
        assert_eq!(instance.info.current_frame, 2);
    }
}
