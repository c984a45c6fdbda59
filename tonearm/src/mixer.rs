//! The mixer owns the output device and the single loaded track.
//!
//! Opening a [`Mixer`] claims the default output device with the configured
//! parameters; dropping it releases the stream. All playback control goes
//! through commands delivered to the audio callback over a channel, so the
//! audio path never takes a lock.

use crate::config::{MixerConfig, SampleFormat};
use crate::error::{Result, TonearmError};
use crate::playback::{MixerCommand, PlayState, PlaybackInstance};
use crate::track::Track;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Handle to the audio output subsystem.
///
/// Lifecycle: `open` (device acquisition) → `load` → `set_volume` → `play`
/// → poll [`Mixer::is_playing`] until the track runs out. The device is
/// held for exactly as long as the handle lives.
pub struct Mixer {
    config: MixerConfig,
    _stream: cpal::Stream,
    sender: Sender<MixerCommand>,
    active: Arc<AtomicBool>,
    position: Arc<AtomicUsize>,
    track: Option<Arc<Track>>,
    volume: f32,
}

impl Mixer {
    /// Opens the default output device with the given parameters and starts
    /// the (initially silent) output stream.
    ///
    /// # Errors
    ///
    /// Returns [`TonearmError::DeviceInit`] when no output device exists or
    /// the driver rejects the requested parameters.
    pub fn open(config: MixerConfig) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| TonearmError::DeviceInit("no output device available".to_string()))?;

        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.buffer_frames),
        };

        let (sender, receiver) = unbounded();
        let active = Arc::new(AtomicBool::new(false));
        let position = Arc::new(AtomicUsize::new(0));
        let state = MixerState::new(
            receiver,
            config.channels,
            active.clone(),
            position.clone(),
        );

        let stream = match config.sample_format {
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, state),
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, state),
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, state),
        }?;

        stream
            .play()
            .map_err(|e| TonearmError::DeviceInit(format!("failed to start stream: {e}")))?;

        log::info!(
            "mixer opened: {} Hz, {:?}, {} ch, {} frame buffer",
            config.sample_rate,
            config.sample_format,
            config.channels,
            config.buffer_frames
        );

        Ok(Self {
            config,
            _stream: stream,
            sender,
            active,
            position,
            track: None,
            volume: 1.0,
        })
    }

    /// Hands a track to the audio callback, replacing any previous one.
    ///
    /// The track is resampled first when its rate differs from the mixer's.
    pub fn load(&mut self, track: Arc<Track>) -> Result<()> {
        let track = if track.sample_rate() != self.config.sample_rate {
            log::info!(
                "resampling track from {} Hz to {} Hz",
                track.sample_rate(),
                self.config.sample_rate
            );
            Arc::new(track.resample(self.config.sample_rate)?)
        } else {
            track
        };

        self.send(MixerCommand::Load(track.clone()))?;
        self.track = Some(track);
        Ok(())
    }

    /// Sets the playback volume, clamped to [0.0, 1.0].
    ///
    /// Commands drain in order on the audio callback, so a volume set
    /// before [`Mixer::play`] is in effect for the first rendered frame.
    pub fn set_volume(&mut self, volume: f32) -> Result<()> {
        let volume = volume.clamp(0.0, 1.0);
        self.send(MixerCommand::SetVolume(volume))?;
        self.volume = volume;
        Ok(())
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Starts playback of the loaded track from the beginning and returns
    /// immediately; rendering happens on the device's callback thread.
    ///
    /// # Errors
    ///
    /// Returns [`TonearmError::Mixer`] when no track has been loaded.
    pub fn play(&mut self) -> Result<()> {
        if self.track.is_none() {
            return Err(TonearmError::Mixer("no track loaded".to_string()));
        }

        // Raise the flag before the command is queued: the callback may
        // render the whole track and clear it before play() returns.
        self.active.store(true, Ordering::Relaxed);
        if let Err(e) = self.send(MixerCommand::Play) {
            self.active.store(false, Ordering::Relaxed);
            return Err(e);
        }
        Ok(())
    }

    /// Pauses playback, keeping the current position. The track still owns
    /// the output, so [`Mixer::is_playing`] stays true.
    pub fn pause(&mut self) -> Result<()> {
        self.send(MixerCommand::Pause)
    }

    pub fn resume(&mut self) -> Result<()> {
        self.send(MixerCommand::Resume)
    }

    /// Stops playback and rewinds to the first frame.
    pub fn stop(&mut self) -> Result<()> {
        self.active.store(false, Ordering::Relaxed);
        self.send(MixerCommand::Stop)
    }

    /// Whether the loaded track currently owns the output: true from
    /// [`Mixer::play`] until its last frame is rendered or [`Mixer::stop`]
    /// is called.
    pub fn is_playing(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Current playback position of the loaded track.
    pub fn position(&self) -> Duration {
        let frames = self.position.load(Ordering::Relaxed);
        Duration::from_secs_f64(frames as f64 / self.config.sample_rate as f64)
    }

    /// Duration of the loaded track, if one is loaded.
    pub fn duration(&self) -> Option<Duration> {
        self.track.as_ref().map(|t| t.duration())
    }

    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    fn send(&self, command: MixerCommand) -> Result<()> {
        self.sender
            .send(command)
            .map_err(|e| TonearmError::Mixer(format!("failed to send command: {e}")))
    }
}

/// Callback-side state: the loaded instance plus the shared flags the
/// caller polls. Kept free of the stream itself so the block path can be
/// driven directly in tests.
struct MixerState {
    receiver: Receiver<MixerCommand>,
    current: Option<PlaybackInstance>,
    volume: f32,
    channels: u16,
    active: Arc<AtomicBool>,
    position: Arc<AtomicUsize>,
}

impl MixerState {
    fn new(
        receiver: Receiver<MixerCommand>,
        channels: u16,
        active: Arc<AtomicBool>,
        position: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            receiver,
            current: None,
            volume: 1.0,
            channels,
            active,
            position,
        }
    }

    /// Drains pending commands, FIFO.
    fn process_commands(&mut self) {
        while let Ok(command) = self.receiver.try_recv() {
            match command {
                MixerCommand::Load(track) => {
                    let mut instance = PlaybackInstance::new(track);
                    instance.volume = self.volume;
                    self.current = Some(instance);
                    self.position.store(0, Ordering::Relaxed);
                }
                MixerCommand::Play => {
                    if let Some(instance) = self.current.as_mut() {
                        instance.play_from_beginning();
                    }
                }
                MixerCommand::Pause => {
                    if let Some(instance) = self.current.as_mut() {
                        instance.pause();
                    }
                }
                MixerCommand::Resume => {
                    if let Some(instance) = self.current.as_mut() {
                        instance.resume();
                    }
                }
                MixerCommand::Stop => {
                    if let Some(instance) = self.current.as_mut() {
                        instance.stop();
                    }
                    self.position.store(0, Ordering::Relaxed);
                    self.active.store(false, Ordering::Relaxed);
                }
                MixerCommand::SetVolume(volume) => {
                    self.volume = volume;
                    if let Some(instance) = self.current.as_mut() {
                        instance.volume = volume;
                    }
                }
            }
        }
    }

    /// Renders one block into an interleaved f32 buffer, clearing the
    /// active flag the moment the track's last frame has been written.
    fn render(&mut self, buffer: &mut [f32]) {
        buffer.fill(0.0);

        let Some(instance) = self.current.as_mut() else {
            return;
        };

        if instance.info.play_state != PlayState::Playing {
            return;
        }

        instance.fill_buffer(buffer, self.channels);
        self.position
            .store(instance.info.current_frame, Ordering::Relaxed);

        if instance.info.play_state == PlayState::Stopped {
            self.active.store(false, Ordering::Relaxed);
            log::debug!("track finished after {} frames", instance.info.current_frame);
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut state: MixerState,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                scratch.resize(data.len(), 0.0);
                state.process_commands();
                state.render(&mut scratch);
                for (out, mixed) in data.iter_mut().zip(scratch.iter()) {
                    *out = T::from_sample(*mixed);
                }
            },
            |err| log::error!("audio stream error: {err}"),
            None,
        )
        .map_err(|e| TonearmError::DeviceInit(format!("failed to build output stream: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(channels: u16) -> (Sender<MixerCommand>, MixerState) {
        let (sender, receiver) = unbounded();
        let active = Arc::new(AtomicBool::new(false));
        let position = Arc::new(AtomicUsize::new(0));
        (sender, MixerState::new(receiver, channels, active, position))
    }

    fn constant_track(frames: usize, channels: u16) -> Arc<Track> {
        Arc::new(Track::new(vec![1.0; frames * channels as usize], 44100, channels))
    }

    #[test]
    fn volume_set_before_play_scales_the_first_block() {
        let (sender, mut state) = state(2);
        sender.send(MixerCommand::Load(constant_track(64, 2))).unwrap();
        sender.send(MixerCommand::SetVolume(0.5)).unwrap();
        sender.send(MixerCommand::Play).unwrap();

        let mut buffer = vec![0.0f32; 32];
        state.process_commands();
        state.render(&mut buffer);

        assert!(buffer.iter().all(|s| (*s - 0.5).abs() < f32::EPSILON));
    }

    #[test]
    fn active_flag_clears_when_the_track_runs_out() {
        let (sender, mut state) = state(2);
        state.active.store(true, Ordering::Relaxed);
        sender.send(MixerCommand::Load(constant_track(1024, 2))).unwrap();
        sender.send(MixerCommand::Play).unwrap();

        // 1024 frames at 128 frames per block: 8 blocks to drain.
        let mut buffer = vec![0.0f32; 256];
        let mut blocks = 0;
        while state.active.load(Ordering::Relaxed) {
            state.process_commands();
            state.render(&mut buffer);
            blocks += 1;
            assert!(blocks <= 10, "playback never reported completion");
        }

        assert_eq!(blocks, 8);
    }

    #[test]
    fn no_loaded_track_renders_silence() {
        let (_sender, mut state) = state(2);
        let mut buffer = vec![1.0f32; 16];
        state.render(&mut buffer);
        assert!(buffer.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn pause_silences_output_but_keeps_the_flag() {
        let (sender, mut state) = state(2);
        state.active.store(true, Ordering::Relaxed);
        sender.send(MixerCommand::Load(constant_track(1024, 2))).unwrap();
        sender.send(MixerCommand::Play).unwrap();

        let mut buffer = vec![0.0f32; 64];
        state.process_commands();
        state.render(&mut buffer);
        assert!(buffer.iter().any(|s| *s != 0.0));

        sender.send(MixerCommand::Pause).unwrap();
        state.process_commands();
        state.render(&mut buffer);
        assert!(buffer.iter().all(|s| *s == 0.0));
        assert!(state.active.load(Ordering::Relaxed));
    }

    #[test]
    fn stop_rewinds_and_clears_the_flag() {
        let (sender, mut state) = state(2);
        state.active.store(true, Ordering::Relaxed);
        sender.send(MixerCommand::Load(constant_track(1024, 2))).unwrap();
        sender.send(MixerCommand::Play).unwrap();

        let mut buffer = vec![0.0f32; 64];
        state.process_commands();
        state.render(&mut buffer);

        sender.send(MixerCommand::Stop).unwrap();
        state.process_commands();

        assert!(!state.active.load(Ordering::Relaxed));
        assert_eq!(state.position.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn volume_change_mid_playback_applies_to_the_next_block() {
        let (sender, mut state) = state(2);
        sender.send(MixerCommand::Load(constant_track(1024, 2))).unwrap();
        sender.send(MixerCommand::Play).unwrap();

        let mut buffer = vec![0.0f32; 64];
        state.process_commands();
        state.render(&mut buffer);
        assert!(buffer.iter().all(|s| (*s - 1.0).abs() < f32::EPSILON));

        sender.send(MixerCommand::SetVolume(0.25)).unwrap();
        state.process_commands();
        state.render(&mut buffer);
        assert!(buffer.iter().all(|s| (*s - 0.25).abs() < f32::EPSILON));
    }
}
