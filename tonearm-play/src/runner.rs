//! The playback sequence: configure the mixer, load one track, play it at
//! full volume, and poll until the output falls silent.

use anyhow::{Context, Result};
use std::thread;
use std::time::Duration;
use tonearm::config::{MixerConfig, SampleFormat};
use tonearm::mixer::Mixer;
use tonearm::track::Track;

/// Track played on startup, resolved against the working directory.
const TRACK_PATH: &str = "test.mp3";

/// Granularity of the playback-active poll.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

pub fn run() -> Result<()> {
    let config = MixerConfig::new()
        .sample_rate(44100)
        .sample_format(SampleFormat::I16)
        .channels(2)
        .buffer_frames(4096);

    // Device acquisition comes first: if it fails, the track is never read.
    let mut mixer = Mixer::open(config).context("failed to initialize audio output")?;

    let track = Track::from_path(TRACK_PATH)
        .with_context(|| format!("failed to load {TRACK_PATH}"))?;
    log::info!(
        "loaded {TRACK_PATH}: {:.1} s",
        track.duration().as_secs_f64()
    );

    mixer.load(track)?;
    mixer.set_volume(1.0)?;
    mixer.play()?;
    log::info!("playback started");

    while mixer.is_playing() {
        thread::sleep(POLL_INTERVAL);
    }
    log::info!("playback finished");

    Ok(())
}
