pub mod config;
pub mod error;
pub mod mixer;
pub mod playback;
pub mod track;

pub use config::{MixerConfig, SampleFormat};
pub use error::TonearmError;
pub use mixer::Mixer;
pub use playback::{PlayState, PlaybackInfo};
pub use track::{ChannelMode, LoadOptions, Track, TrackLoader};
