// Tone synthesis, real-time output stream, and announcement worker for pulsetone.

pub mod announce;
pub mod beep;
pub mod error;
pub mod osc;
pub mod tone;

pub use announce::{Announce, Announcer, AnnouncerHandle, LogAnnouncer, spawn_announcer};
pub use error::AudioError;
pub use osc::Oscillator;
pub use tone::{ToneControl, ToneOutput, ToneParams, map_signal};
