//! Audio Probe Adapter

mod symphonia_probe;

pub use symphonia_probe::SymphoniaAudioProbe;
