// Synth module - Tone generation, envelope and reverb

pub mod convolver;
pub mod envelope;
pub mod impulse;
pub mod notes;
pub mod oscillator;
pub mod voice;
