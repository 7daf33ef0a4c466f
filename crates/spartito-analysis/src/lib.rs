//! # Spartito Analysis
//!
//! Signal-processing subsystem for audio-to-MIDI conversion.
//!
//! This crate provides the per-frame analysis the conversion pipeline is
//! built on:
//! - **FFT engine**: forward/inverse transforms over split real/imag
//!   buffers, with per-size cached plans and scratch storage
//! - **Pitch detection**: monophonic YIN tracking, FFT-accelerated
//! - **Spectral peak picking**: up to four simultaneous pitches per frame
//! - **Transient detection**: percussive onsets classified kick/snare/hat
//!
//! All detectors operate on raw `&[f32]` frames, with no framework dependencies.
//! Detectors return `Option` per frame: a silent or ambiguous frame simply
//! yields nothing and the scan continues.
//!
//! ## Example
//!
//! ```
//! use spartito_analysis::{PitchDetector, TransientDetector};
//!
//! let sample_rate = 44100.0;
//! let frame = vec![0.0f32; 2048]; // one analysis frame
//!
//! let mut pitch = PitchDetector::new(sample_rate);
//! assert!(pitch.detect(&frame, 0.0).is_none()); // silence is gated
//!
//! let mut drums = TransientDetector::new(sample_rate);
//! assert!(drums.detect(&frame[..1024], 0.0).is_none());
//! ```

pub mod error;
pub mod fft;
pub mod pitch;
pub mod spectrum;
pub mod transient;

pub use error::{Error, Result};
pub use fft::FftEngine;
pub use pitch::{freq_to_midi, midi_to_freq, PitchDetector, PitchEstimate};
pub use spectrum::{ChordEstimate, HarmonyDetector, PeakOrder};
pub use transient::{DrumClass, TransientDetector, TransientEvent};
