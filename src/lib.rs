//! # Spartito: audio-to-MIDI conversion
//!
//! Extracts symbolic note events (pitch, timing, velocity) from decoded
//! audio so a track editor can place them on a timeline as editable notes.
//!
//! Spartito is an umbrella crate coordinating:
//! - **spartito-analysis**: the signal-processing subsystem (FFT engine,
//!   YIN pitch tracking, spectral peak picking, transient classification)
//! - the note-segmentation and conversion layers in this crate
//!
//! Decoding compressed audio, playback, and the editor UI are external
//! collaborators: the converter accepts an already-decoded [`SampleBuffer`]
//! and returns a [`ConversionResult`] the caller owns.
//!
//! ## Quick Start
//!
//! ```
//! use spartito::prelude::*;
//!
//! let samples = vec![0.0f32; 44100]; // 1 second of (decoded) audio
//! let buffer = SampleBuffer::mono(samples, 44100)?;
//!
//! let mut converter = Converter::builder()
//!     .mode(Mode::Melody)
//!     .on_progress(|stage, pct| println!("{stage}: {pct:.0}%"))
//!     .build()?;
//!
//! let result = converter.convert(&buffer)?;
//! assert!(result.notes.is_empty()); // silence converts to no notes
//! # Ok::<(), spartito::Error>(())
//! ```
//!
//! ## Capture modes
//!
//! - [`Mode::Melody`]: monophonic pitch tracking (2048-sample frames)
//! - [`Mode::Harmony`]: up to four simultaneous pitches (4096-sample frames)
//! - [`Mode::Drums`]: percussive onsets mapped to kick/snare/hat notes
//!
//! ## Feature Flags
//!
//! - `serialization`: serde derives on notes, results, and estimates

/// Re-export of the analysis subsystem for direct access.
pub use spartito_analysis as analysis;

pub mod buffer;
pub mod convert;
pub mod note;
pub mod segment;

mod error;

pub use buffer::{AnalysisFrame, Frames, SampleBuffer};
pub use convert::{Converter, ConverterBuilder, Mode, ProgressCallback, DEFAULT_TEMPO_BPM};
pub use error::{Error, Result};
pub use note::{ConversionResult, MidiNote};

/// Commonly used types, in one import.
pub mod prelude {
    pub use crate::buffer::SampleBuffer;
    pub use crate::convert::{Converter, Mode};
    pub use crate::error::{Error, Result};
    pub use crate::note::{ConversionResult, MidiNote};
    pub use spartito_analysis::{DrumClass, PeakOrder};
}
