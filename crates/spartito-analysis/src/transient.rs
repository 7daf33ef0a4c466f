//! Percussive onset detection and coarse drum classification.
//!
//! Drums capture uses small frames with a short hop: onsets come from the
//! frame-to-frame jump in RMS energy, and the hit class comes from the
//! spectral centroid of the onset frame, a brightness proxy: kicks are
//! dark, hats are bright, everything in between counts as a snare.

use crate::fft::FftEngine;

/// Reference frame size for drums capture.
pub const DEFAULT_FRAME_SIZE: usize = 1024;
/// Reference hop size for drums capture.
pub const DEFAULT_HOP_SIZE: usize = 256;

/// Minimum frame-to-frame energy jump to register an onset.
const ONSET_FLOOR: f32 = 0.1;
/// Minimum absolute frame energy for an onset to count.
const ENERGY_FLOOR: f32 = 0.05;
/// Centroids below this are kicks.
const KICK_CENTROID_HZ: f32 = 200.0;
/// Centroids above this are hats.
const HAT_CENTROID_HZ: f32 = 4000.0;

/// Coarse percussive classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum DrumClass {
    Kick,
    Snare,
    Hat,
}

/// A detected percussive onset.
///
/// Transient value: consumed immediately by note segmentation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct TransientEvent {
    /// Frame start time in seconds.
    pub time: f64,
    /// Hit strength in 0..1 (`min(1, 2 · rms)`).
    pub velocity: f32,
    pub class: DrumClass,
}

/// Per-frame percussive onset detector.
///
/// Stateful: onset strength compares against the previous frame's energy,
/// so frames must be fed strictly in time order. [`reset`](Self::reset)
/// clears the state between scans.
pub struct TransientDetector {
    sample_rate: f64,
    prev_energy: f32,
    fft: FftEngine,
}

impl TransientDetector {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            prev_energy: 0.0,
            fft: FftEngine::new(),
        }
    }

    /// Clear the previous-frame energy, e.g. before scanning a new buffer.
    pub fn reset(&mut self) {
        self.prev_energy = 0.0;
    }

    /// Inspect one frame for a percussive onset.
    ///
    /// `time` is the frame's start offset in seconds. Returns `None` when
    /// the energy jump or the absolute energy stays under its floor.
    ///
    /// # Panics
    ///
    /// The frame length must be a power of two (the centroid is computed
    /// from the frame's spectrum).
    pub fn detect(&mut self, frame: &[f32], time: f64) -> Option<TransientEvent> {
        let energy = rms(frame);
        let onset_strength = energy - self.prev_energy;
        self.prev_energy = energy;

        if onset_strength <= ONSET_FLOOR || energy <= ENERGY_FLOOR {
            return None;
        }

        let centroid = self.spectral_centroid(frame);
        let class = if centroid < KICK_CENTROID_HZ {
            DrumClass::Kick
        } else if centroid > HAT_CENTROID_HZ {
            DrumClass::Hat
        } else {
            DrumClass::Snare
        };

        Some(TransientEvent {
            time,
            velocity: (energy * 2.0).min(1.0),
            class,
        })
    }

    /// Energy-weighted mean frequency of the frame's magnitude spectrum.
    fn spectral_centroid(&mut self, frame: &[f32]) -> f32 {
        let n = frame.len();
        let (mut real, mut imag) = self.fft.create_complex_array(n);
        real.copy_from_slice(frame);
        self.fft.forward(&mut real, &mut imag);

        let bin_hz = self.sample_rate / n as f64;
        let mut weighted = 0.0f64;
        let mut total = 0.0f64;
        for bin in 0..n / 2 {
            let magnitude = (real[bin] * real[bin] + imag[bin] * imag[bin]).sqrt() as f64;
            weighted += bin as f64 * bin_hz * magnitude;
            total += magnitude;
        }

        if total > 1e-12 {
            (weighted / total) as f32
        } else {
            0.0
        }
    }
}

fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / frame.len() as f64).sqrt() as f32
}
