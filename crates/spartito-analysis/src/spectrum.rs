//! Polyphonic peak picking over the magnitude spectrum.
//!
//! Estimates up to four simultaneously sounding pitches per frame for
//! harmony capture. This is deliberately not a true multi-pitch
//! transcription: overlapping harmonics of dense chords are not separated,
//! and a harmonic of one note can register as a pitch of its own. Harmony
//! mode trades time resolution for frequency resolution by using a larger
//! frame than melodic capture.

use crate::error::{Error, Result};
use crate::fft::FftEngine;
use crate::pitch::freq_to_midi;

/// Reference frame size for harmony capture.
pub const DEFAULT_FRAME_SIZE: usize = 4096;
/// Reference hop size for harmony capture.
pub const DEFAULT_HOP_SIZE: usize = 2048;
/// Lower edge of the usable band in Hz.
pub const DEFAULT_MIN_FREQ: f32 = 60.0;
/// Upper edge of the usable band in Hz.
pub const DEFAULT_MAX_FREQ: f32 = 2000.0;

/// Absolute magnitude floor a spectral peak must clear.
const MAGNITUDE_FLOOR: f32 = 0.1;
/// At most this many pitches are kept per frame.
const MAX_PITCHES: usize = 4;

/// Tie-break applied before truncating the peak list to four pitches.
///
/// The historical behavior keeps peaks in spectral-bin order, which favors
/// low frequencies regardless of strength. Whether the strongest or the
/// lowest peaks should win is ambiguous, so the choice is exposed instead
/// of hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum PeakOrder {
    /// Keep peaks in ascending bin (detection) order.
    #[default]
    BinOrder,
    /// Keep the strongest peaks first.
    Magnitude,
}

/// Pitches detected in one frame.
///
/// Transient value: consumed immediately by note segmentation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ChordEstimate {
    /// De-duplicated MIDI pitches, at most four, in the configured order.
    pub midi_pitches: Vec<u8>,
    /// Frame start time in seconds.
    pub time: f64,
}

/// Per-frame multi-pitch estimator.
pub struct HarmonyDetector {
    sample_rate: f64,
    min_freq: f32,
    max_freq: f32,
    peak_order: PeakOrder,
    fft: FftEngine,
}

impl HarmonyDetector {
    /// Create a detector over the default 60–2000 Hz band.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            min_freq: DEFAULT_MIN_FREQ,
            max_freq: DEFAULT_MAX_FREQ,
            peak_order: PeakOrder::default(),
            fft: FftEngine::new(),
        }
    }

    /// Create a detector over a custom band.
    pub fn with_band(sample_rate: f64, min_freq: f32, max_freq: f32) -> Result<Self> {
        if !(min_freq > 0.0 && min_freq < max_freq) {
            return Err(Error::InvalidBand {
                min: min_freq,
                max: max_freq,
            });
        }
        let mut detector = Self::new(sample_rate);
        detector.min_freq = min_freq;
        detector.max_freq = max_freq;
        Ok(detector)
    }

    /// Set the tie-break applied before truncation to four pitches.
    pub fn set_peak_order(&mut self, order: PeakOrder) {
        self.peak_order = order;
    }

    /// Estimate the pitches sounding in one frame.
    ///
    /// A bin counts as a peak when its magnitude beats both neighbors on
    /// each side and the absolute floor. Returns `None` when nothing in the
    /// usable band qualifies.
    ///
    /// # Panics
    ///
    /// The frame length must be a power of two (it feeds the FFT directly).
    pub fn detect(&mut self, frame: &[f32], time: f64) -> Option<ChordEstimate> {
        let n = frame.len();
        let (mut real, mut imag) = self.fft.create_complex_array(n);
        real.copy_from_slice(frame);
        self.fft.forward(&mut real, &mut imag);

        let half = n / 2;
        let magnitudes: Vec<f32> = (0..half)
            .map(|i| (real[i] * real[i] + imag[i] * imag[i]).sqrt())
            .collect();

        let bin_hz = self.sample_rate / n as f64;
        let mut candidates: Vec<(u8, f32)> = Vec::new();
        for bin in 2..half.saturating_sub(2) {
            let m = magnitudes[bin];
            if m <= MAGNITUDE_FLOOR {
                continue;
            }
            if m > magnitudes[bin - 1]
                && m > magnitudes[bin - 2]
                && m > magnitudes[bin + 1]
                && m > magnitudes[bin + 2]
            {
                let freq = (bin as f64 * bin_hz) as f32;
                if freq >= self.min_freq && freq <= self.max_freq {
                    candidates.push((freq_to_midi(freq), m));
                }
            }
        }

        if let PeakOrder::Magnitude = self.peak_order {
            candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        }

        let mut pitches: Vec<u8> = Vec::with_capacity(MAX_PITCHES);
        for (midi, _) in candidates {
            if !pitches.contains(&midi) {
                pitches.push(midi);
            }
            if pitches.len() == MAX_PITCHES {
                break;
            }
        }

        if pitches.is_empty() {
            None
        } else {
            Some(ChordEstimate {
                midi_pitches: pitches,
                time,
            })
        }
    }
}
