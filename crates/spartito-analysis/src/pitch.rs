//! Monophonic pitch tracking using the YIN algorithm.
//!
//! Per-frame fundamental-frequency estimation for melodic capture. The
//! difference function is computed via an FFT-accelerated autocorrelation
//! (Wiener-Khinchin: `r(τ) = IFFT(|FFT(x)|²)`) combined with prefix sums of
//! squared samples, so a frame costs O(n log n) instead of O(n · max_period).
//!
//! The remaining steps follow de Cheveigné & Kawahara (2002): cumulative
//! mean normalization, absolute threshold with first-local-minimum selection
//! (which prevents octave errors), and parabolic interpolation for
//! sub-sample period accuracy.

use crate::error::{Error, Result};
use crate::fft::FftEngine;

/// Lower edge of the default melodic band in Hz.
pub const DEFAULT_MIN_FREQ: f32 = 60.0;
/// Upper edge of the default melodic band in Hz.
pub const DEFAULT_MAX_FREQ: f32 = 1200.0;
/// Reference frame size for melodic capture (~46 ms at 44.1 kHz).
pub const DEFAULT_FRAME_SIZE: usize = 2048;

/// Absolute threshold on the normalized difference function.
const YIN_THRESHOLD: f32 = 0.15;
/// Frames with RMS below this are treated as silence.
const SILENCE_FLOOR: f32 = 0.01;

/// A per-frame fundamental-frequency estimate.
///
/// Transient value: consumed immediately by note segmentation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct PitchEstimate {
    /// Detected fundamental in Hz.
    pub frequency: f32,
    /// Nearest MIDI note number.
    pub midi_note: u8,
    /// Detection confidence in 0..1 (`1 - d'(τ)` at the winning lag).
    pub confidence: f32,
    /// Frame start time in seconds.
    pub time: f64,
}

/// Per-frame monophonic pitch detector.
///
/// Owns its [`FftEngine`] and reuses the difference/normalized buffers
/// across frames, so one detector instance should be kept alive for the
/// whole scan.
pub struct PitchDetector {
    sample_rate: f64,
    /// Shortest candidate period in samples (from the band's upper edge).
    min_period: usize,
    /// Longest candidate period in samples (from the band's lower edge).
    max_period: usize,
    threshold: f32,
    silence_floor: f32,
    fft: FftEngine,
    difference: Vec<f32>,
    normalized: Vec<f32>,
}

impl PitchDetector {
    /// Create a detector over the default 60–1200 Hz melodic band.
    pub fn new(sample_rate: f64) -> Self {
        Self::build(sample_rate, DEFAULT_MIN_FREQ, DEFAULT_MAX_FREQ)
    }

    /// Create a detector over a custom frequency band.
    pub fn with_band(sample_rate: f64, min_freq: f32, max_freq: f32) -> Result<Self> {
        if !(min_freq > 0.0 && min_freq < max_freq) || max_freq as f64 >= sample_rate / 2.0 {
            return Err(Error::InvalidBand {
                min: min_freq,
                max: max_freq,
            });
        }
        Ok(Self::build(sample_rate, min_freq, max_freq))
    }

    fn build(sample_rate: f64, min_freq: f32, max_freq: f32) -> Self {
        let min_period = (sample_rate / max_freq as f64) as usize;
        let max_period = (sample_rate / min_freq as f64) as usize;

        Self {
            sample_rate,
            min_period: min_period.max(1),
            max_period,
            threshold: YIN_THRESHOLD,
            silence_floor: SILENCE_FLOOR,
            fft: FftEngine::new(),
            difference: vec![0.0; max_period + 1],
            normalized: vec![0.0; max_period + 1],
        }
    }

    /// Estimate the fundamental of one frame.
    ///
    /// `time` is the frame's start offset in seconds and is copied into the
    /// estimate. Returns `None` for silent or aperiodic frames; that is an
    /// expected per-frame outcome, not an error.
    pub fn detect(&mut self, frame: &[f32], time: f64) -> Option<PitchEstimate> {
        let n = frame.len();
        let max_period = self.max_period.min(n / 2);
        if max_period <= self.min_period {
            return None;
        }

        // Silence gate: skip the transform entirely for quiet frames.
        let rms = (frame.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>() / n as f64).sqrt();
        if rms < self.silence_floor as f64 {
            return None;
        }

        // Prefix sums of squared samples: P[i] = Σ_{j<i} x[j]².
        let mut prefix = vec![0.0f64; n + 1];
        for (i, &s) in frame.iter().enumerate() {
            prefix[i + 1] = prefix[i] + (s as f64) * (s as f64);
        }

        // Circular autocorrelation via the power spectrum. Zero-padding to
        // at least twice the frame length makes it equal to the linear
        // autocorrelation for every lag we inspect.
        let fft_size = (2 * n).next_power_of_two();
        let (mut real, mut imag) = self.fft.create_complex_array(fft_size);
        real[..n].copy_from_slice(frame);
        self.fft.forward(&mut real, &mut imag);
        for (re, im) in real.iter_mut().zip(imag.iter_mut()) {
            *re = *re * *re + *im * *im;
            *im = 0.0;
        }
        self.fft.inverse(&mut real, &mut imag);

        // Difference function: d(τ) = P[N−τ] + (P[N] − P[τ]) − 2·r(τ).
        let total = prefix[n];
        self.difference[0] = 0.0;
        for tau in 1..=max_period {
            let head = prefix[n - tau];
            let tail = total - prefix[tau];
            self.difference[tau] = (head + tail - 2.0 * real[tau] as f64) as f32;
        }

        // Cumulative mean normalization: d'(τ) = d(τ)·τ / Σ_{1..τ} d.
        self.normalized[0] = 1.0;
        let mut running = 0.0f32;
        for tau in 1..=max_period {
            running += self.difference[tau];
            self.normalized[tau] = if running > 1e-12 {
                self.difference[tau] * tau as f32 / running
            } else {
                1.0
            };
        }

        let tau = self.first_minimum_below_threshold(self.min_period, max_period)?;
        let refined = self.parabolic_interpolation(tau, max_period);

        let frequency = (self.sample_rate / refined) as f32;
        let confidence = (1.0 - self.normalized[tau]).clamp(0.0, 1.0);

        Some(PitchEstimate {
            frequency,
            midi_note: freq_to_midi(frequency),
            confidence,
            time,
        })
    }

    /// First lag in `[min_period, max_period)` where the normalized
    /// difference dips below the threshold, walked down to its local
    /// minimum. Taking the first qualifying dip rather than the global
    /// minimum avoids subharmonic (octave-down) picks.
    fn first_minimum_below_threshold(
        &self,
        min_period: usize,
        max_period: usize,
    ) -> Option<usize> {
        let mut tau = min_period;
        while tau < max_period {
            if self.normalized[tau] < self.threshold {
                while tau + 1 < max_period && self.normalized[tau + 1] < self.normalized[tau] {
                    tau += 1;
                }
                return Some(tau);
            }
            tau += 1;
        }
        None
    }

    /// Refine the winning lag by fitting a parabola through its neighbors.
    /// Lags at the edge of the search range are returned unrefined.
    fn parabolic_interpolation(&self, tau: usize, max_period: usize) -> f64 {
        if tau < 1 || tau + 1 > max_period {
            return tau as f64;
        }

        let s0 = self.normalized[tau - 1] as f64;
        let s1 = self.normalized[tau] as f64;
        let s2 = self.normalized[tau + 1] as f64;

        let denominator = 2.0 * (2.0 * s1 - s2 - s0);
        if denominator.abs() > 1e-12 {
            tau as f64 + (s2 - s0) / denominator
        } else {
            tau as f64
        }
    }
}

/// Nearest MIDI note for a frequency (A4 = 440 Hz = note 69).
pub fn freq_to_midi(freq: f32) -> u8 {
    if freq <= 0.0 {
        return 0;
    }
    let note = (12.0 * (freq / 440.0).log2() + 69.0).round();
    note.clamp(0.0, 127.0) as u8
}

/// Frequency of a MIDI note in Hz.
pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * 2.0f32.powf((note as f32 - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f64 = 44100.0;

    fn sine_frame(freq: f32, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                amplitude * (2.0 * std::f32::consts::PI * freq * t).sin()
            })
            .collect()
    }

    fn expected_midi(freq: f32) -> u8 {
        (12.0 * (freq / 440.0).log2() + 69.0).round() as u8
    }

    #[test]
    fn detects_a440() {
        let mut detector = PitchDetector::new(SAMPLE_RATE);
        let frame = sine_frame(440.0, 0.5, DEFAULT_FRAME_SIZE);

        let estimate = detector.detect(&frame, 0.0).expect("should detect A4");
        assert!((estimate.frequency - 440.0).abs() < 4.0);
        assert_eq!(estimate.midi_note, 69);
        assert!(estimate.confidence > 0.8);
    }

    #[test]
    fn tracks_frequencies_across_the_band() {
        let mut detector = PitchDetector::new(SAMPLE_RATE);
        for freq in [82.41, 110.0, 220.0, 261.63, 329.63, 440.0, 880.0, 1174.66] {
            let frame = sine_frame(freq, 0.4, DEFAULT_FRAME_SIZE);
            let estimate = detector
                .detect(&frame, 0.0)
                .unwrap_or_else(|| panic!("no estimate for {freq} Hz"));

            assert_eq!(
                estimate.midi_note,
                expected_midi(freq),
                "wrong note for {freq} Hz (got {} Hz)",
                estimate.frequency
            );
            assert!(
                estimate.confidence > 0.8,
                "low confidence {} for {freq} Hz",
                estimate.confidence
            );
        }
    }

    #[test]
    fn all_zero_frame_yields_no_estimate() {
        let mut detector = PitchDetector::new(SAMPLE_RATE);
        assert!(detector.detect(&vec![0.0; DEFAULT_FRAME_SIZE], 0.0).is_none());
    }

    #[test]
    fn sub_floor_rms_is_gated() {
        let mut detector = PitchDetector::new(SAMPLE_RATE);
        // Amplitude 0.005 puts the RMS well below the 0.01 floor.
        let frame = sine_frame(440.0, 0.005, DEFAULT_FRAME_SIZE);
        assert!(detector.detect(&frame, 0.0).is_none());
    }

    #[test]
    fn frame_too_short_for_band_yields_no_estimate() {
        let mut detector = PitchDetector::new(SAMPLE_RATE);
        // 64 samples cannot hold a 60 Hz period at 44.1 kHz.
        let frame = sine_frame(440.0, 0.5, 64);
        assert!(detector.detect(&frame, 0.0).is_none());
    }

    #[test]
    fn estimate_carries_frame_time() {
        let mut detector = PitchDetector::new(SAMPLE_RATE);
        let frame = sine_frame(440.0, 0.5, DEFAULT_FRAME_SIZE);
        let estimate = detector.detect(&frame, 1.25).unwrap();
        assert_eq!(estimate.time, 1.25);
    }

    #[test]
    fn rejects_inverted_band() {
        assert!(matches!(
            PitchDetector::with_band(SAMPLE_RATE, 2000.0, 100.0),
            Err(Error::InvalidBand { .. })
        ));
    }

    #[test]
    fn rejects_band_above_nyquist() {
        assert!(matches!(
            PitchDetector::with_band(SAMPLE_RATE, 60.0, 30000.0),
            Err(Error::InvalidBand { .. })
        ));
    }

    #[test]
    fn freq_midi_round_trip() {
        for note in [21, 36, 48, 60, 69, 84, 108] {
            assert_eq!(freq_to_midi(midi_to_freq(note)), note);
        }
        assert_eq!(freq_to_midi(0.0), 0);
        assert_eq!(freq_to_midi(30000.0), 127);
    }
}
